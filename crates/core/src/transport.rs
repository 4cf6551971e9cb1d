//! HID transport abstraction for device communication.
//!
//! Provides a trait-based transport layer so that real HID devices and
//! simulated devices share the same interface. [`HidBackend`] covers
//! enumeration and opening; [`HidTransport`] covers report I/O on an open
//! handle.

use crate::catalog::PeripheralDescriptor;
use crate::error::{Error, Result};
use crate::protocol::{Request, Response, REPORT_LEN};
use std::ffi::CString;
use std::sync::Mutex;
use tracing::{debug, trace, warn};

/// Timeout for a single response read.
const READ_TIMEOUT_MS: i32 = 1000;

/// Abstraction over raw HID read/write on an open handle.
pub trait HidTransport: Send {
    /// Write a raw HID report and return the response.
    fn send_report(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Opaque reference to an enumerated device, valid until the next
/// enumeration change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    pub path: String,
}

/// Enumeration and open capability of the host HID stack.
pub trait HidBackend: Send + Sync {
    /// Re-read the host's device list.
    fn refresh(&self) -> Result<()> {
        Ok(())
    }

    /// Find the settings interface of a physically present device.
    fn find(&self, descriptor: &PeripheralDescriptor) -> Option<DeviceHandle>;

    /// Open a handle returned by [`HidBackend::find`].
    fn open(&self, handle: &DeviceHandle) -> Result<Box<dyn HidTransport>>;

    fn is_present(&self, descriptor: &PeripheralDescriptor) -> bool {
        self.find(descriptor).is_some()
    }
}

/// Send a request and decode the response.
pub fn request(transport: &dyn HidTransport, req: &Request) -> Result<Response> {
    let encoded = req.encode()?;
    trace!(
        class = format_args!("0x{:02X}", req.class),
        command = format_args!("0x{:02X}", req.command),
        params_hex = format_args!("{:02X?}", req.params),
        "report TX"
    );

    let raw = transport.send_report(&encoded)?;
    let resp = Response::decode(&raw)?;

    trace!(
        class = format_args!("0x{:02X}", resp.class),
        command = format_args!("0x{:02X}", resp.command),
        params_hex = format_args!("{:02X?}", &resp.params[..8.min(resp.params.len())]),
        "report RX"
    );

    if let Err(e) = resp.expect_answer_to(req) {
        warn!(
            command = format_args!("0x{:02X}", req.command),
            error = %e,
            "firmware rejected request"
        );
        return Err(e);
    }

    Ok(resp)
}

/// Backend over the host's hidapi device list.
pub struct HidApiBackend {
    api: Mutex<hidapi::HidApi>,
}

impl HidApiBackend {
    pub fn new() -> Result<Self> {
        let api = hidapi::HidApi::new().map_err(|e| Error::Hid(e.to_string()))?;
        Ok(Self {
            api: Mutex::new(api),
        })
    }

    fn api(&self) -> Result<std::sync::MutexGuard<'_, hidapi::HidApi>> {
        self.api
            .lock()
            .map_err(|_| Error::Hid("hidapi lock poisoned".into()))
    }

    /// Paths of every enumerated HID interface, sorted.
    ///
    /// Two snapshots that differ mean the host enumeration changed.
    pub fn snapshot(&self) -> Result<Vec<String>> {
        let mut api = self.api()?;
        api.refresh_devices()
            .map_err(|e| Error::Hid(e.to_string()))?;
        let mut paths: Vec<String> = api
            .device_list()
            .map(|info| info.path().to_string_lossy().into_owned())
            .collect();
        paths.sort();
        Ok(paths)
    }
}

impl HidBackend for HidApiBackend {
    fn refresh(&self) -> Result<()> {
        self.api()?
            .refresh_devices()
            .map_err(|e| Error::Hid(e.to_string()))
    }

    fn find(&self, descriptor: &PeripheralDescriptor) -> Option<DeviceHandle> {
        let api = self.api().ok()?;
        let fragment = descriptor.path_fragment();
        let found = api
            .device_list()
            .filter(|info| {
                info.vendor_id() == descriptor.vendor_id
                    && info.product_id() == descriptor.product_id
            })
            .find(|info| {
                info.interface_number() == descriptor.interface as i32
                    || info
                        .path()
                        .to_string_lossy()
                        .to_lowercase()
                        .contains(&fragment)
            })
            .map(|info| DeviceHandle {
                path: info.path().to_string_lossy().into_owned(),
            });
        found
    }

    fn open(&self, handle: &DeviceHandle) -> Result<Box<dyn HidTransport>> {
        let path = CString::new(handle.path.as_str())
            .map_err(|e| Error::Hid(format!("invalid device path: {e}")))?;
        let device = self.api()?.open_path(&path).map_err(|e| {
            let msg = e.to_string();
            if msg.to_lowercase().contains("access") || msg.to_lowercase().contains("permission")
            {
                Error::PermissionDenied(msg)
            } else {
                Error::Hid(msg)
            }
        })?;
        debug!(path = %handle.path, "opened HID interface");
        Ok(Box::new(HidApiTransport { device }))
    }
}

/// Report transport over an open hidapi handle.
pub struct HidApiTransport {
    device: hidapi::HidDevice,
}

impl HidTransport for HidApiTransport {
    fn send_report(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.device
            .write(data)
            .map_err(|e| Error::Hid(format!("write: {e}")))?;

        let mut response = [0u8; REPORT_LEN];
        let n = self
            .device
            .read_timeout(&mut response, READ_TIMEOUT_MS)
            .map_err(|e| Error::Hid(format!("read_timeout: {e}")))?;

        if n == 0 {
            return Err(Error::Timeout(format!(
                "hid_read timed out after {READ_TIMEOUT_MS}ms"
            )));
        }

        Ok(response[..n].to_vec())
    }
}


#[cfg(test)]
mod tests {
    use super::mock::{MockBackend, SimulatedMouse};
    use super::*;
    use crate::catalog::MouseModel;
    use crate::protocol::{commands, REPORT_ID};

    #[test]
    fn request_returns_payload() {
        let mouse = SimulatedMouse::new();
        let resp = request(&mouse, &Request::get(commands::BATTERY)).unwrap();
        assert_eq!(resp.param(0), 80);
        assert_eq!(resp.param(1), 0);
    }

    #[test]
    fn request_detects_not_ready_status() {
        let mouse = SimulatedMouse::new();
        mouse.stall_syncs(1);
        let result = request(&mouse, &Request::get(commands::PROFILE));
        assert!(matches!(result, Err(Error::DeviceNotReady)));
        // Only the first read is stalled
        assert!(request(&mouse, &Request::get(commands::PROFILE)).is_ok());
    }

    #[test]
    fn request_rejects_mismatched_answer() {
        struct Wrong;
        impl HidTransport for Wrong {
            fn send_report(&self, _data: &[u8]) -> Result<Vec<u8>> {
                let mut out = vec![REPORT_ID, 0x12, 0x33];
                out.resize(REPORT_LEN, 0);
                Ok(out)
            }
        }
        let result = request(&Wrong, &Request::get(commands::LIGHTING));
        assert!(matches!(result, Err(Error::Protocol { .. })));
    }

    #[test]
    fn unplugged_mouse_fails_io() {
        let mouse = SimulatedMouse::new();
        mouse.unplug();
        assert!(request(&mouse, &Request::get(commands::PROFILE)).is_err());
    }

    #[test]
    fn backend_find_and_open() {
        let backend = MockBackend::new();
        let descriptor = MouseModel::GladiusIII.descriptor();
        assert!(!backend.is_present(&descriptor));

        backend.plug(descriptor, SimulatedMouse::new());
        let handle = backend.find(&descriptor).unwrap();
        let transport = backend.open(&handle).unwrap();
        let resp = request(transport.as_ref(), &Request::get(commands::POLLING_RATE)).unwrap();
        assert_eq!(resp.param(0), 3);
        assert_eq!(backend.opens(), 1);
    }

    #[test]
    fn backend_open_failure() {
        let backend = MockBackend::new();
        let descriptor = MouseModel::ChakramX.descriptor();
        backend.plug(descriptor, SimulatedMouse::new());
        backend.set_fail_open(true);
        let handle = backend.find(&descriptor).unwrap();
        assert!(backend.open(&handle).is_err());
    }

    #[test]
    fn hidapi_find_of_absent_interface() {
        // Hosts without a HID stack (containers) cannot build the backend.
        let Ok(backend) = HidApiBackend::new() else {
            return;
        };
        let absent = PeripheralDescriptor {
            product_id: 0xFFFE,
            ..MouseModel::GladiusIII.descriptor()
        };
        assert!(backend.find(&absent).is_none());
        assert!(!backend.is_present(&absent));
    }
}
