//! Error types for rog-mouse-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HID device communication failure.
    #[error("HID error: {0}")]
    Hid(String),

    /// Device not found during enumeration.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// The transport handle could not be opened (device busy or removed).
    #[error("failed to open {device}: {reason}")]
    TransportOpen { device: &'static str, reason: String },

    /// Reading the firmware state failed during a synchronize.
    #[error("synchronize of {device} failed: {source}")]
    Sync {
        device: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// A single setting write was rejected by the transport or firmware.
    #[error("writing {setting} failed: {source}")]
    Write {
        setting: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// Firmware answered with the "asleep / not ready" status.
    #[error("device is not ready")]
    DeviceNotReady,

    /// Firmware answered with an unexpected command or an unknown value.
    #[error("protocol error: command 0x{command:02X}, code 0x{code:02X}")]
    Protocol { command: u8, code: u8 },

    /// Value out of safe range.
    #[error("value out of range: {field} = {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// The model does not offer this feature.
    #[error("{device} does not support {feature}")]
    Unsupported {
        device: &'static str,
        feature: &'static str,
    },

    /// The device handle has been released.
    #[error("device disconnected")]
    Disconnected,

    /// Configuration could not be loaded or is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Permission denied (likely Windows HID exclusive access).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Operation timed out.
    #[error("timeout: {0}")]
    Timeout(String),
}

impl Error {
    /// Whether the error was raised before any transport I/O happened.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::OutOfRange { .. } | Self::Unsupported { .. })
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
