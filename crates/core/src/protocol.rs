//! ROG mouse report encoding and decoding.
//!
//! Every message is a single 65-byte report:
//! - `[0]` report ID (always 0x00)
//! - `[1]` command class (GET 0x12, SET 0x51, ACTION 0x50)
//! - `[2]` command
//! - `[3..65]` parameters, zero padded
//!
//! The device answers with the same layout, echoing class and command. A
//! response carrying `FF AA` in place of class/command is the firmware's
//! "asleep / not ready" status (seen on wireless mice when the receiver has
//! no link).
//!
//! Protocol reference: libratbag asus driver (MIT), protocol knowledge only.

use crate::error::{Error, Result};

/// HID report ID used for every request and response.
pub const REPORT_ID: u8 = 0x00;
/// Report length (including report ID).
pub const REPORT_LEN: usize = 65;
/// Maximum number of parameter bytes in one report.
pub const MAX_PARAMS: usize = REPORT_LEN - 3;

/// Status bytes returned in place of class/command when the device is asleep.
pub const STATUS_NOT_READY: [u8; 2] = [0xFF, 0xAA];

/// Command classes.
pub mod class {
    /// Read a settings block.
    pub const GET: u8 = 0x12;
    /// Write a settings block.
    pub const SET: u8 = 0x51;
    /// Trigger an action (profile switch).
    pub const ACTION: u8 = 0x50;
}

/// Command identifiers.
pub mod commands {
    /// Active profile and active DPI slot.
    pub const PROFILE: u8 = 0x00;
    /// Select the active DPI slot.
    pub const DPI_SLOT: u8 = 0x01;
    /// Lighting zone configuration.
    pub const LIGHTING: u8 = 0x03;
    /// DPI value and color of every DPI slot.
    pub const DPI: u8 = 0x04;
    /// Battery level and charging flag.
    pub const BATTERY: u8 = 0x07;
    /// USB polling rate.
    pub const POLLING_RATE: u8 = 0x08;
    /// Angle snapping and angle tuning.
    pub const ANGLE: u8 = 0x09;
    /// Lift-off distance.
    pub const LIFT_OFF: u8 = 0x0A;
    /// Auto power-off timer and low battery warning.
    pub const ENERGY: u8 = 0x0B;
}

/// A request report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub class: u8,
    pub command: u8,
    pub params: Vec<u8>,
}

impl Request {
    pub fn new(class: u8, command: u8, params: Vec<u8>) -> Self {
        Self {
            class,
            command,
            params,
        }
    }

    /// Read request for a settings block.
    pub fn get(command: u8) -> Self {
        Self::new(class::GET, command, Vec::new())
    }

    /// Write request for a settings block.
    pub fn set(command: u8, params: Vec<u8>) -> Self {
        Self::new(class::SET, command, params)
    }

    /// Encode into a full-length HID report.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.params.len() > MAX_PARAMS {
            return Err(Error::Protocol {
                command: self.command,
                code: 0xFF,
            });
        }

        let mut buf = vec![0u8; REPORT_LEN];
        buf[0] = REPORT_ID;
        buf[1] = self.class;
        buf[2] = self.command;
        buf[3..3 + self.params.len()].copy_from_slice(&self.params);
        Ok(buf)
    }
}

/// A decoded response report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub class: u8,
    pub command: u8,
    pub params: Vec<u8>,
}

impl Response {
    /// Decode a raw HID report.
    ///
    /// Some backends strip the leading report ID; both forms are accepted.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let body = match data.len() {
            REPORT_LEN => &data[1..],
            n if n == REPORT_LEN - 1 => data,
            n => {
                return Err(Error::Hid(format!(
                    "unexpected report length: {n} bytes (expected {REPORT_LEN})"
                )));
            }
        };

        Ok(Self {
            class: body[0],
            command: body[1],
            params: body[2..].to_vec(),
        })
    }

    /// Whether this is the firmware's "not ready" status.
    pub fn is_not_ready(&self) -> bool {
        [self.class, self.command] == STATUS_NOT_READY
    }

    /// Check that the response answers `req`.
    pub fn expect_answer_to(&self, req: &Request) -> Result<()> {
        if self.is_not_ready() {
            return Err(Error::DeviceNotReady);
        }
        if self.class != req.class || self.command != req.command {
            return Err(Error::Protocol {
                command: req.command,
                code: self.command,
            });
        }
        Ok(())
    }

    /// Parameter byte at `idx`, zero when the firmware sent a short payload.
    pub fn param(&self, idx: usize) -> u8 {
        self.params.get(idx).copied().unwrap_or(0)
    }

    /// Little-endian u16 starting at `idx`.
    pub fn param_u16(&self, idx: usize) -> u16 {
        u16::from_le_bytes([self.param(idx), self.param(idx + 1)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_get_request() {
        let encoded = Request::get(commands::LIGHTING).encode().unwrap();
        assert_eq!(encoded.len(), REPORT_LEN);
        assert_eq!(encoded[0], REPORT_ID);
        assert_eq!(encoded[1], class::GET);
        assert_eq!(encoded[2], commands::LIGHTING);
        assert!(encoded[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn encode_set_request_with_params() {
        let req = Request::set(commands::DPI, vec![0x01, 0x20, 0x4E, 0xFF, 0x00, 0x00]);
        let encoded = req.encode().unwrap();
        assert_eq!(encoded[1], class::SET);
        assert_eq!(&encoded[3..9], &[0x01, 0x20, 0x4E, 0xFF, 0x00, 0x00]);
        assert_eq!(encoded[9], 0x00); // padding
    }

    #[test]
    fn encode_rejects_oversized_params() {
        let req = Request::set(commands::DPI, vec![0u8; MAX_PARAMS + 1]);
        assert!(req.encode().is_err());
    }

    #[test]
    fn decode_with_and_without_report_id() {
        let mut data = vec![REPORT_ID, class::GET, commands::BATTERY, 87, 1];
        data.resize(REPORT_LEN, 0);
        let full = Response::decode(&data).unwrap();
        let stripped = Response::decode(&data[1..]).unwrap();
        assert_eq!(full, stripped);
        assert_eq!(full.param(0), 87);
        assert_eq!(full.param(1), 1);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert!(Response::decode(&[0x00, 0x12, 0x07]).is_err());
    }

    #[test]
    fn not_ready_status_detected() {
        let mut data = vec![REPORT_ID, 0xFF, 0xAA];
        data.resize(REPORT_LEN, 0);
        let resp = Response::decode(&data).unwrap();
        assert!(resp.is_not_ready());
        let err = resp
            .expect_answer_to(&Request::get(commands::PROFILE))
            .unwrap_err();
        assert!(matches!(err, Error::DeviceNotReady));
    }

    #[test]
    fn mismatched_answer_is_protocol_error() {
        let mut data = vec![REPORT_ID, class::GET, commands::LIGHTING];
        data.resize(REPORT_LEN, 0);
        let resp = Response::decode(&data).unwrap();
        let err = resp
            .expect_answer_to(&Request::get(commands::DPI))
            .unwrap_err();
        assert!(matches!(err, Error::Protocol { command: 0x04, .. }));
    }

    #[test]
    fn param_u16_is_little_endian() {
        let mut data = vec![REPORT_ID, class::GET, commands::DPI, 0x20, 0x4E];
        data.resize(REPORT_LEN, 0);
        let resp = Response::decode(&data).unwrap();
        assert_eq!(resp.param_u16(0), 20000);
        assert_eq!(resp.param(200), 0);
    }
}
