//! Error classification for connection and retry decisions.
//!
//! The connection state machine retries a failed synchronize only when the
//! failure looks transient; a device that is gone is not worth waiting for.

use crate::error::Error;

/// Classification of communication errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient errors that may succeed on retry (timeout, asleep, busy).
    Transient,
    /// Device is gone; retrying is pointless.
    Disconnected,
    /// Permission denied, usually another process holds the interface.
    PermissionDenied,
    /// Device returned an unexpected answer.
    Protocol,
    /// Corrupted or unexpected data.
    InvalidResponse,
    /// Rejected by validation before any I/O.
    Validation,
}

impl ErrorClass {
    /// Classify an error for retry decisions.
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::Timeout(_) | Error::DeviceNotReady => Self::Transient,
            Error::PermissionDenied(_) => Self::PermissionDenied,
            Error::DeviceNotFound(_) | Error::Disconnected => Self::Disconnected,
            Error::Protocol { .. } => Self::Protocol,
            Error::OutOfRange { .. } | Error::Unsupported { .. } => Self::Validation,
            Error::Write { source, .. } | Error::Sync { source, .. } => Self::classify(source),
            Error::Hid(msg) | Error::TransportOpen { reason: msg, .. } => {
                Self::classify_message(msg)
            }
            Error::Config(_) => Self::InvalidResponse,
        }
    }

    fn classify_message(msg: &str) -> Self {
        let lower = msg.to_lowercase();
        if lower.contains("disconnect")
            || lower.contains("not found")
            || lower.contains("no such device")
        {
            Self::Disconnected
        } else if lower.contains("permission")
            || lower.contains("access denied")
            || lower.contains("access is denied")
        {
            Self::PermissionDenied
        } else if lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("busy")
            || lower.contains("not ready")
        {
            Self::Transient
        } else {
            Self::InvalidResponse
        }
    }

    /// Whether another synchronize attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Disconnected | Self::PermissionDenied | Self::Validation
        )
    }
}
