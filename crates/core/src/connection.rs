//! Connection lifecycle of a single device.
//!
//! ```text
//! Disconnected -> Connecting -> Synchronizing -> Ready
//!                     |              |   ^
//!                     v              v   | (retry)
//!                   Failed <---------+---+
//! ```
//!
//! `Ready -> Disconnected` happens when the device is removed. `Failed` is
//! terminal: the next detection pass creates a fresh device.

use crate::comm::ErrorClass;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::transport::HidBackend;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Synchronizing,
    Ready,
    Failed,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Synchronizing)
                | (Connecting, Failed)
                | (Synchronizing, Synchronizing)
                | (Synchronizing, Ready)
                | (Synchronizing, Failed)
                | (Ready, Disconnected)
        )
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Synchronizing => "synchronizing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Bounded retry of the initial synchronize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total synchronize attempts, at least 1.
    pub attempts: u32,
    /// Pause between attempts; never applied after the last one.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(250),
        }
    }
}

/// Run blocking device I/O on the blocking pool.
async fn blocking<T, F>(io: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(io)
        .await
        .map_err(|e| Error::Hid(format!("device I/O task failed: {e}")))?
}

/// Drive `device` from `Disconnected` to `Ready`.
///
/// Acquires the handle, then synchronizes up to `policy.attempts` times,
/// sleeping `policy.delay` between attempts. Stops early when a failure is
/// not worth retrying. On failure the handle is released and the device ends
/// in `Failed`. Returns the number of synchronize attempts used.
///
/// Report I/O runs on the blocking pool, so several devices can be
/// established at once without stalling the runtime.
pub async fn establish(
    device: &Arc<Device>,
    backend: Arc<dyn HidBackend>,
    policy: &RetryPolicy,
) -> Result<u32> {
    device.transition(ConnectionState::Connecting);

    let opening = Arc::clone(device);
    if let Err(e) = blocking(move || opening.connect(backend.as_ref())).await {
        warn!(device = device.name(), error = %e, "could not open device");
        device.transition(ConnectionState::Failed);
        return Err(e);
    }

    let attempts = policy.attempts.max(1);
    let mut last_error = Error::Disconnected;

    for attempt in 1..=attempts {
        device.transition(ConnectionState::Synchronizing);
        let syncing = Arc::clone(device);
        match blocking(move || syncing.synchronize()).await {
            Ok(()) => {
                device.transition(ConnectionState::Ready);
                info!(device = device.name(), attempt, "device ready");
                return Ok(attempt);
            }
            Err(e) => {
                let class = ErrorClass::classify(&e);
                warn!(
                    device = device.name(),
                    attempt,
                    attempts,
                    error = %e,
                    ?class,
                    "synchronize attempt failed"
                );
                last_error = e;
                if !class.is_retryable() || attempt == attempts {
                    break;
                }
                tokio::time::sleep(policy.delay).await;
            }
        }
    }

    device.disconnect();
    device.transition(ConnectionState::Failed);
    Err(last_error)
}
