//! Tunables of the registry and watcher, loadable from a JSON file.
//!
//! Every field is optional in the file; missing fields take the defaults.

use crate::connection::RetryPolicy;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Quiet period after the last enumeration change before detecting.
    pub debounce_ms: u64,
    /// Synchronize attempts per connection.
    pub sync_attempts: u32,
    pub sync_retry_delay_ms: u64,
    /// Battery refresh interval of long-running frontends.
    pub battery_poll_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            sync_attempts: 3,
            sync_retry_delay_ms: 250,
            battery_poll_secs: 60,
        }
    }
}

impl RegistryConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_json_str(&json)?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sync_attempts == 0 {
            return Err(Error::Config("sync_attempts must be at least 1".into()));
        }
        if self.battery_poll_secs == 0 {
            return Err(Error::Config("battery_poll_secs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn battery_poll_interval(&self) -> Duration {
        Duration::from_secs(self.battery_poll_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.sync_attempts,
            delay: Duration::from_millis(self.sync_retry_delay_ms),
        }
    }
}
