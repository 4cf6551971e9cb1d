//! Peripheral registry: the set of devices that are connected and ready.
//!
//! One `Registry` is built at startup and cloned into whoever needs it (the
//! watcher, command handlers). The tracked set lives behind a single lock
//! that is held only while the set itself changes, never across device I/O,
//! so several devices can connect concurrently. External readers always get a
//! snapshot.

use crate::catalog::{DeviceId, MouseModel};
use crate::config::RegistryConfig;
use crate::connection::{self, RetryPolicy};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::notify::Notifier;
use crate::settings::Battery;
use crate::transport::HidBackend;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Asynchronous lifecycle signal raised by a device's transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSignal {
    Disconnected,
    ReadinessChanged(bool),
    Battery(Battery),
}

struct Inner {
    backend: Arc<dyn HidBackend>,
    catalog: Vec<MouseModel>,
    devices: Mutex<HashMap<DeviceId, Arc<Device>>>,
    /// Serializes detection passes.
    detecting: tokio::sync::Mutex<()>,
    notifier: Notifier,
    policy: RetryPolicy,
    debounce: Duration,
}

#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// Registry over the full model catalog.
    pub fn new(backend: Arc<dyn HidBackend>, notifier: Notifier, config: &RegistryConfig) -> Self {
        Self::with_catalog(backend, notifier, config, MouseModel::ALL)
    }

    pub fn with_catalog(
        backend: Arc<dyn HidBackend>,
        notifier: Notifier,
        config: &RegistryConfig,
        catalog: &[MouseModel],
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                catalog: catalog.to_vec(),
                devices: Mutex::new(HashMap::new()),
                detecting: tokio::sync::Mutex::new(()),
                notifier,
                policy: config.retry_policy(),
                debounce: config.debounce(),
            }),
        }
    }

    fn tracked(&self) -> MutexGuard<'_, HashMap<DeviceId, Arc<Device>>> {
        self.inner
            .devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Enumeration idle window used by the watcher.
    pub fn debounce_window(&self) -> Duration {
        self.inner.debounce
    }

    pub fn catalog(&self) -> &[MouseModel] {
        &self.inner.catalog
    }

    /// Catalog models the backend currently enumerates.
    pub fn present_models(&self) -> Vec<MouseModel> {
        if let Err(e) = self.inner.backend.refresh() {
            warn!(error = %e, "enumeration refresh failed");
        }
        self.inner
            .catalog
            .iter()
            .copied()
            .filter(|model| self.inner.backend.is_present(&model.descriptor()))
            .collect()
    }

    /// Snapshot of the tracked devices.
    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.tracked().values().cloned().collect()
    }

    pub fn get(&self, id: &DeviceId) -> Option<Arc<Device>> {
        self.tracked().get(id).cloned()
    }

    pub fn is_tracked(&self, id: &DeviceId) -> bool {
        self.tracked().contains_key(id)
    }

    pub fn is_any_connected(&self) -> bool {
        !self.tracked().is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked().is_empty()
    }

    /// Full detection pass over the catalog.
    ///
    /// Devices that are tracked but no longer enumerated are removed first.
    /// Present, untracked models are then connected concurrently. Returns the
    /// number of newly connected devices.
    pub async fn detect_all(&self) -> usize {
        let _pass = self.inner.detecting.lock().await;
        let backend = &self.inner.backend;

        if let Err(e) = backend.refresh() {
            warn!(error = %e, "enumeration refresh failed");
        }

        for device in self.devices() {
            if !backend.is_present(&device.id()) {
                info!(device = device.name(), "device no longer enumerated");
                self.remove(&device.id());
            }
        }

        let mut tasks = JoinSet::new();
        for &model in &self.inner.catalog {
            let registry = self.clone();
            tasks.spawn(async move { registry.detect_one(model).await });
        }

        let mut connected = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(true)) => connected += 1,
                Ok(Ok(false)) => {}
                Ok(Err(e)) => debug!(error = %e, "detection left device unconnected"),
                Err(e) => warn!(error = %e, "detection task aborted"),
            }
        }

        info!(connected, tracked = self.len(), "detection pass complete");
        connected
    }

    /// Connect one model if it is present and not yet tracked.
    ///
    /// Returns `Ok(true)` when the model became tracked by this call.
    pub async fn detect_one(&self, model: MouseModel) -> Result<bool> {
        let id = model.descriptor();
        if self.is_tracked(&id) {
            debug!(device = model.name(), "already tracked");
            return Ok(false);
        }
        if !self.inner.backend.is_present(&id) {
            return Ok(false);
        }

        info!(device = model.name(), descriptor = %id, "connecting");
        let device = Arc::new(Device::new(model));
        let backend = Arc::clone(&self.inner.backend);
        connection::establish(&device, backend, &self.inner.policy).await?;

        Ok(self.insert(device))
    }

    /// Track a ready device; a duplicate identity is refused.
    fn insert(&self, device: Arc<Device>) -> bool {
        let id = device.id();
        {
            let mut tracked = self.tracked();
            if tracked.contains_key(&id) {
                drop(tracked);
                warn!(device = device.name(), "duplicate connect, releasing handle");
                device.disconnect();
                return false;
            }
            tracked.insert(id, Arc::clone(&device));
        }
        info!(device = device.name(), "device connected");
        self.inner.notifier.changed(id);
        true
    }

    /// Untrack a device and release its handle. Emits one `Disconnected`
    /// and one `Changed`; a device that is not tracked is ignored.
    fn remove(&self, id: &DeviceId) -> Option<Arc<Device>> {
        let device = self.tracked().remove(id)?;
        device.disconnect();
        info!(device = device.name(), "device disconnected");
        self.inner.notifier.disconnected(*id);
        self.inner.notifier.changed(*id);
        Some(device)
    }

    /// Explicit disconnect request.
    pub fn disconnect(&self, id: &DeviceId) -> bool {
        self.remove(id).is_some()
    }

    /// React to a lifecycle signal from a device's transport.
    pub fn handle_signal(&self, id: &DeviceId, signal: DeviceSignal) {
        let Some(device) = self.get(id) else {
            debug!(descriptor = %id, ?signal, "signal for untracked device ignored");
            return;
        };

        match signal {
            DeviceSignal::Disconnected => {
                self.remove(id);
            }
            DeviceSignal::ReadinessChanged(true) => {
                self.inner.notifier.readiness_changed(*id, true);
                self.inner.notifier.changed(*id);
            }
            DeviceSignal::ReadinessChanged(false) => {
                warn!(device = device.name(), "device lost readiness");
                self.inner.notifier.readiness_changed(*id, false);
                self.remove(id);
            }
            DeviceSignal::Battery(battery) => {
                device.apply_battery(battery);
                self.inner.notifier.battery_updated(*id, battery);
                self.inner.notifier.changed(*id);
            }
        }
    }

    /// Re-synchronize a tracked device. A failure counts as lost readiness.
    pub fn synchronize(&self, id: &DeviceId) -> Result<()> {
        let device = self
            .get(id)
            .ok_or_else(|| Error::DeviceNotFound(id.to_string()))?;
        match device.synchronize() {
            Ok(()) => {
                self.inner.notifier.changed(*id);
                Ok(())
            }
            Err(e) => {
                self.handle_signal(id, DeviceSignal::ReadinessChanged(false));
                Err(e)
            }
        }
    }

    /// Battery read of one tracked device, raising a battery notification.
    pub fn read_battery(&self, id: &DeviceId) -> Result<Battery> {
        let device = self
            .get(id)
            .ok_or_else(|| Error::DeviceNotFound(id.to_string()))?;
        let battery = device.read_battery()?;
        self.inner.notifier.battery_updated(*id, battery);
        self.inner.notifier.changed(*id);
        Ok(battery)
    }

    /// Periodic refresh: re-synchronize devices that are not ready, read the
    /// battery of the others.
    pub fn refresh_battery_for_all(&self) {
        for device in self.devices() {
            let id = device.id();
            if !device.is_ready() {
                if let Err(e) = self.synchronize(&id) {
                    warn!(device = device.name(), error = %e, "re-synchronize failed");
                }
            } else if device.capabilities().battery {
                if let Err(e) = self.read_battery(&id) {
                    warn!(device = device.name(), error = %e, "battery refresh failed");
                }
            }
        }
    }
}
