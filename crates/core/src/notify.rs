//! Change notifications for the single subscriber (a UI, the CLI watch loop).
//!
//! Events are pushed into an unbounded channel so that emitting never blocks
//! the device paths. A dropped subscriber turns every emit into a no-op.

use crate::catalog::DeviceId;
use crate::settings::Battery;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The tracked set or a device's state changed.
    Changed(DeviceId),
    BatteryUpdated { id: DeviceId, battery: Battery },
    ReadinessChanged { id: DeviceId, ready: bool },
    /// The device was removed from the registry.
    Disconnected(DeviceId),
}

impl DeviceEvent {
    pub fn device(&self) -> &DeviceId {
        match self {
            Self::Changed(id) | Self::Disconnected(id) => id,
            Self::BatteryUpdated { id, .. } | Self::ReadinessChanged { id, .. } => id,
        }
    }
}

/// Sending half, cloned into every component that emits events.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<DeviceEvent>>,
}

impl Notifier {
    /// A notifier nobody listens to.
    pub fn disabled() -> Self {
        Self::default()
    }

    fn emit(&self, event: DeviceEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(event).is_err() {
            debug!("event subscriber dropped");
        }
    }

    pub fn changed(&self, id: DeviceId) {
        self.emit(DeviceEvent::Changed(id));
    }

    pub fn battery_updated(&self, id: DeviceId, battery: Battery) {
        self.emit(DeviceEvent::BatteryUpdated { id, battery });
    }

    pub fn readiness_changed(&self, id: DeviceId, ready: bool) {
        self.emit(DeviceEvent::ReadinessChanged { id, ready });
    }

    pub fn disconnected(&self, id: DeviceId) {
        self.emit(DeviceEvent::Disconnected(id));
    }
}

/// Receiving half held by the subscriber.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<DeviceEvent>,
}

impl Subscription {
    /// Wait for the next event; `None` once every notifier is gone.
    pub async fn recv(&mut self) -> Option<DeviceEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<DeviceEvent> {
        self.rx.try_recv().ok()
    }

    /// Everything queued so far.
    pub fn drain(&mut self) -> Vec<DeviceEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

pub fn channel() -> (Notifier, Subscription) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx: Some(tx) }, Subscription { rx })
}
