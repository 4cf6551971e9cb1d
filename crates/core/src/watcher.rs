//! Debounced reaction to host enumeration changes.
//!
//! A composite HID device raises several enumeration events per plug or
//! unplug. The watcher collects them and runs one detection pass once the
//! stream has been quiet for the registry's debounce window.

use crate::registry::Registry;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Call `on_idle` once per burst of events, after `window` without a new one.
///
/// Returns when every sender is dropped; a burst still pending at that point
/// is discarded.
pub async fn debounce<F, Fut>(
    mut events: mpsc::UnboundedReceiver<()>,
    window: Duration,
    mut on_idle: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    while events.recv().await.is_some() {
        let mut burst = 1usize;
        loop {
            match tokio::time::timeout(window, events.recv()).await {
                Ok(Some(())) => burst += 1,
                Ok(None) => return,
                Err(_) => break,
            }
        }
        debug!(burst, "enumeration settled");
        on_idle().await;
    }
}

/// Background task running [`Registry::detect_all`] on settled enumeration
/// changes.
pub struct DeviceWatcher {
    events: mpsc::UnboundedSender<()>,
    task: JoinHandle<()>,
}

impl DeviceWatcher {
    pub fn start(registry: Registry) -> Self {
        let (events, rx) = mpsc::unbounded_channel();
        let window = registry.debounce_window();
        let task = tokio::spawn(debounce(rx, window, move || {
            let registry = registry.clone();
            async move {
                registry.detect_all().await;
            }
        }));
        info!(window_ms = window.as_millis() as u64, "device watcher started");
        Self { events, task }
    }

    /// Report one enumeration-changed event from the host.
    pub fn notify_changed(&self) {
        let _ = self.events.send(());
    }

    /// Stop watching; an in-flight detection pass is cancelled.
    pub async fn shutdown(self) {
        drop(self.events);
        self.task.abort();
        let _ = self.task.await;
        info!("device watcher stopped");
    }
}
