//! Polling hot-plug detection.
//!
//! nokhwa has no device-change callback, so a watcher task re-queries the
//! camera list on an interval and emits a [`DeviceChange`] whenever the set
//! of cameras differs from the last one it saw.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::media::{DeviceChange, ListenerId};

/// Lower bound for the polling interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A running watcher. Dropping it stops the polling task.
#[derive(Debug)]
pub struct HotplugWatcher {
    listener: ListenerId,
    task: JoinHandle<()>,
}

impl HotplugWatcher {
    /// Spawn a watcher on the current tokio runtime.
    ///
    /// `list` is run on the blocking pool and returns the current device
    /// list; a failing listing counts as "no devices".
    pub fn spawn<T, E, F>(
        listener: ListenerId,
        interval: Duration,
        list: F,
        tx: UnboundedSender<DeviceChange>,
    ) -> Self
    where
        T: PartialEq + Send + 'static,
        E: std::fmt::Display + Send + 'static,
        F: Fn() -> Result<Vec<T>, E> + Send + Sync + 'static,
    {
        let list = Arc::new(list);
        let interval = interval.max(MIN_POLL_INTERVAL);

        let task = tokio::spawn(async move {
            let mut last = run_list(&list).await;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let current = run_list(&list).await;
                if devices_changed(&last, &current) {
                    log::info!(
                        "camera list changed ({} -> {} devices)",
                        last.len(),
                        current.len()
                    );
                    last = current;
                    if tx.send(DeviceChange { listener }).is_err() {
                        log::debug!("device-change receiver closed, watcher exiting");
                        break;
                    }
                }
            }
        });

        Self { listener, task }
    }

    pub fn listener(&self) -> ListenerId {
        self.listener
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for HotplugWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_list<T, E, F>(list: &Arc<F>) -> Vec<T>
where
    T: Send + 'static,
    E: std::fmt::Display + Send + 'static,
    F: Fn() -> Result<Vec<T>, E> + Send + Sync + 'static,
{
    let list = Arc::clone(list);
    match tokio::task::spawn_blocking(move || list()).await {
        Ok(Ok(devices)) => devices,
        Ok(Err(e)) => {
            log::debug!("device listing failed: {}", e);
            Vec::new()
        }
        Err(e) => {
            log::warn!("device list task failed: {}", e);
            Vec::new()
        }
    }
}

/// True when the two lists do not hold the same devices. Order is ignored.
pub fn devices_changed<T: PartialEq>(old: &[T], new: &[T]) -> bool {
    old.len() != new.len() || !old.iter().all(|d| new.contains(d))
}
