//! Background thread that keeps hot-plugged inputs attached.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use tracing::debug;

use crate::error::Result;
use crate::port::DeviceRegistry;
use crate::topology::TopologySubscription;

/// Bounds how long shutdown waits for the thread.
const WAKE_INTERVAL: Duration = Duration::from_millis(100);

pub(crate) struct TopologyWatcher {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TopologyWatcher {
    pub(crate) fn spawn(
        registry: Arc<DeviceRegistry>,
        subscription: TopologySubscription,
    ) -> Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("notewire-topology".to_string())
            .spawn(move || {
                while !flag.load(Ordering::Acquire) {
                    match subscription.recv_timeout(WAKE_INTERVAL) {
                        Ok(event) => {
                            registry.handle_event(&event);
                        }
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Topology watcher exiting");
            })?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }
}

impl Drop for TopologyWatcher {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
