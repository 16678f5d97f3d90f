//! Device Registry
//!
//! Keeps every connected input source delivering into one shared consumer,
//! across a set of sources the platform changes underneath us.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{PortInfo, PortState, SourceId};
use crate::backend::{MessageConsumer, MidiAccess};
use crate::error::Result;
use crate::topology::{TopologyEvent, TopologySubscription};

pub struct DeviceRegistry {
    access: Mutex<Box<dyn MidiAccess>>,
    consumer: Arc<dyn MessageConsumer>,
    /// Every input seen so far, with its last observed state.
    sources: DashMap<SourceId, PortInfo>,
}

impl DeviceRegistry {
    pub fn new(access: Box<dyn MidiAccess>, consumer: Arc<dyn MessageConsumer>) -> Self {
        Self {
            access: Mutex::new(access),
            consumer,
            sources: DashMap::new(),
        }
    }

    /// Attach the consumer to every input the platform currently reports.
    ///
    /// Sources that fail to attach are logged and skipped. Returns the number
    /// attached.
    pub fn attach_all(&self) -> usize {
        let inputs = self.access.lock().inputs();
        let mut attached = 0;
        for port in &inputs {
            match self.attach(port) {
                Ok(()) => attached += 1,
                Err(e) => warn!("Skipping MIDI input '{}': {}", port.name, e),
            }
        }
        attached
    }

    /// Attach the consumer to one input. Re-attaching an attached source
    /// replaces the consumer with itself, so each message is still
    /// dispatched once.
    pub fn attach(&self, port: &PortInfo) -> Result<()> {
        self.access
            .lock()
            .attach(&port.id, Arc::clone(&self.consumer))?;

        self.sources.insert(
            port.id.clone(),
            port.clone().with_state(PortState::Connected),
        );
        debug!("Attached MIDI input {}: {}", port.id, port.name);
        Ok(())
    }

    pub fn subscribe(&self) -> TopologySubscription {
        self.access.lock().subscribe()
    }

    /// React to one topology change. Newly connected inputs are attached;
    /// disconnects are only recorded, the source simply stops sending.
    ///
    /// Returns true if a source was attached.
    pub fn handle_event(&self, event: &TopologyEvent) -> bool {
        match event {
            TopologyEvent::Connected(port) if port.is_input() => match self.attach(port) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Hot-plugged MIDI input '{}' not attached: {}", port.name, e);
                    false
                }
            },
            TopologyEvent::Disconnected(port) if port.is_input() => {
                if let Some(mut known) = self.sources.get_mut(&port.id) {
                    known.state = PortState::Disconnected;
                }
                debug!("MIDI input disconnected {}: {}", port.id, port.name);
                false
            }
            _ => false,
        }
    }

    /// Handle every event already queued on `subscription`.
    pub fn process_pending(&self, subscription: &TopologySubscription) -> usize {
        let mut handled = 0;
        while let Some(event) = subscription.try_next() {
            self.handle_event(&event);
            handled += 1;
        }
        handled
    }

    /// Known inputs sorted by id, connected or not.
    pub fn sources(&self) -> Vec<PortInfo> {
        let mut sources: Vec<PortInfo> = self
            .sources
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sources.sort_by(|a, b| a.id.cmp(&b.id));
        sources
    }

    pub fn source(&self, id: &SourceId) -> Option<PortInfo> {
        self.sources.get(id).map(|entry| entry.value().clone())
    }

    /// True while `id` is attached and the platform reports it connected.
    pub fn is_attached(&self, id: &SourceId) -> bool {
        self.sources
            .get(id)
            .map(|entry| entry.is_connected())
            .unwrap_or(false)
    }

    pub fn connected_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|entry| entry.is_connected())
            .count()
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("known_sources", &self.sources.len())
            .field("connected", &self.connected_count())
            .finish()
    }
}
