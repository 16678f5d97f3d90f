//! In-memory MIDI platform.
//!
//! Stands in for a hardware subsystem: sources are plugged and unplugged by
//! hand, messages are injected with [`VirtualMidi::send`] and delivered
//! synchronously on the caller's thread. Useful for tests, simulations and
//! hosts that feed MIDI from somewhere other than a device driver.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::backend::{MessageConsumer, MidiAccess, MidiBackend};
use crate::error::{Error, Result};
use crate::port::{PortInfo, PortState, SourceId};
use crate::topology::{TopologyEvent, TopologyPublisher, TopologySubscription};

/// Handle to a virtual MIDI platform. Clones share the same platform.
#[derive(Clone, Default)]
pub struct VirtualMidi {
    inner: Arc<VirtualInner>,
}

#[derive(Default)]
struct VirtualInner {
    ports: RwLock<Vec<PortInfo>>,
    consumers: DashMap<SourceId, Arc<dyn MessageConsumer>>,
    topology: Mutex<TopologyPublisher>,
    denial: Mutex<Option<String>>,
    access_requests: AtomicUsize,
}

impl VirtualMidi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every access request with `reason`.
    pub fn deny_access(self, reason: impl Into<String>) -> Self {
        *self.inner.denial.lock() = Some(reason.into());
        self
    }

    /// Plug in an input source (or re-plug a known one).
    pub fn connect_input(&self, id: impl Into<SourceId>, name: impl Into<String>) -> SourceId {
        self.connect_port(PortInfo::input(id, name))
    }

    /// Plug in an output port. Outputs show up in topology events only.
    pub fn connect_output(&self, id: impl Into<SourceId>, name: impl Into<String>) -> SourceId {
        self.connect_port(PortInfo::output(id, name))
    }

    pub fn connect_port(&self, port: PortInfo) -> SourceId {
        let port = port.with_state(PortState::Connected);
        let id = port.id.clone();
        {
            let mut ports = self.inner.ports.write();
            match ports.iter_mut().find(|p| p.id == id) {
                Some(existing) => *existing = port.clone(),
                None => ports.push(port.clone()),
            }
        }
        debug!("Virtual MIDI port connected {}: {}", id, port.name);
        self.inner
            .topology
            .lock()
            .publish(TopologyEvent::Connected(port));
        id
    }

    /// Unplug a port. Returns false if it was not connected.
    pub fn disconnect(&self, id: &SourceId) -> bool {
        let port = {
            let mut ports = self.inner.ports.write();
            match ports.iter_mut().find(|p| &p.id == id && p.is_connected()) {
                Some(port) => {
                    port.state = PortState::Disconnected;
                    port.clone()
                }
                None => return false,
            }
        };
        debug!("Virtual MIDI port disconnected {}: {}", id, port.name);
        self.inner
            .topology
            .lock()
            .publish(TopologyEvent::Disconnected(port));
        true
    }

    /// Deliver `bytes` from input `id` to its consumer.
    ///
    /// Returns false when the source is unknown, disconnected or has no
    /// consumer attached.
    pub fn send(&self, id: &SourceId, bytes: &[u8]) -> bool {
        let connected = self
            .inner
            .ports
            .read()
            .iter()
            .any(|p| &p.id == id && p.is_input() && p.is_connected());
        if !connected {
            return false;
        }

        // Clone out of the map so the consumer runs without holding a shard lock
        let consumer = match self.inner.consumers.get(id) {
            Some(entry) => Arc::clone(entry.value()),
            None => return false,
        };
        consumer.on_message(bytes);
        true
    }

    /// Send a sequence of messages from one source, in order.
    pub fn send_all<'a>(&self, id: &SourceId, messages: impl IntoIterator<Item = &'a [u8]>) -> usize {
        messages
            .into_iter()
            .filter(|bytes| self.send(id, bytes))
            .count()
    }

    pub fn ports(&self) -> Vec<PortInfo> {
        self.inner.ports.read().clone()
    }

    /// Number of sources with a consumer attached.
    pub fn attached_count(&self) -> usize {
        self.inner.consumers.len()
    }

    pub fn access_requests(&self) -> usize {
        self.inner.access_requests.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for VirtualMidi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualMidi")
            .field("ports", &self.inner.ports.read().len())
            .field("attached", &self.inner.consumers.len())
            .finish()
    }
}

impl MidiBackend for VirtualMidi {
    fn name(&self) -> &str {
        "virtual"
    }

    fn request_access(&mut self) -> Result<Box<dyn MidiAccess>> {
        self.inner.access_requests.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.inner.denial.lock().clone() {
            return Err(Error::AccessDenied(reason));
        }
        Ok(Box::new(VirtualAccess {
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct VirtualAccess {
    inner: Arc<VirtualInner>,
}

impl MidiAccess for VirtualAccess {
    fn inputs(&self) -> Vec<PortInfo> {
        self.inner
            .ports
            .read()
            .iter()
            .filter(|p| p.is_input() && p.is_connected())
            .cloned()
            .collect()
    }

    fn attach(&mut self, source: &SourceId, consumer: Arc<dyn MessageConsumer>) -> Result<()> {
        let available = self
            .inner
            .ports
            .read()
            .iter()
            .any(|p| &p.id == source && p.is_input() && p.is_connected());
        if !available {
            return Err(Error::MidiPort(format!(
                "virtual input '{}' is not connected",
                source
            )));
        }
        self.inner.consumers.insert(source.clone(), consumer);
        Ok(())
    }

    fn subscribe(&mut self) -> TopologySubscription {
        self.inner.topology.lock().subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notewire_midi::MidiParser;
    use parking_lot::Mutex;

    #[test]
    fn test_denied_access() {
        let mut midi = VirtualMidi::new().deny_access("user said no");
        let result = midi.request_access();
        assert!(matches!(result, Err(Error::AccessDenied(ref r)) if r == "user said no"));
        assert_eq!(midi.access_requests(), 1);
    }

    #[test]
    fn test_inputs_lists_connected_inputs_only() {
        let mut midi = VirtualMidi::new();
        let a = midi.connect_input("a", "Keys");
        midi.connect_input("b", "Pads");
        midi.connect_output("c", "Synth");
        midi.disconnect(&a);

        let access = midi.request_access().unwrap();
        let inputs = access.inputs();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name, "Pads");
        assert_eq!(midi.ports().len(), 3);
    }

    #[test]
    fn test_send_reaches_attached_parser() {
        let mut midi = VirtualMidi::new();
        let id = midi.connect_input("a", "Keys");
        let mut access = midi.request_access().unwrap();

        let notes = Arc::new(Mutex::new(Vec::new()));
        let parser = Arc::new(MidiParser::new());
        let sink = notes.clone();
        parser.on_note_on(move |note, _, _| sink.lock().push(note));

        access.attach(&id, parser).unwrap();
        assert_eq!(midi.attached_count(), 1);

        let messages: [&[u8]; 3] = [&[0x90, 60, 1], &[0x90, 62, 1], &[0xF8]];
        let sent = midi.send_all(&id, messages);
        assert_eq!(sent, 3);
        assert_eq!(*notes.lock(), vec![60, 62]);
    }

    #[test]
    fn test_attach_to_unknown_source_fails() {
        let mut midi = VirtualMidi::new();
        let mut access = midi.request_access().unwrap();
        let result = access.attach(&SourceId::from("nope"), Arc::new(MidiParser::new()));
        assert!(matches!(result, Err(Error::MidiPort(_))));
    }

    #[test]
    fn test_topology_events_published() {
        let mut midi = VirtualMidi::new();
        let mut access = midi.request_access().unwrap();
        let subscription = access.subscribe();

        let id = midi.connect_input("a", "Keys");
        assert!(midi.disconnect(&id));
        assert!(!midi.disconnect(&id));

        let events = subscription.drain();
        assert_eq!(events.len(), 2);
        assert!(events[0].is_input_connected());
        assert!(matches!(events[1], TopologyEvent::Disconnected(ref p) if p.id == id));
    }
}
