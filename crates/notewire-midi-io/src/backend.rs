//! Platform seams: how the registry reaches a MIDI subsystem.
//!
//! A [`MidiBackend`] performs the one-shot access request. The granted
//! [`MidiAccess`] enumerates inputs, attaches consumers and publishes
//! topology changes.

use std::sync::Arc;

use notewire_midi::MidiParser;

use crate::error::Result;
use crate::port::{PortInfo, SourceId};
use crate::topology::TopologySubscription;

/// Receives raw messages from an input source, on whatever thread the
/// platform delivers them.
pub trait MessageConsumer: Send + Sync {
    fn on_message(&self, bytes: &[u8]);
}

impl MessageConsumer for MidiParser {
    #[inline]
    fn on_message(&self, bytes: &[u8]) {
        self.dispatch(bytes);
    }
}

/// Granted access to a MIDI subsystem.
pub trait MidiAccess: Send {
    /// Currently connected input sources.
    fn inputs(&self) -> Vec<PortInfo>;

    /// Route messages from `source` to `consumer`. A source has at most one
    /// consumer; attaching again replaces the previous one.
    fn attach(&mut self, source: &SourceId, consumer: Arc<dyn MessageConsumer>) -> Result<()>;

    /// Stream of port connect/disconnect events for the whole topology.
    fn subscribe(&mut self) -> TopologySubscription;
}

pub trait MidiBackend: Send {
    fn name(&self) -> &str;

    /// One-shot permission request. Blocks until the platform grants or
    /// refuses access.
    fn request_access(&mut self) -> Result<Box<dyn MidiAccess>>;
}
