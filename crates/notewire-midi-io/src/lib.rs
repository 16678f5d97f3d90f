//! MIDI input subsystem for the notewire engine.
//!
//! Requests platform MIDI access once, attaches a single shared
//! [`MidiParser`] to every input source, and keeps attaching sources that
//! are plugged in later.
//!
//! Feature gates: `midi-io` (hardware access via midir). Without it only
//! [`VirtualMidi`] and user-supplied [`MidiBackend`]s are available.

pub mod error;
pub use error::{Error, Result};

mod backend;
pub use backend::{MessageConsumer, MidiAccess, MidiBackend};

mod port;
pub use port::{DeviceRegistry, PortInfo, PortState, PortType, SourceId};

mod topology;
pub use topology::{TopologyEvent, TopologySubscription};

mod virtual_midi;
pub use virtual_midi::VirtualMidi;

mod system;
pub use system::{AccessState, MidiSystem, MidiSystemBuilder};

#[cfg(feature = "midi-io")]
pub(crate) mod io;

#[cfg(feature = "midi-io")]
pub use io::MidirBackend;

pub use notewire_midi::{EventKind, HandlerTable, MidiEvent, MidiParser};
