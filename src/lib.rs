//! # notewire - MIDI input engine
//!
//! Turns raw MIDI bytes from any number of hot-pluggable input devices into
//! normalized note, controller and pitch-bend events.
//!
//! ## Architecture
//!
//! notewire is an umbrella crate that coordinates:
//! - **notewire-midi** - Message decoding and the handler table
//! - **notewire-midi-io** - Platform access, device registry, hot-plug watching
//!
//! ## Quick Start
//!
//! ```ignore
//! use notewire::prelude::*;
//!
//! let engine = NotewireEngine::builder().build()?;
//!
//! engine.midi().on_pitch_bend(|bend, channel, _raw| {
//!     println!("bend {} on ch{}", bend, channel);
//! });
//!
//! // Note On/Off already drive the voice bank
//! let sounding = engine.voices().active_count();
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Hardware MIDI input
//! - `midi-hardware` - midir backend (otherwise only `VirtualMidi` or a custom backend)

/// Re-export of notewire-midi-io for direct access
pub use notewire_midi_io as midi;

pub use notewire_midi::{
    note_to_hz, status, velocity_to_gain, EventKind, HandlerTable, MidiEvent, MidiParser,
    RawMessage, PITCH_BEND_CENTER,
};

pub use notewire_midi_io::{
    AccessState, DeviceRegistry, MessageConsumer, MidiAccess, MidiBackend, MidiSystem,
    MidiSystemBuilder, PortInfo, PortState, PortType, SourceId, TopologyEvent,
    TopologySubscription, VirtualMidi,
};

#[cfg(feature = "midi-hardware")]
pub use notewire_midi_io::MidirBackend;

mod error;
pub use error::{Error, Result};

mod voice;
pub use voice::{Voice, VoiceBank, DEFAULT_MASTER_GAIN};

mod builder;
mod engine;

pub use builder::NotewireEngineBuilder;
pub use engine::NotewireEngine;

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{Error, NotewireEngine, NotewireEngineBuilder, Result};

    pub use crate::{EventKind, HandlerTable, MidiEvent, MidiParser};

    pub use crate::{AccessState, MidiSystem, PortInfo, SourceId, VirtualMidi};

    pub use crate::{Voice, VoiceBank};

    pub use crate::{note_to_hz, velocity_to_gain};
}
