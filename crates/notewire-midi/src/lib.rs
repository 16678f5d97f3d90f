//! MIDI message normalization for the notewire engine.
//!
//! Decodes raw 1-3 byte MIDI messages into a seven-variant event model and
//! dispatches each one to a user-assignable callback slot.
//!
//! # Features
//!
//! - **Raw message view**: status/command/channel and optional data bytes
//! - **Event model**: Note On/Off, Poly Key Pressure, Controller Change,
//!   Program Change, Channel Pressure, Pitch Bend
//! - **Handler table**: one typed callback per event kind, no-op by default
//! - **Parser**: lock-free decode-and-dispatch, safe to share across threads
//!
//! # Example
//!
//! ```
//! use notewire_midi::MidiParser;
//!
//! let parser = MidiParser::new();
//! parser.on_note_on(|note, velocity, channel| {
//!     println!("note {note} vel {velocity} ch {channel}");
//! });
//!
//! parser.dispatch(&[0x90, 60, 100]); // Note On
//! parser.dispatch(&[0x90, 60, 0]); // delivered as Note Off
//! parser.dispatch(&[0xF8]); // timing clock, ignored
//! ```

pub mod event;
pub mod handler;
pub mod message;
pub mod parser;
pub(crate) mod utils;

pub use event::{EventKind, MidiEvent, PITCH_BEND_CENTER};
pub use handler::{
    ControllerHandler, HandlerTable, NoteHandler, PitchBendHandler, ValueHandler,
};
pub use message::{status, RawMessage};
pub use parser::MidiParser;
pub use utils::{note_to_hz, velocity_to_gain};
