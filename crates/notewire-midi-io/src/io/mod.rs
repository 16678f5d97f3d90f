//! Hardware MIDI input.
//!
//! Device enumeration, connection and hot-plug polling via midir.
//! Requires the `midi-io` feature.

mod input;

pub use input::MidirBackend;
