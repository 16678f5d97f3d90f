//! NotewireEngine that couples MIDI input to the voice bank

use std::sync::Arc;

use crate::midi::{MidiParser, MidiSystem, PortInfo};
use crate::voice::VoiceBank;
use crate::NotewireEngineBuilder;

/// MIDI input plus the voices it drives.
///
/// Built with MIDI access already requested. Every connected input, and any
/// plugged in later, dispatches into one parser whose Note On/Off slots feed
/// the voice bank. Other slots are free for user handlers, and the note slots
/// may be overwritten too.
///
/// # Example
///
/// ```ignore
/// use notewire::prelude::*;
///
/// let engine = NotewireEngine::builder().build()?;
///
/// engine.midi().on_controller_change(|controller, value, channel| {
///     println!("CC{} = {} on ch{}", controller, value, channel);
/// });
/// ```
#[derive(Clone)]
pub struct NotewireEngine {
    midi: MidiSystem,
    voices: Arc<VoiceBank>,
}

impl NotewireEngine {
    pub fn builder() -> NotewireEngineBuilder {
        NotewireEngineBuilder::default()
    }

    pub(crate) fn new(midi: MidiSystem, voices: Arc<VoiceBank>) -> Self {
        Self { midi, voices }
    }

    pub fn midi(&self) -> &MidiSystem {
        &self.midi
    }

    pub fn parser(&self) -> &Arc<MidiParser> {
        self.midi.parser()
    }

    pub fn voices(&self) -> &Arc<VoiceBank> {
        &self.voices
    }

    /// True once MIDI access was granted.
    pub fn is_ready(&self) -> bool {
        self.midi.is_ready()
    }

    pub fn inputs(&self) -> Vec<PortInfo> {
        self.midi.list_inputs()
    }

    pub fn set_master_gain(&self, gain: f32) {
        self.voices.set_master_gain(gain);
    }

    pub fn master_gain(&self) -> f32 {
        self.voices.master_gain()
    }

    /// Release every sounding voice.
    pub fn panic(&self) -> usize {
        self.voices.all_notes_off()
    }
}

impl std::fmt::Debug for NotewireEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotewireEngine")
            .field("midi", &self.midi)
            .field("voices", &self.voices)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::VirtualMidi;

    fn engine_with(midi: &VirtualMidi) -> NotewireEngine {
        NotewireEngine::builder()
            .virtual_backend(midi.clone())
            .watch_topology(false)
            .build()
            .unwrap()
    }

    #[test]
    fn test_notes_drive_voices() {
        let midi = VirtualMidi::new();
        let id = midi.connect_input("keys", "Keys");
        let engine = engine_with(&midi);

        midi.send(&id, &[0x90, 60, 100]);
        midi.send(&id, &[0x91, 64, 100]);
        assert_eq!(engine.voices().active_count(), 2);

        midi.send(&id, &[0x80, 60, 0]);
        assert!(engine.voices().voice(0, 60).is_none());

        // Velocity 0 releases too
        midi.send(&id, &[0x91, 64, 0]);
        assert!(engine.voices().is_silent());
    }

    #[test]
    fn test_voices_disabled() {
        let midi = VirtualMidi::new();
        let id = midi.connect_input("keys", "Keys");
        let engine = NotewireEngine::builder()
            .virtual_backend(midi.clone())
            .voices(false)
            .build()
            .unwrap();

        midi.send(&id, &[0x90, 60, 100]);
        assert!(engine.voices().is_silent());
    }

    #[test]
    fn test_panic_releases_everything() {
        let midi = VirtualMidi::new();
        let id = midi.connect_input("keys", "Keys");
        let engine = engine_with(&midi);

        for note in 60..64 {
            midi.send(&id, &[0x90, note, 90]);
        }
        assert_eq!(engine.panic(), 4);
        assert!(engine.voices().is_silent());
    }

    #[test]
    fn test_master_gain_roundtrip() {
        let engine = engine_with(&VirtualMidi::new());
        assert_eq!(engine.master_gain(), 0.25);
        engine.set_master_gain(0.8);
        assert_eq!(engine.master_gain(), 0.8);
    }
}
