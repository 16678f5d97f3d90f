//! Builder for configuring and constructing a `NotewireEngine`.

use std::sync::Arc;
use std::time::Duration;

use crate::midi::{HandlerTable, MidiBackend, MidiSystem, MidiSystemBuilder, VirtualMidi};
use crate::voice::{VoiceBank, DEFAULT_MASTER_GAIN};
use crate::{Error, NotewireEngine, Result};

/// Access is requested during `build`. A refused request is logged by the
/// MIDI system and leaves the engine inert rather than failing the build;
/// check `engine.midi().state()` to tell the two apart. Other initialization
/// failures are returned from `build`.
///
/// # Example
///
/// ```ignore
/// use notewire::prelude::*;
///
/// let engine = NotewireEngine::builder()
///     .master_gain(0.5)
///     .build()?;
///
/// for voice in engine.voices().active_voices() {
///     println!("{} Hz", voice.frequency);
/// }
/// ```
pub struct NotewireEngineBuilder {
    midi: MidiSystemBuilder,
    master_gain: f32,
    enable_voices: bool,
}

impl Default for NotewireEngineBuilder {
    fn default() -> Self {
        Self {
            midi: MidiSystemBuilder::default(),
            master_gain: DEFAULT_MASTER_GAIN,
            enable_voices: true,
        }
    }
}

impl NotewireEngineBuilder {
    pub fn backend(mut self, backend: impl MidiBackend + 'static) -> Self {
        self.midi = self.midi.backend(backend);
        self
    }

    pub fn virtual_backend(mut self, midi: VirtualMidi) -> Self {
        self.midi = self.midi.virtual_backend(midi);
        self
    }

    /// Default: "notewire"
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.midi = self.midi.client_name(name);
        self
    }

    /// Default: 250 ms
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.midi = self.midi.poll_interval(interval);
        self
    }

    /// Default: true
    pub fn watch_topology(mut self, enabled: bool) -> Self {
        self.midi = self.midi.watch_topology(enabled);
        self
    }

    /// Initial handlers. Note On/Off are replaced by the voice bank unless
    /// voices are disabled.
    pub fn handlers(mut self, handlers: HandlerTable) -> Self {
        self.midi = self.midi.handlers(handlers);
        self
    }

    /// Default: 0.25
    pub fn master_gain(mut self, gain: f32) -> Self {
        self.master_gain = gain;
        self
    }

    /// Route Note On/Off into the voice bank. Default: true
    pub fn voices(mut self, enabled: bool) -> Self {
        self.enable_voices = enabled;
        self
    }

    pub fn build(self) -> Result<NotewireEngine> {
        if !self.master_gain.is_finite() || self.master_gain < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "master gain must be a finite non-negative number, got {}",
                self.master_gain
            )));
        }

        let midi = self.midi.build()?;
        let voices = Arc::new(VoiceBank::new(self.master_gain));

        if self.enable_voices {
            wire_voices(&midi, &voices);
        }

        // A refused or missing platform is already reported and leaves the
        // engine inert; anything else is a build failure
        match midi.initialize() {
            Ok(()) => {}
            Err(e) if e.is_access_failure() => {}
            Err(e) => return Err(e.into()),
        }

        Ok(NotewireEngine::new(midi, voices))
    }
}

fn wire_voices(midi: &MidiSystem, voices: &Arc<VoiceBank>) {
    let on = Arc::clone(voices);
    let off = Arc::clone(voices);
    midi.on_note_on(move |note, velocity, channel| on.note_on(note, velocity, channel))
        .on_note_off(move |note, _velocity, channel| {
            off.note_off(note, channel);
        });
}
