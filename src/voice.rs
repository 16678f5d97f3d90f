//! Voice bank driven by note events.
//!
//! One voice per (channel, note), pitched by equal temperament and scaled by
//! a shared master gain. Rendering is left to the host; the bank only tracks
//! which voices sound and how loud.

use std::sync::atomic::Ordering;

use atomic_float::AtomicF32;
use dashmap::DashMap;
use notewire_midi::{note_to_hz, velocity_to_gain};
use tracing::debug;

pub const DEFAULT_MASTER_GAIN: f32 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub channel: u8,
    pub note: u8,
    pub frequency: f32,
    pub velocity: u8,
    /// Velocity gain, before the master gain.
    pub gain: f32,
    /// Note Ons received while this voice was sounding, including the first.
    pub triggers: u32,
}

impl Voice {
    fn new(channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            channel,
            note,
            frequency: note_to_hz(note),
            velocity,
            gain: velocity_to_gain(velocity),
            triggers: 1,
        }
    }

    /// Output amplitude after `master_gain`.
    #[inline]
    pub fn level(&self, master_gain: f32) -> f32 {
        self.gain * master_gain
    }
}

/// Safe to drive from MIDI callback threads while the host reads it.
pub struct VoiceBank {
    voices: DashMap<(u8, u8), Voice>,
    master_gain: AtomicF32,
}

impl VoiceBank {
    pub fn new(master_gain: f32) -> Self {
        Self {
            voices: DashMap::new(),
            master_gain: AtomicF32::new(master_gain.max(0.0)),
        }
    }

    /// Start a voice, or retrigger the one already sounding for this key.
    pub fn note_on(&self, note: u8, velocity: u8, channel: u8) {
        self.voices
            .entry((channel, note))
            .and_modify(|voice| {
                voice.velocity = velocity;
                voice.gain = velocity_to_gain(velocity);
                voice.triggers = voice.triggers.saturating_add(1);
            })
            .or_insert_with(|| Voice::new(channel, note, velocity));
        debug!("voice on ch{} note {} vel {}", channel, note, velocity);
    }

    /// Release the voice for this key. Returns false if none was sounding.
    pub fn note_off(&self, note: u8, channel: u8) -> bool {
        self.voices.remove(&(channel, note)).is_some()
    }

    pub fn voice(&self, channel: u8, note: u8) -> Option<Voice> {
        self.voices.get(&(channel, note)).map(|v| v.value().clone())
    }

    /// Sounding voices ordered by channel, then note.
    pub fn active_voices(&self) -> Vec<Voice> {
        let mut voices: Vec<Voice> = self.voices.iter().map(|v| v.value().clone()).collect();
        voices.sort_by_key(|v| (v.channel, v.note));
        voices
    }

    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    pub fn is_silent(&self) -> bool {
        self.voices.is_empty()
    }

    /// Negative values clamp to 0.
    pub fn set_master_gain(&self, gain: f32) {
        self.master_gain.store(gain.max(0.0), Ordering::Release);
    }

    #[inline]
    pub fn master_gain(&self) -> f32 {
        self.master_gain.load(Ordering::Acquire)
    }

    /// Sum of every voice's output level.
    pub fn output_level(&self) -> f32 {
        let master = self.master_gain();
        self.voices.iter().map(|v| v.level(master)).sum()
    }

    /// Release everything. Returns the number of voices stopped.
    pub fn all_notes_off(&self) -> usize {
        let count = self.voices.len();
        self.voices.clear();
        count
    }
}

impl Default for VoiceBank {
    fn default() -> Self {
        Self::new(DEFAULT_MASTER_GAIN)
    }
}

impl std::fmt::Debug for VoiceBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceBank")
            .field("active", &self.voices.len())
            .field("master_gain", &self.master_gain())
            .finish()
    }
}
