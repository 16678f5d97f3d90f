//! Conversions used by event consumers.

const A4_NOTE: f32 = 69.0;
const A4_HZ: f32 = 440.0;

/// Equal-tempered frequency of a MIDI note, A4 (69) = 440 Hz.
#[inline]
pub fn note_to_hz(note: u8) -> f32 {
    A4_HZ * 2.0_f32.powf((f32::from(note) - A4_NOTE) / 12.0)
}

/// Linear gain in 0.0..=1.0 for a 7-bit velocity.
#[inline]
pub fn velocity_to_gain(velocity: u8) -> f32 {
    f32::from(velocity.min(127)) / 127.0
}
