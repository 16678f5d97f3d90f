//! Normalized channel-voice events.

use serde::{Deserialize, Serialize};

use crate::message::{status, RawMessage};

/// Raw 14-bit pitch bend value at rest.
pub const PITCH_BEND_CENTER: u16 = 8192;

const PITCH_BEND_MAX: u16 = 0x3FFF;

/// Tag for the seven normalized event kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    NoteOff,
    NoteOn,
    PolyKeyPressure,
    ControllerChange,
    ProgramChange,
    ChannelPressure,
    PitchBend,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::NoteOff,
        EventKind::NoteOn,
        EventKind::PolyKeyPressure,
        EventKind::ControllerChange,
        EventKind::ProgramChange,
        EventKind::ChannelPressure,
        EventKind::PitchBend,
    ];

    /// Command nibble this kind is decoded from.
    #[inline]
    pub fn command(self) -> u8 {
        match self {
            EventKind::NoteOff => status::NOTE_OFF,
            EventKind::NoteOn => status::NOTE_ON,
            EventKind::PolyKeyPressure => status::POLY_KEY_PRESSURE,
            EventKind::ControllerChange => status::CONTROLLER_CHANGE,
            EventKind::ProgramChange => status::PROGRAM_CHANGE,
            EventKind::ChannelPressure => status::CHANNEL_PRESSURE,
            EventKind::PitchBend => status::PITCH_BEND,
        }
    }
}

/// A decoded channel-voice message. Channel is always 0-15.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MidiEvent {
    NoteOff {
        note: u8,
        velocity: u8,
        channel: u8,
    },
    /// Velocity is always 1-127; velocity 0 decodes as `NoteOff`.
    NoteOn {
        note: u8,
        velocity: u8,
        channel: u8,
    },
    PolyKeyPressure {
        note: u8,
        pressure: u8,
        channel: u8,
    },
    ControllerChange {
        controller: u8,
        value: u8,
        channel: u8,
    },
    ProgramChange {
        program: u8,
        channel: u8,
    },
    ChannelPressure {
        pressure: u8,
        channel: u8,
    },
    /// `bend` is `raw14 - 8192`, so -8192..=8191 with 0 at center.
    PitchBend {
        bend: i16,
        channel: u8,
        raw14: u16,
    },
}

impl MidiEvent {
    /// Decode one raw message. Returns `None` for anything that is not a
    /// complete channel-voice message: empty input, system messages, stray
    /// data bytes in status position, or a missing required data byte.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        Self::from_raw(RawMessage::new(bytes))
    }

    pub fn from_raw(msg: RawMessage<'_>) -> Option<Self> {
        let channel = msg.channel()?;

        let event = match msg.command()? {
            status::NOTE_OFF => MidiEvent::NoteOff {
                note: msg.data1()?,
                velocity: msg.data2().unwrap_or(0),
                channel,
            },
            status::NOTE_ON => {
                let note = msg.data1()?;
                match msg.data2() {
                    Some(velocity) if velocity > 0 => MidiEvent::NoteOn {
                        note,
                        velocity,
                        channel,
                    },
                    // Note On with velocity 0 is a Note Off by convention
                    _ => MidiEvent::NoteOff {
                        note,
                        velocity: 0,
                        channel,
                    },
                }
            }
            status::POLY_KEY_PRESSURE => MidiEvent::PolyKeyPressure {
                note: msg.data1()?,
                pressure: msg.data2().unwrap_or(0),
                channel,
            },
            status::CONTROLLER_CHANGE => MidiEvent::ControllerChange {
                controller: msg.data1()?,
                value: msg.data2().unwrap_or(0),
                channel,
            },
            status::PROGRAM_CHANGE => MidiEvent::ProgramChange {
                program: msg.data1()?,
                channel,
            },
            status::CHANNEL_PRESSURE => MidiEvent::ChannelPressure {
                pressure: msg.data1()?,
                channel,
            },
            status::PITCH_BEND => {
                // LSB first
                let lsb = u16::from(msg.data1().unwrap_or(0));
                let msb = u16::from(msg.data2().unwrap_or(0));
                Self::pitch_bend(channel, (msb << 7) | lsb)
            }
            _ => return None,
        };

        Some(event)
    }

    #[inline]
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        let (note, velocity, channel) = (note & 0x7F, velocity & 0x7F, channel & 0x0F);
        if velocity == 0 {
            MidiEvent::NoteOff {
                note,
                velocity,
                channel,
            }
        } else {
            MidiEvent::NoteOn {
                note,
                velocity,
                channel,
            }
        }
    }

    #[inline]
    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        MidiEvent::NoteOff {
            note: note & 0x7F,
            velocity: velocity & 0x7F,
            channel: channel & 0x0F,
        }
    }

    #[inline]
    pub fn controller_change(channel: u8, controller: u8, value: u8) -> Self {
        MidiEvent::ControllerChange {
            controller: controller & 0x7F,
            value: value & 0x7F,
            channel: channel & 0x0F,
        }
    }

    #[inline]
    pub fn program_change(channel: u8, program: u8) -> Self {
        MidiEvent::ProgramChange {
            program: program & 0x7F,
            channel: channel & 0x0F,
        }
    }

    /// `raw14` is clamped to 0..=16383.
    #[inline]
    pub fn pitch_bend(channel: u8, raw14: u16) -> Self {
        let raw14 = raw14.min(PITCH_BEND_MAX);
        MidiEvent::PitchBend {
            bend: raw14 as i16 - PITCH_BEND_CENTER as i16,
            channel: channel & 0x0F,
            raw14,
        }
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        match self {
            MidiEvent::NoteOff { .. } => EventKind::NoteOff,
            MidiEvent::NoteOn { .. } => EventKind::NoteOn,
            MidiEvent::PolyKeyPressure { .. } => EventKind::PolyKeyPressure,
            MidiEvent::ControllerChange { .. } => EventKind::ControllerChange,
            MidiEvent::ProgramChange { .. } => EventKind::ProgramChange,
            MidiEvent::ChannelPressure { .. } => EventKind::ChannelPressure,
            MidiEvent::PitchBend { .. } => EventKind::PitchBend,
        }
    }

    #[inline]
    pub fn channel(&self) -> u8 {
        match *self {
            MidiEvent::NoteOff { channel, .. }
            | MidiEvent::NoteOn { channel, .. }
            | MidiEvent::PolyKeyPressure { channel, .. }
            | MidiEvent::ControllerChange { channel, .. }
            | MidiEvent::ProgramChange { channel, .. }
            | MidiEvent::ChannelPressure { channel, .. }
            | MidiEvent::PitchBend { channel, .. } => channel,
        }
    }

    #[inline]
    pub fn note(&self) -> Option<u8> {
        match *self {
            MidiEvent::NoteOff { note, .. }
            | MidiEvent::NoteOn { note, .. }
            | MidiEvent::PolyKeyPressure { note, .. } => Some(note),
            _ => None,
        }
    }

    #[inline]
    pub fn velocity(&self) -> Option<u8> {
        match *self {
            MidiEvent::NoteOff { velocity, .. } | MidiEvent::NoteOn { velocity, .. } => {
                Some(velocity)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self, MidiEvent::NoteOn { .. })
    }

    #[inline]
    pub fn is_note_off(&self) -> bool {
        matches!(self, MidiEvent::NoteOff { .. })
    }

    /// Pitch bend scaled to -1.0..1.0 (asymmetric: +8191 maps just under 1.0).
    #[inline]
    pub fn bend_normalized(&self) -> Option<f32> {
        match *self {
            MidiEvent::PitchBend { bend, .. } => Some(bend as f32 / PITCH_BEND_CENTER as f32),
            _ => None,
        }
    }
}
