//! Handler table: one callback slot per event kind.
//!
//! Unassigned slots behave as no-ops. Slots hold `Arc`s so a table is cheap
//! to clone, which is how [`MidiParser`](crate::MidiParser) swaps in updates
//! without blocking dispatch.

use std::fmt;
use std::sync::Arc;

use crate::event::{EventKind, MidiEvent};

/// `(note, value, channel)`. Used by Note Off, Note On and Poly Key Pressure.
pub type NoteHandler = Arc<dyn Fn(u8, u8, u8) + Send + Sync>;

/// `(controller, value, channel)`.
pub type ControllerHandler = Arc<dyn Fn(u8, u8, u8) + Send + Sync>;

/// `(value, channel)`. Used by Program Change and Channel Pressure.
pub type ValueHandler = Arc<dyn Fn(u8, u8) + Send + Sync>;

/// `(bend, channel, raw14)`.
pub type PitchBendHandler = Arc<dyn Fn(i16, u8, u16) + Send + Sync>;

#[derive(Clone, Default)]
pub struct HandlerTable {
    pub(crate) note_off: Option<NoteHandler>,
    pub(crate) note_on: Option<NoteHandler>,
    pub(crate) poly_key_pressure: Option<NoteHandler>,
    pub(crate) controller_change: Option<ControllerHandler>,
    pub(crate) program_change: Option<ValueHandler>,
    pub(crate) channel_pressure: Option<ValueHandler>,
    pub(crate) pitch_bend: Option<PitchBendHandler>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_note_off(mut self, handler: impl Fn(u8, u8, u8) + Send + Sync + 'static) -> Self {
        self.note_off = Some(Arc::new(handler));
        self
    }

    pub fn on_note_on(mut self, handler: impl Fn(u8, u8, u8) + Send + Sync + 'static) -> Self {
        self.note_on = Some(Arc::new(handler));
        self
    }

    pub fn on_poly_key_pressure(
        mut self,
        handler: impl Fn(u8, u8, u8) + Send + Sync + 'static,
    ) -> Self {
        self.poly_key_pressure = Some(Arc::new(handler));
        self
    }

    pub fn on_controller_change(
        mut self,
        handler: impl Fn(u8, u8, u8) + Send + Sync + 'static,
    ) -> Self {
        self.controller_change = Some(Arc::new(handler));
        self
    }

    pub fn on_program_change(mut self, handler: impl Fn(u8, u8) + Send + Sync + 'static) -> Self {
        self.program_change = Some(Arc::new(handler));
        self
    }

    pub fn on_channel_pressure(mut self, handler: impl Fn(u8, u8) + Send + Sync + 'static) -> Self {
        self.channel_pressure = Some(Arc::new(handler));
        self
    }

    pub fn on_pitch_bend(mut self, handler: impl Fn(i16, u8, u16) + Send + Sync + 'static) -> Self {
        self.pitch_bend = Some(Arc::new(handler));
        self
    }

    /// Restore the no-op default for one slot.
    pub fn clear(&mut self, kind: EventKind) {
        match kind {
            EventKind::NoteOff => self.note_off = None,
            EventKind::NoteOn => self.note_on = None,
            EventKind::PolyKeyPressure => self.poly_key_pressure = None,
            EventKind::ControllerChange => self.controller_change = None,
            EventKind::ProgramChange => self.program_change = None,
            EventKind::ChannelPressure => self.channel_pressure = None,
            EventKind::PitchBend => self.pitch_bend = None,
        }
    }

    pub fn is_assigned(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::NoteOff => self.note_off.is_some(),
            EventKind::NoteOn => self.note_on.is_some(),
            EventKind::PolyKeyPressure => self.poly_key_pressure.is_some(),
            EventKind::ControllerChange => self.controller_change.is_some(),
            EventKind::ProgramChange => self.program_change.is_some(),
            EventKind::ChannelPressure => self.channel_pressure.is_some(),
            EventKind::PitchBend => self.pitch_bend.is_some(),
        }
    }

    /// Call the slot matching `event`, if one is assigned.
    #[inline]
    pub fn invoke(&self, event: &MidiEvent) {
        match *event {
            MidiEvent::NoteOff {
                note,
                velocity,
                channel,
            } => {
                if let Some(handler) = &self.note_off {
                    handler(note, velocity, channel);
                }
            }
            MidiEvent::NoteOn {
                note,
                velocity,
                channel,
            } => {
                if let Some(handler) = &self.note_on {
                    handler(note, velocity, channel);
                }
            }
            MidiEvent::PolyKeyPressure {
                note,
                pressure,
                channel,
            } => {
                if let Some(handler) = &self.poly_key_pressure {
                    handler(note, pressure, channel);
                }
            }
            MidiEvent::ControllerChange {
                controller,
                value,
                channel,
            } => {
                if let Some(handler) = &self.controller_change {
                    handler(controller, value, channel);
                }
            }
            MidiEvent::ProgramChange { program, channel } => {
                if let Some(handler) = &self.program_change {
                    handler(program, channel);
                }
            }
            MidiEvent::ChannelPressure { pressure, channel } => {
                if let Some(handler) = &self.channel_pressure {
                    handler(pressure, channel);
                }
            }
            MidiEvent::PitchBend {
                bend,
                channel,
                raw14,
            } => {
                if let Some(handler) = &self.pitch_bend {
                    handler(bend, channel, raw14);
                }
            }
        }
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let assigned: Vec<EventKind> = EventKind::ALL
            .into_iter()
            .filter(|kind| self.is_assigned(*kind))
            .collect();
        f.debug_struct("HandlerTable")
            .field("assigned", &assigned)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_default_table_is_all_noop() {
        let table = HandlerTable::new();
        for kind in EventKind::ALL {
            assert!(!table.is_assigned(kind));
        }
        // Must not panic
        table.invoke(&MidiEvent::note_on(0, 60, 100));
        table.invoke(&MidiEvent::pitch_bend(0, 0));
    }

    #[test]
    fn test_invoke_routes_to_matching_slot() {
        let calls = Arc::new(Mutex::new(Vec::new()));

        let on = calls.clone();
        let off = calls.clone();
        let table = HandlerTable::new()
            .on_note_on(move |n, v, c| on.lock().push(("on", n, v, c)))
            .on_note_off(move |n, v, c| off.lock().push(("off", n, v, c)));

        table.invoke(&MidiEvent::note_on(2, 60, 100));
        table.invoke(&MidiEvent::note_off(2, 60, 30));
        // No slot assigned for CC
        table.invoke(&MidiEvent::controller_change(0, 7, 1));

        assert_eq!(
            *calls.lock(),
            vec![("on", 60, 100, 2), ("off", 60, 30, 2)]
        );
    }

    #[test]
    fn test_pitch_bend_slot_receives_signed_and_raw() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let table = HandlerTable::new().on_pitch_bend(move |bend, channel, raw14| {
            *sink.lock() = Some((bend, channel, raw14));
        });

        table.invoke(&MidiEvent::pitch_bend(4, 8192 + 100));
        assert_eq!(*seen.lock(), Some((100, 4, 8292)));
    }

    #[test]
    fn test_clear_restores_noop() {
        let count = Arc::new(Mutex::new(0));
        let counter = count.clone();
        let mut table = HandlerTable::new().on_program_change(move |_, _| *counter.lock() += 1);

        table.invoke(&MidiEvent::program_change(0, 1));
        assert!(table.is_assigned(EventKind::ProgramChange));

        table.clear(EventKind::ProgramChange);
        table.invoke(&MidiEvent::program_change(0, 1));

        assert!(!table.is_assigned(EventKind::ProgramChange));
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_debug_lists_assigned_slots() {
        let table = HandlerTable::new().on_channel_pressure(|_, _| {});
        let debug = format!("{:?}", table);
        assert!(debug.contains("ChannelPressure"));
        assert!(!debug.contains("NoteOn"));
    }
}
