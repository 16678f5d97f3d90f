//! Decode-and-dispatch front end shared by every input source.
//!
//! RT-safe dispatch: one lock-free table load per message, no allocation.
//! Handler updates build a new table and swap it in (read-copy-update), so
//! they never block a dispatch in flight on another thread.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::event::{EventKind, MidiEvent};
use crate::handler::HandlerTable;

pub struct MidiParser {
    handlers: ArcSwap<HandlerTable>,
}

impl MidiParser {
    pub fn new() -> Self {
        Self::with_handlers(HandlerTable::default())
    }

    pub fn with_handlers(handlers: HandlerTable) -> Self {
        Self {
            handlers: ArcSwap::from_pointee(handlers),
        }
    }

    /// Decode `bytes` and invoke exactly one handler slot.
    ///
    /// Returns the kind that was dispatched, or `None` when the message was
    /// ignored (system message, unknown status, truncated message). Ignored
    /// messages are never reported as errors.
    #[inline]
    pub fn dispatch(&self, bytes: &[u8]) -> Option<EventKind> {
        let event = MidiEvent::decode(bytes)?;
        self.handlers.load().invoke(&event);
        Some(event.kind())
    }

    /// Dispatch an already-decoded event.
    #[inline]
    pub fn dispatch_event(&self, event: &MidiEvent) {
        self.handlers.load().invoke(event);
    }

    /// Snapshot of the current table.
    pub fn handlers(&self) -> Arc<HandlerTable> {
        self.handlers.load_full()
    }

    /// Replace the whole table.
    pub fn set_handlers(&self, handlers: HandlerTable) {
        self.handlers.store(Arc::new(handlers));
    }

    pub fn on_note_off(&self, handler: impl Fn(u8, u8, u8) + Send + Sync + 'static) -> &Self {
        let handler: crate::NoteHandler = Arc::new(handler);
        self.update(|table| table.note_off = Some(handler.clone()));
        self
    }

    pub fn on_note_on(&self, handler: impl Fn(u8, u8, u8) + Send + Sync + 'static) -> &Self {
        let handler: crate::NoteHandler = Arc::new(handler);
        self.update(|table| table.note_on = Some(handler.clone()));
        self
    }

    pub fn on_poly_key_pressure(
        &self,
        handler: impl Fn(u8, u8, u8) + Send + Sync + 'static,
    ) -> &Self {
        let handler: crate::NoteHandler = Arc::new(handler);
        self.update(|table| table.poly_key_pressure = Some(handler.clone()));
        self
    }

    pub fn on_controller_change(
        &self,
        handler: impl Fn(u8, u8, u8) + Send + Sync + 'static,
    ) -> &Self {
        let handler: crate::ControllerHandler = Arc::new(handler);
        self.update(|table| table.controller_change = Some(handler.clone()));
        self
    }

    pub fn on_program_change(&self, handler: impl Fn(u8, u8) + Send + Sync + 'static) -> &Self {
        let handler: crate::ValueHandler = Arc::new(handler);
        self.update(|table| table.program_change = Some(handler.clone()));
        self
    }

    pub fn on_channel_pressure(&self, handler: impl Fn(u8, u8) + Send + Sync + 'static) -> &Self {
        let handler: crate::ValueHandler = Arc::new(handler);
        self.update(|table| table.channel_pressure = Some(handler.clone()));
        self
    }

    pub fn on_pitch_bend(&self, handler: impl Fn(i16, u8, u16) + Send + Sync + 'static) -> &Self {
        let handler: crate::PitchBendHandler = Arc::new(handler);
        self.update(|table| table.pitch_bend = Some(handler.clone()));
        self
    }

    pub fn clear_handler(&self, kind: EventKind) {
        self.update(|table| table.clear(kind));
    }

    pub fn clear_handlers(&self) {
        self.set_handlers(HandlerTable::default());
    }

    pub fn is_assigned(&self, kind: EventKind) -> bool {
        self.handlers.load().is_assigned(kind)
    }

    fn update(&self, apply: impl Fn(&mut HandlerTable)) {
        self.handlers.rcu(|current| {
            let mut next = HandlerTable::clone(current);
            apply(&mut next);
            next
        });
    }
}

impl Default for MidiParser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MidiParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MidiParser")
            .field("handlers", &**self.handlers.load())
            .finish()
    }
}
