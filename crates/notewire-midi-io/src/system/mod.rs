//! MIDI input system: one parser, any number of hot-pluggable sources.
//!
//! ## Quick Start
//!
//! ```ignore
//! use notewire_midi_io::MidiSystem;
//!
//! let midi = MidiSystem::builder().build()?;
//!
//! midi.on_note_on(|note, velocity, channel| { /* start a voice */ })
//!     .on_note_off(|note, _velocity, channel| { /* stop a voice */ });
//!
//! // One-shot access request; attaches every input and watches for hot-plug
//! midi.initialize()?;
//! ```

mod builder;
mod watcher;

pub use builder::MidiSystemBuilder;

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use notewire_midi::{EventKind, HandlerTable, MidiParser};
use parking_lot::{Mutex, RwLock};
use tracing::{error, info};

use crate::backend::{MessageConsumer, MidiBackend};
use crate::error::{Error, Result};
use crate::port::{DeviceRegistry, PortInfo};
use crate::topology::TopologySubscription;
use watcher::TopologyWatcher;

/// Outcome of the access request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessState {
    /// `initialize` has not run yet.
    Pending,
    Granted,
    /// Terminal. The system stays inert.
    Failed(String),
}

/// Complete MIDI input system - the main entry point for notewire-midi-io.
///
/// Owns the shared parser and, once access is granted, the device registry.
/// Clone is cheap (Arc internally).
#[derive(Clone)]
pub struct MidiSystem {
    inner: Arc<MidiSystemInner>,
}

struct MidiSystemInner {
    parser: Arc<MidiParser>,
    /// Taken by the single access request.
    backend: Mutex<Option<Box<dyn MidiBackend>>>,
    state: RwLock<AccessState>,
    registry: ArcSwapOption<DeviceRegistry>,
    watch_topology: bool,
    /// Held here when no watcher thread drains it.
    subscription: Mutex<Option<TopologySubscription>>,
    watcher: Mutex<Option<TopologyWatcher>>,
}

impl MidiSystem {
    pub fn builder() -> MidiSystemBuilder {
        MidiSystemBuilder::default()
    }

    pub(crate) fn from_parts(
        backend: Box<dyn MidiBackend>,
        handlers: HandlerTable,
        watch_topology: bool,
    ) -> Self {
        Self {
            inner: Arc::new(MidiSystemInner {
                parser: Arc::new(MidiParser::with_handlers(handlers)),
                backend: Mutex::new(Some(backend)),
                state: RwLock::new(AccessState::Pending),
                registry: ArcSwapOption::empty(),
                watch_topology,
                subscription: Mutex::new(None),
                watcher: Mutex::new(None),
            }),
        }
    }

    // ==================== Access ====================

    /// Request platform access, attach every current input and start
    /// watching for hot-plugged ones.
    ///
    /// The request is made at most once. A failure is logged once, returned,
    /// and leaves the system inert: later calls return [`Error::Inert`].
    /// Calling again after success does nothing.
    pub fn initialize(&self) -> Result<()> {
        let mut backend_slot = self.inner.backend.lock();

        match &*self.inner.state.read() {
            AccessState::Granted => return Ok(()),
            AccessState::Failed(_) => return Err(Error::Inert),
            AccessState::Pending => {}
        }
        let mut backend = backend_slot.take().ok_or(Error::Inert)?;

        let access = backend.request_access().map_err(|e| self.fail(e))?;
        info!("MIDI access granted ({} backend)", backend.name());

        let consumer: Arc<dyn MessageConsumer> = self.inner.parser.clone();
        let registry = Arc::new(DeviceRegistry::new(access, consumer));

        // Subscribe before attaching so nothing plugged in meanwhile is missed
        let subscription = registry.subscribe();
        let attached = registry.attach_all();
        info!("Attached {} MIDI input(s)", attached);

        if self.inner.watch_topology {
            let watcher = TopologyWatcher::spawn(Arc::clone(&registry), subscription)
                .map_err(|e| self.fail(e))?;
            *self.inner.watcher.lock() = Some(watcher);
        } else {
            *self.inner.subscription.lock() = Some(subscription);
        }

        self.inner.registry.store(Some(registry));
        *self.inner.state.write() = AccessState::Granted;
        Ok(())
    }

    /// Report `e` once and make the system inert.
    fn fail(&self, e: Error) -> Error {
        error!("Failed to access MIDI devices: {}", e);
        *self.inner.state.write() = AccessState::Failed(e.to_string());
        e
    }

    pub fn state(&self) -> AccessState {
        self.inner.state.read().clone()
    }

    /// True once access is granted.
    pub fn is_ready(&self) -> bool {
        *self.inner.state.read() == AccessState::Granted
    }

    pub fn is_inert(&self) -> bool {
        matches!(*self.inner.state.read(), AccessState::Failed(_))
    }

    // ==================== Devices ====================

    pub fn registry(&self) -> Option<Arc<DeviceRegistry>> {
        self.inner.registry.load_full()
    }

    /// Inputs seen since access was granted. Empty before that.
    pub fn list_inputs(&self) -> Vec<PortInfo> {
        self.registry()
            .map(|registry| registry.sources())
            .unwrap_or_default()
    }

    /// Handle queued topology events on the calling thread.
    ///
    /// Only does work when the system was built with
    /// `watch_topology(false)`; otherwise the watcher thread handles them.
    pub fn process_topology_events(&self) -> usize {
        let subscription = self.inner.subscription.lock();
        match (self.registry(), subscription.as_ref()) {
            (Some(registry), Some(subscription)) => registry.process_pending(subscription),
            _ => 0,
        }
    }

    // ==================== Handlers ====================

    pub fn parser(&self) -> &Arc<MidiParser> {
        &self.inner.parser
    }

    pub fn on_note_off(&self, handler: impl Fn(u8, u8, u8) + Send + Sync + 'static) -> &Self {
        self.inner.parser.on_note_off(handler);
        self
    }

    pub fn on_note_on(&self, handler: impl Fn(u8, u8, u8) + Send + Sync + 'static) -> &Self {
        self.inner.parser.on_note_on(handler);
        self
    }

    pub fn on_poly_key_pressure(
        &self,
        handler: impl Fn(u8, u8, u8) + Send + Sync + 'static,
    ) -> &Self {
        self.inner.parser.on_poly_key_pressure(handler);
        self
    }

    pub fn on_controller_change(
        &self,
        handler: impl Fn(u8, u8, u8) + Send + Sync + 'static,
    ) -> &Self {
        self.inner.parser.on_controller_change(handler);
        self
    }

    pub fn on_program_change(&self, handler: impl Fn(u8, u8) + Send + Sync + 'static) -> &Self {
        self.inner.parser.on_program_change(handler);
        self
    }

    pub fn on_channel_pressure(&self, handler: impl Fn(u8, u8) + Send + Sync + 'static) -> &Self {
        self.inner.parser.on_channel_pressure(handler);
        self
    }

    pub fn on_pitch_bend(&self, handler: impl Fn(i16, u8, u16) + Send + Sync + 'static) -> &Self {
        self.inner.parser.on_pitch_bend(handler);
        self
    }

    pub fn clear_handler(&self, kind: EventKind) {
        self.inner.parser.clear_handler(kind);
    }
}

impl std::fmt::Debug for MidiSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiSystem")
            .field("state", &*self.inner.state.read())
            .field("registry", &self.inner.registry.load_full())
            .field("parser", &self.inner.parser)
            .finish()
    }
}
