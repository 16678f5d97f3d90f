//! MidiSystem builder for choosing a backend and initial handlers.

use std::time::Duration;

use notewire_midi::HandlerTable;

use crate::backend::MidiBackend;
use crate::error::{Error, Result};
use crate::VirtualMidi;

use super::MidiSystem;

pub const DEFAULT_CLIENT_NAME: &str = "notewire";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct MidiSystemBuilder {
    pub(super) backend: Option<Box<dyn MidiBackend>>,
    pub(super) client_name: String,
    pub(super) poll_interval: Duration,
    pub(super) watch_topology: bool,
    pub(super) handlers: HandlerTable,
}

impl Default for MidiSystemBuilder {
    fn default() -> Self {
        Self {
            backend: None,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            watch_topology: true,
            handlers: HandlerTable::default(),
        }
    }
}

impl MidiSystemBuilder {
    /// Use a specific backend instead of the platform default.
    pub fn backend(mut self, backend: impl MidiBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    /// Feed the system from an in-memory platform.
    pub fn virtual_backend(self, midi: VirtualMidi) -> Self {
        self.backend(midi)
    }

    /// Client name announced to the platform MIDI subsystem.
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// How often the hardware backend re-scans for hot-plugged devices.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Attach hot-plugged inputs from a background thread (default).
    ///
    /// With `false`, call [`MidiSystem::process_topology_events`] yourself.
    pub fn watch_topology(mut self, enabled: bool) -> Self {
        self.watch_topology = enabled;
        self
    }

    /// Handlers installed before any source is attached.
    pub fn handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn build(self) -> Result<MidiSystem> {
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "poll interval must be non-zero".to_string(),
            ));
        }

        let backend = match self.backend {
            Some(backend) => backend,
            None => default_backend(&self.client_name, self.poll_interval)?,
        };

        Ok(MidiSystem::from_parts(
            backend,
            self.handlers,
            self.watch_topology,
        ))
    }
}

#[cfg(feature = "midi-io")]
fn default_backend(client_name: &str, poll_interval: Duration) -> Result<Box<dyn MidiBackend>> {
    Ok(Box::new(crate::io::MidirBackend::new(
        client_name,
        poll_interval,
    )))
}

#[cfg(not(feature = "midi-io"))]
fn default_backend(_client_name: &str, _poll_interval: Duration) -> Result<Box<dyn MidiBackend>> {
    Err(Error::InvalidConfig(
        "no MIDI backend configured and the `midi-io` feature is disabled".to_string(),
    ))
}
