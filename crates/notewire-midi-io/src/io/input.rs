//! midir-backed platform access.
//!
//! All midir objects live on one dedicated thread for platform
//! thread-safety. The thread is driven by commands; between commands it
//! re-enumerates ports and publishes topology changes, since midir has no
//! hot-plug notification of its own.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort};
use tracing::debug;

use crate::backend::{MessageConsumer, MidiAccess, MidiBackend};
use crate::error::{Error, Result};
use crate::port::{PortInfo, PortState, SourceId};
use crate::topology::{TopologyEvent, TopologyPublisher, TopologySubscription};

const CONNECTION_NAME: &str = "notewire-input";

/// Commands sent to the MIDI thread
enum MidiCommand {
    Inputs(Sender<Vec<PortInfo>>),
    Attach {
        source: SourceId,
        consumer: Arc<dyn MessageConsumer>,
        reply: Sender<Result<()>>,
    },
    Subscribe(Sender<TopologySubscription>),
    Shutdown,
}

pub struct MidirBackend {
    client_name: String,
    poll_interval: Duration,
}

impl MidirBackend {
    pub fn new(client_name: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            client_name: client_name.into(),
            poll_interval,
        }
    }
}

impl MidiBackend for MidirBackend {
    fn name(&self) -> &str {
        "midir"
    }

    fn request_access(&mut self) -> Result<Box<dyn MidiAccess>> {
        let (command_sender, command_receiver) = bounded(64);
        let (ready_sender, ready_receiver) = bounded(1);
        let client_name = self.client_name.clone();
        let poll_interval = self.poll_interval;

        thread::Builder::new()
            .name("notewire-midi-input".to_string())
            .spawn(move || {
                midi_thread(client_name, poll_interval, command_receiver, ready_sender);
            })?;

        ready_receiver
            .recv()
            .map_err(|_| Error::Unavailable("MIDI thread exited during startup".to_string()))??;

        Ok(Box::new(MidirAccess { command_sender }))
    }
}

struct MidirAccess {
    command_sender: Sender<MidiCommand>,
}

impl MidirAccess {
    fn request<T>(&self, command: impl FnOnce(Sender<T>) -> MidiCommand) -> Result<T> {
        let (reply, response) = bounded(1);
        self.command_sender
            .send(command(reply))
            .map_err(|_| Error::MidiDevice("MIDI thread not running".to_string()))?;
        response
            .recv()
            .map_err(|_| Error::MidiDevice("MIDI thread not running".to_string()))
    }
}

impl MidiAccess for MidirAccess {
    fn inputs(&self) -> Vec<PortInfo> {
        self.request(MidiCommand::Inputs).unwrap_or_default()
    }

    fn attach(&mut self, source: &SourceId, consumer: Arc<dyn MessageConsumer>) -> Result<()> {
        let source = source.clone();
        self.request(|reply| MidiCommand::Attach {
            source,
            consumer,
            reply,
        })?
    }

    fn subscribe(&mut self) -> TopologySubscription {
        match self.request(MidiCommand::Subscribe) {
            Ok(subscription) => subscription,
            // Thread gone: hand out a subscription that never fires
            Err(_) => TopologyPublisher::default().subscribe(),
        }
    }
}

impl Drop for MidirAccess {
    fn drop(&mut self) {
        let _ = self.command_sender.send(MidiCommand::Shutdown);
    }
}

fn midi_thread(
    client_name: String,
    poll_interval: Duration,
    command_receiver: Receiver<MidiCommand>,
    ready: Sender<Result<()>>,
) {
    let scanner = match MidiInput::new(&client_name) {
        Ok(scanner) => scanner,
        Err(e) => {
            let _ = ready.send(Err(e.into()));
            return;
        }
    };
    let mut known = scan_inputs(&scanner);
    let _ = ready.send(Ok(()));

    let mut connections: ConnectionTable<MidiInputConnection<()>> = ConnectionTable::default();
    let mut topology = TopologyPublisher::default();

    loop {
        match command_receiver.recv_timeout(poll_interval) {
            Ok(MidiCommand::Inputs(reply)) => {
                refresh(&scanner, &mut known, &mut topology, &mut connections);
                let _ = reply.send(known.clone());
            }
            Ok(MidiCommand::Attach {
                source,
                consumer,
                reply,
            }) => {
                let result = connections.attach(source, consumer, |source, consumer| {
                    connect_input(&client_name, source, consumer)
                });
                let _ = reply.send(result);
            }
            Ok(MidiCommand::Subscribe(reply)) => {
                let _ = reply.send(topology.subscribe());
            }
            Ok(MidiCommand::Shutdown) => break,
            Err(RecvTimeoutError::Timeout) => {
                refresh(&scanner, &mut known, &mut topology, &mut connections);
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!("MIDI input thread exiting, closing {} connections", connections.len());
}

/// Open connections, at most one per source.
struct ConnectionTable<C> {
    open: HashMap<SourceId, (Arc<dyn MessageConsumer>, C)>,
}

impl<C> Default for ConnectionTable<C> {
    fn default() -> Self {
        Self {
            open: HashMap::new(),
        }
    }
}

impl<C> ConnectionTable<C> {
    /// Route `source` to `consumer`. A source already routed to the same
    /// consumer keeps its connection; a different consumer replaces it, and
    /// the old connection is closed before the new one opens.
    fn attach(
        &mut self,
        source: SourceId,
        consumer: Arc<dyn MessageConsumer>,
        connect: impl FnOnce(&SourceId, Arc<dyn MessageConsumer>) -> Result<C>,
    ) -> Result<()> {
        if let Some((current, _)) = self.open.get(&source) {
            if Arc::ptr_eq(current, &consumer) {
                return Ok(());
            }
        }
        self.open.remove(&source);

        let connection = connect(&source, Arc::clone(&consumer))?;
        self.open.insert(source, (consumer, connection));
        Ok(())
    }

    /// Close connections to sources missing from `present`.
    fn retain_present(&mut self, present: &[PortInfo]) {
        self.open
            .retain(|source, _| present.iter().any(|port| &port.id == source));
    }

    fn len(&self) -> usize {
        self.open.len()
    }
}

/// Source ids for ports in enumeration order: the port name, with ` #2`,
/// ` #3` and so on appended to repeated names.
fn source_ids(names: &[String]) -> Vec<SourceId> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    names
        .iter()
        .map(|name| {
            let count = seen.entry(name.as_str()).or_insert(0);
            *count += 1;
            if *count == 1 {
                SourceId::new(name.clone())
            } else {
                SourceId::new(format!("{} #{}", name, count))
            }
        })
        .collect()
}

fn enumerate(midi_input: &MidiInput) -> Vec<(PortInfo, MidiInputPort)> {
    let ports = midi_input.ports();
    let names: Vec<String> = ports
        .iter()
        .enumerate()
        .map(|(index, port)| {
            midi_input
                .port_name(port)
                .unwrap_or_else(|_| format!("MIDI Input {}", index))
        })
        .collect();
    let ids = source_ids(&names);

    ports
        .into_iter()
        .zip(ids.into_iter().zip(names))
        .map(|(port, (id, name))| (PortInfo::input(id, name), port))
        .collect()
}

fn scan_inputs(scanner: &MidiInput) -> Vec<PortInfo> {
    enumerate(scanner).into_iter().map(|(info, _)| info).collect()
}

/// Re-enumerate and publish what changed since the last scan.
fn refresh<C>(
    scanner: &MidiInput,
    known: &mut Vec<PortInfo>,
    topology: &mut TopologyPublisher,
    connections: &mut ConnectionTable<C>,
) {
    let current = scan_inputs(scanner);
    connections.retain_present(&current);

    for port in known.iter() {
        if !current.iter().any(|p| p.id == port.id) {
            debug!("MIDI input removed {}: {}", port.id, port.name);
            topology.publish(TopologyEvent::Disconnected(
                port.clone().with_state(PortState::Disconnected),
            ));
        }
    }
    for port in &current {
        if !known.iter().any(|p| p.id == port.id) {
            debug!("MIDI input added {}: {}", port.id, port.name);
            topology.publish(TopologyEvent::Connected(port.clone()));
        }
    }

    *known = current;
}

fn connect_input(
    client_name: &str,
    source: &SourceId,
    consumer: Arc<dyn MessageConsumer>,
) -> Result<MidiInputConnection<()>> {
    let mut midi_input = MidiInput::new(client_name)?;
    // SysEx, clock and active sensing are never decoded
    midi_input.ignore(Ignore::All);

    let port = enumerate(&midi_input)
        .into_iter()
        .find(|(info, _)| &info.id == source)
        .map(|(_, port)| port)
        .ok_or_else(|| Error::MidiPort(format!("MIDI input {} not found", source)))?;

    let connection = midi_input.connect(
        &port,
        CONNECTION_NAME,
        move |_timestamp, message, _| consumer.on_message(message),
        (),
    )?;

    Ok(connection)
}
