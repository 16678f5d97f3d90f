//! Device topology change notifications.
//!
//! Backends publish one [`TopologyEvent`] per port that appears or goes away.
//! Consumers hold a [`TopologySubscription`], an explicit receiving end that
//! can be drained synchronously or waited on from a watcher thread.

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::port::PortInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyEvent {
    Connected(PortInfo),
    Disconnected(PortInfo),
}

impl TopologyEvent {
    pub fn port(&self) -> &PortInfo {
        match self {
            TopologyEvent::Connected(port) | TopologyEvent::Disconnected(port) => port,
        }
    }

    /// The only event the registry acts on.
    pub fn is_input_connected(&self) -> bool {
        matches!(self, TopologyEvent::Connected(port) if port.is_input())
    }
}

pub struct TopologySubscription {
    receiver: Receiver<TopologyEvent>,
}

impl TopologySubscription {
    pub fn try_next(&self) -> Option<TopologyEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<TopologyEvent, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// All events queued right now, oldest first.
    pub fn drain(&self) -> Vec<TopologyEvent> {
        self.receiver.try_iter().collect()
    }

    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl std::fmt::Debug for TopologySubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologySubscription")
            .field("pending", &self.receiver.len())
            .finish()
    }
}

/// Publishing side kept by a backend. Subscribers that were dropped are
/// pruned on the next publish.
#[derive(Default)]
pub(crate) struct TopologyPublisher {
    subscribers: Vec<Sender<TopologyEvent>>,
}

impl TopologyPublisher {
    pub(crate) fn subscribe(&mut self) -> TopologySubscription {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        TopologySubscription { receiver }
    }

    pub(crate) fn publish(&mut self, event: TopologyEvent) {
        self.subscribers
            .retain(|sender| sender.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
