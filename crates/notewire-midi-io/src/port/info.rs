use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a MIDI port, stable across rescans. Hardware ports use
/// their name, suffixed when several ports share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortType {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortState {
    Connected,
    Disconnected,
}

/// Description of a platform port. The platform owns the port itself;
/// this is only a snapshot of what it reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    pub id: SourceId,
    pub name: String,
    pub manufacturer: Option<String>,
    pub port_type: PortType,
    pub state: PortState,
}

impl PortInfo {
    pub fn input(id: impl Into<SourceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            manufacturer: None,
            port_type: PortType::Input,
            state: PortState::Connected,
        }
    }

    pub fn output(id: impl Into<SourceId>, name: impl Into<String>) -> Self {
        Self {
            port_type: PortType::Output,
            ..Self::input(id, name)
        }
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_state(mut self, state: PortState) -> Self {
        self.state = state;
        self
    }

    #[inline]
    pub fn is_input(&self) -> bool {
        self.port_type == PortType::Input
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state == PortState::Connected
    }
}
