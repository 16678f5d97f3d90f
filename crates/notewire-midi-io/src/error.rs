//! Error types for the MIDI input subsystem.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("MIDI access denied: {0}")]
    AccessDenied(String),

    #[error("MIDI subsystem unavailable: {0}")]
    Unavailable(String),

    /// Access was requested once and failed. The system never retries.
    #[error("MIDI access failed earlier; build a new MidiSystem to try again")]
    Inert,

    #[error("MIDI port error: {0}")]
    MidiPort(String),

    #[error("MIDI device error: {0}")]
    MidiDevice(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Access-tier failures make a `MidiSystem` permanently inert.
    pub fn is_access_failure(&self) -> bool {
        matches!(
            self,
            Error::AccessDenied(_) | Error::Unavailable(_) | Error::Inert
        )
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::Unavailable(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiInput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        Error::MidiPort(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
