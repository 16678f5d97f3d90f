//! Borrowed view over a single raw MIDI message.
//!
//! Platforms hand over one message per notification as a byte slice of
//! length 1-3. Absent data bytes are reported as `None`; callers pick the
//! default that fits the message type.

/// Command nibbles (status & 0xF0) of the channel-voice messages.
pub mod status {
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const POLY_KEY_PRESSURE: u8 = 0xA0;
    pub const CONTROLLER_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    pub const CHANNEL_PRESSURE: u8 = 0xD0;
    pub const PITCH_BEND: u8 = 0xE0;
    /// System messages (SysEx, common, real-time). Never decoded.
    pub const SYSTEM: u8 = 0xF0;
}

const MAX_LEN: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawMessage<'a> {
    bytes: &'a [u8],
}

impl<'a> RawMessage<'a> {
    /// Bytes past the third are never read.
    #[inline]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes: &bytes[..bytes.len().min(MAX_LEN)],
        }
    }

    #[inline]
    pub fn status(&self) -> Option<u8> {
        self.bytes.first().copied()
    }

    /// High nibble of the status byte.
    #[inline]
    pub fn command(&self) -> Option<u8> {
        self.status().map(|s| s & 0xF0)
    }

    /// Low nibble of the status byte, 0-15.
    #[inline]
    pub fn channel(&self) -> Option<u8> {
        self.status().map(|s| s & 0x0F)
    }

    /// First data byte, masked to 7 bits.
    #[inline]
    pub fn data1(&self) -> Option<u8> {
        self.data(1)
    }

    /// Second data byte, masked to 7 bits.
    #[inline]
    pub fn data2(&self) -> Option<u8> {
        self.data(2)
    }

    #[inline]
    fn data(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).map(|b| b & 0x7F)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// True for status bytes 0x80-0xEF.
    #[inline]
    pub fn is_channel_voice(&self) -> bool {
        matches!(self.status(), Some(0x80..=0xEF))
    }
}

impl<'a> From<&'a [u8]> for RawMessage<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}
