//! Wire-level MIDI message type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for malformed wire packets.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("empty MIDI packet")]
    Empty,

    #[error("MIDI packet carries {0} data byte(s), expected at least 2")]
    TooShort(usize),
}

/// Broad classification of a message by its status nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiKind {
    NoteOff,
    NoteOn,
    ControlChange,
    Other,
}

/// A raw MIDI controller message: one status byte plus the data bytes
/// that followed it (usually two: an identifier byte and a value byte).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiMessage {
    pub status: u8,
    pub data: Vec<u8>,
}

impl MidiMessage {
    pub fn new(status: u8, data: Vec<u8>) -> Self {
        Self { status, data }
    }

    /// Splits a raw packet into status byte and data bytes.
    ///
    /// Packets with fewer than two data bytes cannot carry an identifier
    /// and a value and are rejected here.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        match bytes {
            [] => Err(MessageError::Empty),
            [_, data @ ..] if data.len() < 2 => Err(MessageError::TooShort(data.len())),
            [status, data @ ..] => Ok(Self {
                status: *status,
                data: data.to_vec(),
            }),
        }
    }

    /// The channel encoded in the low nibble of the status byte.
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }

    pub fn kind(&self) -> MidiKind {
        match self.status & 0xF0 {
            0x80 => MidiKind::NoteOff,
            0x90 => MidiKind::NoteOn,
            0xB0 => MidiKind::ControlChange,
            _ => MidiKind::Other,
        }
    }
}
