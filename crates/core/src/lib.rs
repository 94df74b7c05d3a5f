//! Core types for the deckbridge mapping engine.
//!
//! This crate holds the vocabulary shared between the wire side and the
//! host side: raw MIDI messages coming in, device-independent actions
//! going out. It does no parsing and no I/O.

pub use action::{Action, OutputIntent, PressControl, ValueControl};
pub use midi::{MessageError, MidiKind, MidiMessage};

mod action;
mod midi;
