//! Device-independent action model.
//!
//! Actions are the sole interface between the mapping engine and the host
//! application: every incoming wire message translates into zero or more
//! of these. The serde representation matches the JSON shape hosts
//! consume, e.g. `{"type":"value","control":{"type":"volume"},
//! "value":0.5,"deck":1}`.

use serde::{Deserialize, Serialize};

/// A continuous control addressed by a value action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ValueControl {
    Crossfader,
    Volume,
    Gain,
    Lows,
    Mids,
    Highs,
    HeadphoneMix,
    Sampler,
    Rate,
}

/// A momentary control addressed by a press action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PressControl {
    Play,
    Cue,
    StopAtStart,
    Slip,
    Sync,
    HeadphoneCue,
    HotCue {
        index: u8,
    },
    Roll {
        beats: f64,
    },
    Jump {
        beats: f64,
    },
    LoopToggle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        beats: Option<f64>,
    },
    LoopResize {
        factor: f64,
    },
}

/// An action to be taken by the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// A fader, knob or similar moved to an absolute position.
    Value {
        control: ValueControl,
        /// Normalized position in `[0, 1]`.
        value: f64,
        /// 1-based deck number; `None` for global controls.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deck: Option<u8>,
    },
    /// A button pressed or released.
    Press {
        control: PressControl,
        down: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deck: Option<u8>,
    },
}

/// An intent for the outgoing (host to device) direction.
///
/// Mirrors [`Action`]. Nothing consumes these yet; the type exists so the
/// dispatcher can already expose the outgoing interface shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutputIntent {
    Value {
        control: ValueControl,
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deck: Option<u8>,
    },
    Press {
        control: PressControl,
        down: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deck: Option<u8>,
    },
}
