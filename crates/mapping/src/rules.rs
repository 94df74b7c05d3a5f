//! Built-in declarative translation rules.
//!
//! When a binding is not a script binding, the dispatcher translates it
//! with this fixed table. First match wins; a key the table does not know
//! yields no action at all, which keeps partially mapped controllers
//! usable instead of erroring on every unmapped fader.

use deckbridge_core::{Action, PressControl, ValueControl};

/// Extracts the 1-based deck number from an embedded `[ChannelN]` pattern.
///
/// Works on plain channel groups (`[Channel2]`) as well as groups that
/// embed one, such as `[EqualizerRack_[Channel2]_Effect1]`. Global groups
/// like `[Master]` yield `None`.
pub fn deck_from_group(group: &str) -> Option<u8> {
    let start = group.find("[Channel")? + "[Channel".len();
    let rest = &group[start..];
    let end = rest.find(']')?;
    rest[..end].parse().ok()
}

/// Normalizes a 7-bit value byte to `[0, 1]`.
pub fn normalize(raw: u8) -> f64 {
    f64::from(raw) / 127.0
}

/// The key-to-control mapping for continuous controls.
///
/// Shared between the rule table and the script bridge's `setValue`
/// translation so both directions agree on what a key means.
pub fn value_control_for(group: &str, key: &str) -> Option<ValueControl> {
    match key {
        "volume" => Some(ValueControl::Volume),
        "pregain" => Some(ValueControl::Gain),
        "crossfader" => Some(ValueControl::Crossfader),
        "rate" => Some(ValueControl::Rate),
        "parameter1" if group.contains("EqualizerRack") => Some(ValueControl::Lows),
        "parameter2" if group.contains("EqualizerRack") => Some(ValueControl::Mids),
        "parameter3" if group.contains("EqualizerRack") => Some(ValueControl::Highs),
        _ => None,
    }
}

/// Builds the value action for a `setValue`-style call, with the same
/// group-to-deck and key-to-control mapping the rule table uses.
pub fn value_action(group: &str, key: &str, value: f64) -> Option<Action> {
    let control = value_control_for(group, key)?;
    // The crossfader is a global control even when a mapping scopes it to
    // a channel group.
    let deck = if control == ValueControl::Crossfader {
        None
    } else {
        deck_from_group(group)
    };
    Some(Action::Value {
        control,
        value,
        deck,
    })
}

fn press_control_for(key: &str) -> Option<PressControl> {
    match key {
        "play" => Some(PressControl::Play),
        "cue_default" => Some(PressControl::Cue),
        "start_stop" => Some(PressControl::StopAtStart),
        "loop_halve" => Some(PressControl::LoopResize { factor: 0.5 }),
        "loop_double" => Some(PressControl::LoopResize { factor: 2.0 }),
        "beatloop_activate" => Some(PressControl::LoopToggle { beats: None }),
        "sync_enabled" => Some(PressControl::Sync),
        _ => beatloop_toggle_beats(key).map(|beats| PressControl::LoopToggle { beats: Some(beats) }),
    }
}

/// Matches `beatloop_<N>_toggle` keys; `N` may be fractional (`0.5`).
fn beatloop_toggle_beats(key: &str) -> Option<f64> {
    key.strip_prefix("beatloop_")?
        .strip_suffix("_toggle")?
        .parse()
        .ok()
        .filter(|beats: &f64| beats.is_finite() && *beats > 0.0)
}

/// Applies the rule table to a resolved binding.
pub fn translate(group: &str, key: &str, down: bool, value: f64) -> Option<Action> {
    if let Some(control) = press_control_for(key) {
        return Some(Action::Press {
            control,
            down,
            deck: deck_from_group(group),
        });
    }
    value_action(group, key, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_from_group() {
        assert_eq!(deck_from_group("[Channel1]"), Some(1));
        assert_eq!(deck_from_group("[Channel12]"), Some(12));
        assert_eq!(
            deck_from_group("[EqualizerRack1_[Channel3]_Effect1]"),
            Some(3)
        );
        assert_eq!(deck_from_group("[Master]"), None);
        assert_eq!(deck_from_group("[Channel]"), None);
        assert_eq!(deck_from_group("no brackets"), None);
    }

    #[test]
    fn test_press_keys() {
        let cases = [
            ("play", PressControl::Play),
            ("cue_default", PressControl::Cue),
            ("start_stop", PressControl::StopAtStart),
            ("loop_halve", PressControl::LoopResize { factor: 0.5 }),
            ("loop_double", PressControl::LoopResize { factor: 2.0 }),
            ("beatloop_activate", PressControl::LoopToggle { beats: None }),
            ("sync_enabled", PressControl::Sync),
        ];
        for (key, expected) in cases {
            let action = translate("[Channel1]", key, true, 1.0).unwrap();
            assert_eq!(
                action,
                Action::Press {
                    control: expected,
                    down: true,
                    deck: Some(1),
                },
                "key {key}"
            );
        }
    }

    #[test]
    fn test_value_keys() {
        let action = translate("[Channel2]", "volume", true, 0.25).unwrap();
        assert_eq!(
            action,
            Action::Value {
                control: ValueControl::Volume,
                value: 0.25,
                deck: Some(2),
            }
        );

        let action = translate("[Channel2]", "pregain", true, 1.0).unwrap();
        assert!(matches!(
            action,
            Action::Value {
                control: ValueControl::Gain,
                ..
            }
        ));

        let action = translate("[Channel1]", "rate", true, 0.5).unwrap();
        assert!(matches!(
            action,
            Action::Value {
                control: ValueControl::Rate,
                deck: Some(1),
                ..
            }
        ));
    }

    #[test]
    fn test_crossfader_is_global() {
        // Even a channel-scoped crossfader binding yields no deck.
        let action = translate("[Channel1]", "crossfader", true, 0.5).unwrap();
        assert_eq!(
            action,
            Action::Value {
                control: ValueControl::Crossfader,
                value: 0.5,
                deck: None,
            }
        );
    }

    #[test]
    fn test_equalizer_parameters() {
        let group = "[EqualizerRack1_[Channel1]_Effect1]";
        let expected = [
            ("parameter1", ValueControl::Lows),
            ("parameter2", ValueControl::Mids),
            ("parameter3", ValueControl::Highs),
        ];
        for (key, control) in expected {
            let action = translate(group, key, true, 0.5).unwrap();
            assert_eq!(
                action,
                Action::Value {
                    control,
                    value: 0.5,
                    deck: Some(1),
                },
                "key {key}"
            );
        }
        // parameterN outside an EqualizerRack group is unmapped.
        assert_eq!(translate("[Channel1]", "parameter2", true, 0.5), None);
    }

    #[test]
    fn test_beatloop_toggle_pattern() {
        let action = translate("[Channel1]", "beatloop_4_toggle", true, 1.0).unwrap();
        assert_eq!(
            action,
            Action::Press {
                control: PressControl::LoopToggle { beats: Some(4.0) },
                down: true,
                deck: Some(1),
            }
        );

        let action = translate("[Channel1]", "beatloop_0.5_toggle", true, 1.0).unwrap();
        assert!(matches!(
            action,
            Action::Press {
                control: PressControl::LoopToggle { beats: Some(b) },
                ..
            } if (b - 0.5).abs() < f64::EPSILON
        ));

        assert_eq!(translate("[Channel1]", "beatloop_x_toggle", true, 1.0), None);
        assert_eq!(translate("[Channel1]", "beatloop__toggle", true, 1.0), None);
        assert_eq!(
            translate("[Channel1]", "beatloop_inf_toggle", true, 1.0),
            None
        );
    }

    #[test]
    fn test_unmapped_key_yields_nothing() {
        assert_eq!(translate("[Channel1]", "frobnicate", true, 1.0), None);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(0), 0.0);
        assert_eq!(normalize(127), 1.0);
        assert!((normalize(64) - 0.5039).abs() < 0.0001);
    }
}
