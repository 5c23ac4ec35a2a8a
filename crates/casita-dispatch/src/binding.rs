//! The static button-to-action configuration table

use casita_core::{ButtonId, Gesture};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a button does to its zone's device
///
/// A policy is a fixed mapping from gesture to command sequence; the
/// concrete sequences live in the dispatcher. Serialized names are the
/// snake_case variants used in the bindings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPolicy {
    /// Toggle the light on any gesture
    LightToggle,
    /// Turn the light on; double click first corrects the bridge's
    /// belief state
    LightOn,
    /// Turn the light off; double click first corrects the bridge's
    /// belief state
    LightOff,
    /// Toggle dim mode on a single click; other gestures are ignored
    LightDimMode,
    /// Run the fan at maximum speed on any gesture
    FanOn,
    /// Stop the fan on any gesture
    FanOff,
    /// Speed up one step; double click jumps to maximum
    FanSpeedUp,
    /// Slow down one step; double click zeroes the speed out
    FanSpeedDown,
}

impl ActionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionPolicy::LightToggle => "light_toggle",
            ActionPolicy::LightOn => "light_on",
            ActionPolicy::LightOff => "light_off",
            ActionPolicy::LightDimMode => "light_dim_mode",
            ActionPolicy::FanOn => "fan_on",
            ActionPolicy::FanOff => "fan_off",
            ActionPolicy::FanSpeedUp => "fan_speed_up",
            ActionPolicy::FanSpeedDown => "fan_speed_down",
        }
    }

    /// Whether this policy issues any commands for `gesture`
    ///
    /// Dim mode is the only policy that ignores gestures; a no-op skips
    /// device resolution and the settle delay entirely.
    pub fn reacts_to(&self, gesture: Gesture) -> bool {
        match self {
            ActionPolicy::LightDimMode => gesture == Gesture::SingleClick,
            _ => true,
        }
    }
}

impl fmt::Display for ActionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the button configuration table
///
/// Built once at startup from the settings file; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonBinding {
    /// Bridge-assigned button ID
    pub button_id: ButtonId,
    /// Zone whose lock serializes this binding's commands
    pub zone: String,
    /// Human-readable device name, resolved against the bridge at
    /// dispatch time
    pub device: String,
    /// Gesture-to-command mapping
    pub policy: ActionPolicy,
}
