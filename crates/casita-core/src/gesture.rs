//! Classified button gestures

use serde::{Deserialize, Serialize};
use std::fmt;

/// A semantic gesture classified from a button's raw press/release edges
///
/// Gestures are ephemeral: produced by the classifier, handed to the
/// registered listener, and discarded. The serialized names match the
/// values the lighting bridge ecosystem uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gesture {
    SingleClick,
    DoubleClick,
    LongPress,
}

impl Gesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::SingleClick => "SINGLE_CLICK",
            Gesture::DoubleClick => "DOUBLE_CLICK",
            Gesture::LongPress => "LONG_PRESS",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
