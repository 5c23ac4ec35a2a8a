//! Button identity and raw edge events from the lighting bridge

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier the upstream lighting bridge assigns to a physical
/// button (e.g. `"126"` for one key of a Pico remote).
///
/// The hub never interprets the value; it is only used as a map key and in
/// log output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonId(String);

impl ButtonId {
    /// Create a button ID from the bridge-assigned value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw bridge-assigned value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ButtonId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ButtonId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single press or release signal from the button hardware
///
/// The bridge delivers edges for one button strictly in order; edges for
/// different buttons may arrive concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonEdge {
    Press,
    Release,
}

impl fmt::Display for ButtonEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonEdge::Press => f.write_str("Press"),
            ButtonEdge::Release => f.write_str("Release"),
        }
    }
}

/// An edge event as delivered by the edge source collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeEvent {
    pub button: ButtonId,
    pub edge: ButtonEdge,
}

impl EdgeEvent {
    pub fn new(button: impl Into<ButtonId>, edge: ButtonEdge) -> Self {
        Self {
            button: button.into(),
            edge,
        }
    }
}
