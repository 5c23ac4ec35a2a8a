//! Gesture classification and listener dispatch for casita
//!
//! This crate turns raw button press/release edges into semantic gestures
//! and delivers them to registered listeners:
//!
//! - [`ButtonClassifier`] runs the per-button state machine with its two
//!   debounce timers (long-press threshold, double-click grace window).
//! - [`GestureEngine`] owns one classifier per button and is the entry
//!   point for the edge stream.
//! - [`ListenerRegistry`] maps button IDs to gesture handlers, with an
//!   optional fallback for buttons nothing registered for.
//!
//! Classification never touches zone locks; whatever a listener does with
//! a gesture is its own business and runs on the timer task that emitted
//! it.

mod classifier;
mod engine;
mod registry;

pub use classifier::{ButtonClassifier, GestureConfig};
pub use engine::GestureEngine;
pub use registry::{ListenerError, ListenerRegistry, ListenerResult};
