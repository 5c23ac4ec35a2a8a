//! Gesture-to-command dispatch for casita
//!
//! This crate maps classified gestures to device command sequences and
//! executes them under the target zone's lock:
//!
//! - [`ButtonBinding`] is one row of the static configuration table:
//!   button → zone + device + [`ActionPolicy`].
//! - [`Dispatcher`] runs a binding: acquire the zone lock, resolve the
//!   device by name, issue the policy's commands for the gesture, hold
//!   the lock through the settle delay, release.
//! - [`register_bindings`] wires a binding table into a
//!   [`ListenerRegistry`](casita_gesture::ListenerRegistry) at startup.
//!
//! Zones dispatch fully in parallel; within one zone everything is
//! strictly serialized. Any failure aborts the invocation, is reported to
//! the emission boundary, and still releases the lock.

mod binding;
mod dispatcher;

pub use binding::{ActionPolicy, ButtonBinding};
pub use dispatcher::{register_bindings, DispatchError, DispatchResult, Dispatcher};
