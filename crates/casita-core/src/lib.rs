//! Core types for casita
//!
//! This crate provides the fundamental types used throughout the casita
//! hub: button identifiers and edge events, classified gestures, the device
//! data model, and the `DeviceCommands` trait that abstracts the downstream
//! hardware bridge.

mod button;
mod commands;
mod device;
mod gesture;

pub use button::{ButtonEdge, ButtonId, EdgeEvent};
pub use commands::{CommandError, CommandResult, DeviceCommands, SharedDeviceCommands};
pub use device::{Device, DeviceId, DeviceProperties, DeviceState, DeviceType};
pub use gesture::Gesture;
