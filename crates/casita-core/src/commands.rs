//! The device command interface the dispatcher executes against
//!
//! `DeviceCommands` abstracts the hardware bridge (in production the Bond
//! local API, in tests a recording mock). Every call may fail with a
//! transport or status error; retries, if any, are the implementation's
//! business.

use crate::device::{Device, DeviceId, DeviceProperties, DeviceState};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for device commands
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors surfaced by a `DeviceCommands` implementation
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    /// The bridge answered with a non-success status
    #[error("bridge returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never completed
    #[error("transport error: {0}")]
    Transport(String),

    /// The bridge answered with a body we could not decode
    #[error("failed to decode bridge response: {0}")]
    Decode(String),
}

/// Commands the hub issues against the hardware bridge
///
/// Implementations must be safe to share across zones; the hub serializes
/// calls per zone, but two zones may command two devices concurrently.
#[async_trait]
pub trait DeviceCommands: Send + Sync {
    /// All device IDs the bridge knows
    async fn list_devices(&self) -> CommandResult<Vec<DeviceId>>;

    /// Metadata for one device
    async fn get_device(&self, device: &DeviceId) -> CommandResult<Device>;

    /// Last reported state for one device
    async fn get_state(&self, device: &DeviceId) -> CommandResult<DeviceState>;

    /// Fixed properties for one device
    async fn get_properties(&self, device: &DeviceId) -> CommandResult<DeviceProperties>;

    /// Set fan speed to an absolute value
    async fn set_speed(&self, device: &DeviceId, speed: u32) -> CommandResult<()>;

    /// Increase fan speed by `step`
    async fn increase_speed(&self, device: &DeviceId, step: u32) -> CommandResult<()>;

    /// Decrease fan speed by `step`
    async fn decrease_speed(&self, device: &DeviceId, step: u32) -> CommandResult<()>;

    /// Power the device off
    async fn power_off(&self, device: &DeviceId) -> CommandResult<()>;

    /// Toggle the device's light
    async fn toggle_light(&self, device: &DeviceId) -> CommandResult<()>;

    /// Turn the device's light on
    async fn light_on(&self, device: &DeviceId) -> CommandResult<()>;

    /// Turn the device's light off
    async fn light_off(&self, device: &DeviceId) -> CommandResult<()>;

    /// Overwrite the bridge's belief about the light state without
    /// transmitting to the device
    async fn set_light_belief_state(&self, device: &DeviceId, on: bool) -> CommandResult<()>;

    /// Toggle the light's dim mode
    async fn dim_mode(&self, device: &DeviceId) -> CommandResult<()>;
}

/// Shared handle to a `DeviceCommands` implementation
pub type SharedDeviceCommands = Arc<dyn DeviceCommands>;
