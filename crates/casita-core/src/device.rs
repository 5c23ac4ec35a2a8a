//! Device data model for the downstream hardware bridge
//!
//! These mirror what the Bond bridge reports for a device: identity and
//! metadata, the last known state, and the fixed properties. All fields
//! the hub does not consume are left out; unknown wire fields are ignored
//! during deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier the hardware bridge assigns to a device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Device category reported by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    /// Ceiling fan
    CF,
    /// Fireplace
    FP,
    /// Motorized shades
    MS,
    /// Generic device
    GX,
    /// Light
    LT,
    /// Bidet
    BD,
}

/// A device known to the hardware bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: DeviceId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub device_type: Option<DeviceType>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub actions: Vec<String>,
}

/// Last reported state of a device
///
/// The bridge reports light state as 0/1 integers, kept as-is here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    #[serde(default)]
    pub power: Option<u8>,
    #[serde(default)]
    pub speed: Option<u32>,
    #[serde(default)]
    pub light: Option<u8>,
    #[serde(default)]
    pub brightness: Option<u32>,
    #[serde(default)]
    pub timer: Option<u32>,
}

impl DeviceState {
    /// Whether the bridge believes the light is on
    pub fn light_is_on(&self) -> bool {
        self.light == Some(1)
    }
}

/// Fixed properties of a device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceProperties {
    #[serde(default)]
    pub max_speed: u32,
    #[serde(default)]
    pub trust_state: bool,
}
