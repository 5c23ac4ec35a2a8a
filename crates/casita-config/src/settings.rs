//! Typed settings for the hub

use crate::error::{ConfigError, ConfigResult};
use casita_dispatch::ButtonBinding;
use casita_gesture::GestureConfig;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::warn;

/// Everything the hub needs to run
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationSettings,
    pub bond: BondSettings,
    #[serde(default)]
    pub gesture: GestureSettings,
    #[serde(default)]
    pub dispatch: DispatchSettings,
    #[serde(default)]
    pub bindings: Vec<ButtonBinding>,
}

impl Settings {
    /// Reject tables a running hub could not make sense of
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for binding in &self.bindings {
            if !seen.insert(&binding.button_id) {
                return Err(ConfigError::DuplicateButton {
                    button: binding.button_id.clone(),
                });
            }
            if binding.zone.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: format!("bindings.{}.zone", binding.button_id),
                    reason: "zone name cannot be empty".to_string(),
                });
            }
            if binding.device.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: format!("bindings.{}.device", binding.button_id),
                    reason: "device name cannot be empty".to_string(),
                });
            }
        }
        if self.bindings.is_empty() {
            warn!("no button bindings configured; every gesture will hit the fallback");
        }
        Ok(())
    }
}

/// Process-wide knobs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    /// tracing-subscriber EnvFilter directive, e.g. "info" or
    /// "casita_gesture=trace,info"
    pub log_filter: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
        }
    }
}

/// Where the Bond bridge lives
#[derive(Debug, Clone, Deserialize)]
pub struct BondSettings {
    /// Base URL of the bridge's local API, e.g. "http://bond.local"
    pub bridge_url: String,
    /// Local API token; falls back to `CASITA_BOND_TOKEN`, then to the
    /// bridge's post-boot open token endpoint
    #[serde(default)]
    pub token: Option<String>,
}

/// Classifier timing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    pub long_press_ms: u64,
    pub double_click_window_ms: u64,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            long_press_ms: 1_000,
            double_click_window_ms: 500,
        }
    }
}

impl GestureSettings {
    pub fn gesture_config(&self) -> GestureConfig {
        GestureConfig {
            long_press_threshold: Duration::from_millis(self.long_press_ms),
            double_click_window: Duration::from_millis(self.double_click_window_ms),
        }
    }
}

/// Dispatch timing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// How long a zone stays locked after a successful command burst
    pub settle_ms: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self { settle_ms: 2_000 }
    }
}

impl DispatchSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
