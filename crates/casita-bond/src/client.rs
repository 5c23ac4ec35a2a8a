//! HTTP client for the Bond local API

use async_trait::async_trait;
use casita_core::{
    CommandError, CommandResult, Device, DeviceCommands, DeviceId, DeviceProperties, DeviceState,
};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, trace};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const TOKEN_HEADER: &str = "BOND-Token";

/// Device metadata as the bridge sends it; the device ID lives in the URL
/// and gets injected by the caller
#[derive(Debug, Deserialize)]
struct DeviceEnvelope {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    device_type: Option<casita_core::DeviceType>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    actions: Vec<String>,
}

impl DeviceEnvelope {
    fn into_device(self, device_id: DeviceId) -> Device {
        Device {
            device_id,
            name: self.name,
            device_type: self.device_type,
            location: self.location,
            actions: self.actions,
        }
    }
}

/// Client for one Bond bridge
pub struct BondClient {
    http: Client,
    base_url: String,
    /// Lazily fetched from `/v2/token` when not configured
    token: RwLock<Option<String>>,
}

impl BondClient {
    /// Create a client for the bridge at `base_url`
    ///
    /// Without a configured token the client asks the bridge for one on
    /// first use; that only succeeds in the bridge's post-boot grace
    /// window, so deployments normally configure it.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> CommandResult<Self> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| CommandError::Transport(err.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(token),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn token(&self) -> CommandResult<String> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }

        let mut slot = self.token.write().await;
        // Someone else may have fetched it while we waited for the write
        // lock.
        if let Some(token) = slot.clone() {
            return Ok(token);
        }

        debug!("fetching bridge token");
        let response = self
            .http
            .get(self.endpoint("/v2/token"))
            .send()
            .await
            .map_err(|err| CommandError::Transport(err.to_string()))?;
        let body = Self::check_status(response).await?;
        let token = body
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| CommandError::Decode("token missing from /v2/token body".into()))?
            .to_string();
        *slot = Some(token.clone());
        Ok(token)
    }

    async fn check_status(response: Response) -> CommandResult<Value> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| CommandError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(CommandError::Status {
                status: status.as_u16(),
                body,
            });
        }
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|err| CommandError::Decode(err.to_string()))
    }

    async fn get_json(&self, path: &str) -> CommandResult<Value> {
        trace!(path = %path, "bridge request");
        let token = self.token().await?;
        let response = self
            .http
            .get(self.endpoint(path))
            .header(TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|err| CommandError::Transport(err.to_string()))?;
        Self::check_status(response).await
    }

    /// PUT an action frame; the bridge transmits to the device
    async fn execute_action(
        &self,
        device: &DeviceId,
        action: &str,
        payload: Value,
    ) -> CommandResult<()> {
        let path = format!("/v2/devices/{device}/actions/{action}");
        debug!(path = %path, payload = %payload, "executing action");
        let token = self.token().await?;
        let response = self
            .http
            .put(self.endpoint(&path))
            .header(TOKEN_HEADER, token)
            .json(&payload)
            .send()
            .await
            .map_err(|err| CommandError::Transport(err.to_string()))?;
        Self::check_status(response).await.map(|_| ())
    }

    /// PATCH the bridge's belief state without transmitting
    async fn update_state(&self, device: &DeviceId, payload: Value) -> CommandResult<()> {
        let path = format!("/v2/devices/{device}/state");
        debug!(path = %path, payload = %payload, "updating belief state");
        let token = self.token().await?;
        let response = self
            .http
            .patch(self.endpoint(&path))
            .header(TOKEN_HEADER, token)
            .json(&payload)
            .send()
            .await
            .map_err(|err| CommandError::Transport(err.to_string()))?;
        Self::check_status(response).await.map(|_| ())
    }

    fn device_ids(body: &Value) -> CommandResult<Vec<DeviceId>> {
        let object = body
            .as_object()
            .ok_or_else(|| CommandError::Decode("device list is not an object".into()))?;
        Ok(object
            .keys()
            .filter(|key| !key.starts_with('_'))
            .map(|key| DeviceId::new(key.clone()))
            .collect())
    }
}

#[async_trait]
impl DeviceCommands for BondClient {
    async fn list_devices(&self) -> CommandResult<Vec<DeviceId>> {
        let body = self.get_json("/v2/devices").await?;
        Self::device_ids(&body)
    }

    async fn get_device(&self, device: &DeviceId) -> CommandResult<Device> {
        let body = self.get_json(&format!("/v2/devices/{device}")).await?;
        let envelope: DeviceEnvelope =
            serde_json::from_value(body).map_err(|err| CommandError::Decode(err.to_string()))?;
        Ok(envelope.into_device(device.clone()))
    }

    async fn get_state(&self, device: &DeviceId) -> CommandResult<DeviceState> {
        let body = self.get_json(&format!("/v2/devices/{device}/state")).await?;
        let state: DeviceState =
            serde_json::from_value(body).map_err(|err| CommandError::Decode(err.to_string()))?;
        trace!(device = %device, state = ?state, "device state");
        Ok(state)
    }

    async fn get_properties(&self, device: &DeviceId) -> CommandResult<DeviceProperties> {
        let body = self
            .get_json(&format!("/v2/devices/{device}/properties"))
            .await?;
        serde_json::from_value(body).map_err(|err| CommandError::Decode(err.to_string()))
    }

    async fn set_speed(&self, device: &DeviceId, speed: u32) -> CommandResult<()> {
        self.execute_action(device, "SetSpeed", json!({ "argument": speed }))
            .await
    }

    async fn increase_speed(&self, device: &DeviceId, step: u32) -> CommandResult<()> {
        self.execute_action(device, "IncreaseSpeed", json!({ "argument": step }))
            .await
    }

    async fn decrease_speed(&self, device: &DeviceId, step: u32) -> CommandResult<()> {
        // Stepping below speed 1 confuses some receivers; turn off
        // instead.
        let state = self.get_state(device).await?;
        if state.speed == Some(1) {
            return self.power_off(device).await;
        }
        self.execute_action(device, "DecreaseSpeed", json!({ "argument": step }))
            .await
    }

    async fn power_off(&self, device: &DeviceId) -> CommandResult<()> {
        self.execute_action(device, "TurnOff", json!({})).await
    }

    async fn toggle_light(&self, device: &DeviceId) -> CommandResult<()> {
        self.execute_action(device, "ToggleLight", json!({})).await
    }

    async fn light_on(&self, device: &DeviceId) -> CommandResult<()> {
        let state = self.get_state(device).await?;
        if state.light_is_on() {
            return Ok(());
        }
        self.execute_action(device, "TurnLightOn", json!({})).await
    }

    async fn light_off(&self, device: &DeviceId) -> CommandResult<()> {
        let state = self.get_state(device).await?;
        if state.light == Some(0) {
            return Ok(());
        }
        self.execute_action(device, "TurnLightOff", json!({})).await
    }

    async fn set_light_belief_state(&self, device: &DeviceId, on: bool) -> CommandResult<()> {
        self.update_state(device, json!({ "light": u8::from(on) }))
            .await
    }

    async fn dim_mode(&self, device: &DeviceId) -> CommandResult<()> {
        self.execute_action(device, "DimMode", json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BondClient::new("http://bond.local/", None).unwrap();
        assert_eq!(
            client.endpoint("/v2/devices"),
            "http://bond.local/v2/devices"
        );
    }

    #[test]
    fn test_device_ids_skip_metadata_keys() {
        let body = json!({
            "_": "7fc1e84b",
            "__": "1a2b3c4d",
            "6409e2a7": {"_": "ad9bcbfd"},
            "79135791": {"_": "ad9bcbfd"},
        });
        let mut ids = BondClient::device_ids(&body).unwrap();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(ids, vec![DeviceId::new("6409e2a7"), DeviceId::new("79135791")]);
    }

    #[test]
    fn test_device_ids_reject_non_object() {
        let result = BondClient::device_ids(&json!(["not", "an", "object"]));
        assert!(matches!(result, Err(CommandError::Decode(_))));
    }

    #[test]
    fn test_envelope_injects_device_id() {
        let envelope: DeviceEnvelope = serde_json::from_value(json!({
            "name": "Office Ceiling Fan",
            "type": "CF",
            "actions": ["SetSpeed"],
            "commands_hash": {"_": "d2f"},
        }))
        .unwrap();
        let device = envelope.into_device(DeviceId::new("6409e2a7"));
        assert_eq!(device.device_id, DeviceId::new("6409e2a7"));
        assert_eq!(device.name.as_deref(), Some("Office Ceiling Fan"));
    }

    #[tokio::test]
    async fn test_configured_token_used_without_fetch() {
        // With a configured token the client must not need the network.
        let client = BondClient::new("http://bond.local", Some("09b9a6de".into())).unwrap();
        assert_eq!(client.token().await.unwrap(), "09b9a6de");
    }
}
