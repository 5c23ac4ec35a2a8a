//! casita hub daemon
//!
//! Loads settings, connects the Bond client, registers all button
//! listeners, and runs until interrupted.

use anyhow::Result;
use casita_bond::BondClient;
use casita_hub::Hub;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the settings file location
const CONFIG_ENV: &str = "CASITA_CONFIG";
const DEFAULT_CONFIG: &str = "casita.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path =
        std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let settings = casita_config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&settings.application.log_filter)?)
        .init();

    info!(config = %config_path, "starting casita");

    let bond = Arc::new(BondClient::new(
        settings.bond.bridge_url.as_str(),
        settings.bond.token.clone(),
    )?);
    let hub = Hub::new(&settings, bond);
    hub.startup();

    // TODO: feed Hub::run from the lighting bridge's button subscription
    // once the LEAP client lands; until then embedders bring their own
    // edge source.

    info!("casita is running");
    tokio::signal::ctrl_c().await?;

    info!("shutting down");
    hub.shutdown().await;
    Ok(())
}
