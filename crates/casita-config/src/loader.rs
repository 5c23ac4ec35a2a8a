//! Settings file loading

use crate::error::{ConfigError, ConfigResult};
use crate::settings::Settings;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Environment variable consulted when the settings file carries no bond
/// token
pub const BOND_TOKEN_ENV: &str = "CASITA_BOND_TOKEN";

/// Load and validate settings from a YAML file
pub fn load(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let path = path.as_ref();
    debug!("loading settings from {:?}", path);

    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    load_str(&content, path)
}

/// Load and validate settings from a YAML string
pub fn load_str(content: &str, source_path: &Path) -> ConfigResult<Settings> {
    let mut settings: Settings =
        serde_yaml::from_str(content).map_err(|source| ConfigError::ParseYaml {
            path: source_path.to_path_buf(),
            source,
        })?;

    if settings.bond.token.is_none() {
        if let Ok(token) = std::env::var(BOND_TOKEN_ENV) {
            debug!("using bond token from {}", BOND_TOKEN_ENV);
            settings.bond.token = Some(token);
        }
    }

    settings.validate()?;
    Ok(settings)
}
