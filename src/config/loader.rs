//! Configuration file loading.

use std::path::Path;

use super::{
    CONFIG_FILE_NAME,
    ConfigError,
    EngineConfig,
};

/// Loads `.i18n-coverage.json` from the project root.
///
/// # Returns
/// - `Ok(Some(config))`: the file exists and parsed
/// - `Ok(None)`: no configuration file in the project root
/// - `Err(ConfigError)`: read or parse failure
pub(super) fn load_from_workspace(
    workspace_root: &Path,
) -> Result<Option<EngineConfig>, ConfigError> {
    let config_path = workspace_root.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Ok(None);
    }

    load_from_path(&config_path).map(Some)
}

/// Loads configuration from an explicit path. The file must exist.
pub(super) fn load_from_path(config_path: &Path) -> Result<EngineConfig, ConfigError> {
    tracing::debug!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(config_path)?;
    let settings: EngineConfig = serde_json::from_str(&content)?;

    Ok(settings)
}
