//! Holds the validated configuration for one run.

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    EngineConfig,
    loader,
};

/// Owns the current configuration and the project root it was loaded for.
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    current_settings: EngineConfig,
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: EngineConfig::default(), workspace_root: None }
    }

    /// Loads settings for a project root.
    ///
    /// An explicit `config_path` must exist; otherwise `.i18n-coverage.json`
    /// in the root is used when present, and defaults when not.
    ///
    /// # Errors
    /// - File read error
    /// - JSON parse error
    /// - Validation error
    pub fn load_settings(
        &mut self,
        workspace_root: Option<PathBuf>,
        config_path: Option<&Path>,
    ) -> Result<(), ConfigError> {
        tracing::debug!("Loading settings for workspace: {:?}", workspace_root);

        let settings = if let Some(path) = config_path {
            loader::load_from_path(path)?
        } else if let Some(root) = &workspace_root {
            loader::load_from_workspace(root)?.map_or_else(EngineConfig::default, |ws| {
                tracing::debug!("Loaded workspace settings: {:?}", ws);
                ws
            })
        } else {
            EngineConfig::default()
        };

        settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = settings;
        self.workspace_root = workspace_root;
        tracing::debug!("Settings loaded successfully: {:?}", self.current_settings);

        Ok(())
    }

    /// Replaces the settings, e.g. after applying command-line overrides.
    pub fn update_settings(&mut self, new_settings: EngineConfig) -> Result<(), ConfigError> {
        tracing::debug!("Updating settings...");

        new_settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = new_settings;
        tracing::debug!("Settings updated successfully");

        Ok(())
    }

    #[must_use]
    pub const fn get_settings(&self) -> &EngineConfig {
        &self.current_settings
    }

    #[must_use]
    pub const fn workspace_root(&self) -> Option<&PathBuf> {
        self.workspace_root.as_ref()
    }

    /// Source root resolved against the project root.
    #[must_use]
    pub fn source_root(&self) -> PathBuf {
        self.resolve(&self.current_settings.source_root)
    }

    /// Locales directory resolved against the project root.
    #[must_use]
    pub fn locales_dir(&self) -> PathBuf {
        self.resolve(&self.current_settings.locales_dir)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}
