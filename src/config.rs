//! Engine configuration.
/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Source file pattern matcher
mod matcher;
/// Configuration types and settings
mod types;

pub use manager::ConfigManager;
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub use types::{
    CONFIG_FILE_NAME,
    ClassifierConfig,
    ConfigError,
    EngineConfig,
    IndexingConfig,
    LocalesConfig,
    Policy,
    ScanConfig,
    ValidationError,
};
