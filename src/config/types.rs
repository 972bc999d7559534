use std::path::{
    Path,
    PathBuf,
};
use std::time::Duration;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

/// Name of the project-level configuration file.
pub const CONFIG_FILE_NAME: &str = ".i18n-coverage.json";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "scan.excludePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Top-level configuration passed into every component.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Directory scanned for translation-key usages, relative to the project root.
    pub source_root: PathBuf,
    /// Directory holding one subdirectory per locale, relative to the project root.
    pub locales_dir: PathBuf,

    pub key_separator: String,

    pub scan: ScanConfig,
    pub indexing: IndexingConfig,
    pub locales: LocalesConfig,
    pub classifier: ClassifierConfig,
    pub policy: Policy,

    /// Emit an advisory issue for every defined key no source file uses.
    pub report_unused_keys: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    /// File extensions (without the dot) that are opened and scanned.
    pub extensions: Vec<String>,
    /// Directory names pruned during traversal, at any depth.
    pub exclude_dirs: Vec<String>,
    /// Glob patterns relative to the source root; matching files are skipped.
    pub exclude_patterns: Vec<String>,
    pub respect_gitignore: bool,
    /// Files larger than this are skipped.
    pub max_file_bytes: u64,
    pub read_timeout_ms: u64,
}

impl ScanConfig {
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: ["js", "jsx", "ts", "tsx", "mjs", "cjs", "vue", "svelte"]
                .into_iter()
                .map(String::from)
                .collect(),
            exclude_dirs: ["node_modules", ".git", "dist", "build", ".next", "coverage", ".cache", "out"]
                .into_iter()
                .map(String::from)
                .collect(),
            exclude_patterns: Vec::new(),
            respect_gitignore: true,
            max_file_bytes: 1024 * 1024,
            read_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingConfig {
    /// Parallel worker count for scanning.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_threads: Option<usize>,
}

impl IndexingConfig {
    #[must_use]
    pub fn effective_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| (num_cpus::get() * 4 / 5).max(1)).max(1)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalesConfig {
    /// Locale codes to validate. Empty means every subdirectory of `localesDir`.
    pub codes: Vec<String>,
    /// The only file the remediator writes to; always merged last.
    pub overlay_file: String,
    /// Extension (without the dot) of locale data files.
    pub file_extension: String,
    /// Locale files larger than this are reported as unreadable.
    pub max_file_bytes: u64,
}

impl Default for LocalesConfig {
    fn default() -> Self {
        Self {
            codes: Vec::new(),
            overlay_file: "auto-generated.json".to_string(),
            file_extension: "json".to_string(),
            max_file_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Placeholder heuristics that go beyond the baseline rule set.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassifierConfig {
    /// Flag values made only of uppercase letters and underscores.
    pub all_caps_rule: bool,
    /// Flag non-empty values shorter than this many characters.
    pub min_value_length: Option<usize>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { all_caps_rule: true, min_value_length: None }
    }
}

/// Thresholds mapping a report to pass or fail.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Policy {
    /// Maximum missing keys tolerated in any single locale.
    pub max_missing: Option<usize>,
    /// Maximum placeholder values tolerated in any single locale.
    pub max_placeholders: Option<usize>,
    /// Minimum coverage every locale must reach.
    pub min_coverage_percent: Option<f64>,
    pub treat_malformed_as_fatal: bool,
    pub treat_conflicts_as_fatal: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_missing: Some(0),
            max_placeholders: Some(0),
            min_coverage_percent: None,
            treat_malformed_as_fatal: false,
            treat_conflicts_as_fatal: false,
        }
    }
}

impl Policy {
    /// Gates on coverage percentage instead of an absolute missing count.
    #[must_use]
    pub const fn with_min_coverage(mut self, percent: f64) -> Self {
        self.min_coverage_percent = Some(percent);
        self.max_missing = None;
        self
    }
}

impl EngineConfig {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Threshold out of range
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.key_separator.is_empty() {
            errors.push(ValidationError::new(
                "keySeparator",
                "The separator cannot be empty. Please specify a separator, for example: \".\" (dot)",
            ));
        }

        if self.scan.extensions.is_empty() {
            errors.push(ValidationError::new(
                "scan.extensions",
                "At least one extension is required. Example: [\"ts\", \"tsx\"]",
            ));
        }

        for (index, ext) in self.scan.extensions.iter().enumerate() {
            if ext.is_empty() || ext.starts_with('.') {
                errors.push(ValidationError::new(
                    format!("scan.extensions[{index}]"),
                    format!("Invalid extension '{ext}': use the bare extension, e.g. \"ts\""),
                ));
            }
        }

        for (index, pattern) in self.scan.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("scan.excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.scan.max_file_bytes == 0 {
            errors.push(ValidationError::new("scan.maxFileBytes", "Must be greater than zero"));
        }

        if self.scan.read_timeout_ms == 0 {
            errors.push(ValidationError::new("scan.readTimeoutMs", "Must be greater than zero"));
        }

        if self.indexing.num_threads == Some(0) {
            errors.push(ValidationError::new(
                "indexing.numThreads",
                "Must be at least 1, or remove the field to use the CPU-based default",
            ));
        }

        if self.locales.overlay_file.is_empty() {
            errors.push(ValidationError::new(
                "locales.overlayFile",
                "The overlay file name cannot be empty. Example: \"auto-generated.json\"",
            ));
        } else if self.locales.overlay_file.contains(['/', '\\']) {
            errors.push(ValidationError::new(
                "locales.overlayFile",
                "The overlay file must be a bare file name inside each locale directory",
            ));
        } else if !self.locales.file_extension.is_empty()
            && !Path::new(&self.locales.overlay_file)
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.locales.file_extension))
        {
            errors.push(ValidationError::new(
                "locales.overlayFile",
                format!(
                    "The overlay file must end with .{} or it is never loaded back",
                    self.locales.file_extension
                ),
            ));
        }

        if self.locales.file_extension.is_empty() {
            errors.push(ValidationError::new("locales.fileExtension", "The extension cannot be empty"));
        }

        for (index, code) in self.locales.codes.iter().enumerate() {
            if code.is_empty() || code.contains(['/', '\\']) {
                errors.push(ValidationError::new(
                    format!("locales.codes[{index}]"),
                    format!("Invalid locale code '{code}'"),
                ));
            }
        }

        if let Some(min) = self.classifier.min_value_length
            && min == 0
        {
            errors.push(ValidationError::new(
                "classifier.minValueLength",
                "Must be at least 1, or remove the field to disable the length rule",
            ));
        }

        if let Some(percent) = self.policy.min_coverage_percent
            && !(0.0..=100.0).contains(&percent)
        {
            errors.push(ValidationError::new(
                "policy.minCoveragePercent",
                format!("Must be between 0 and 100, got {percent}"),
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("src"),
            locales_dir: PathBuf::from("locales"),
            key_separator: ".".to_string(),
            scan: ScanConfig::default(),
            indexing: IndexingConfig::default(),
            locales: LocalesConfig::default(),
            classifier: ClassifierConfig::default(),
            policy: Policy::default(),
            report_unused_keys: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[rstest]
    fn validate_valid_settings() {
        let settings = EngineConfig::default();

        assert_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    fn deserialize_partial_settings() {
        let json = r#"{"localesDir": "public/locales", "policy": {"maxPlaceholders": 5}}"#;

        let settings: EngineConfig = serde_json::from_str(json).unwrap();

        assert_that!(settings.key_separator, eq("."));
        assert_eq!(settings.locales_dir, PathBuf::from("public/locales"));
        assert_that!(settings.policy.max_placeholders, some(eq(5)));
        assert_that!(settings.policy.max_missing, some(eq(0)));
    }

    #[rstest]
    fn deserialize_empty_settings() {
        let settings: EngineConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(settings.source_root, PathBuf::from("src"));
        assert_that!(settings.locales.overlay_file, eq("auto-generated.json"));
        assert_that!(settings.scan.exclude_dirs, contains(eq("node_modules")));
        assert_that!(settings.classifier.all_caps_rule, eq(true));
        assert_that!(settings.report_unused_keys, eq(false));
    }

    #[rstest]
    fn validate_invalid_key_separator_empty() {
        let settings = EngineConfig { key_separator: String::new(), ..EngineConfig::default() };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("keySeparator")),
                field!(ValidationError.message, contains_substring("cannot be empty"))
            ]])
        );
    }

    #[rstest]
    fn validate_invalid_exclude_pattern_invalid_glob() {
        let settings = EngineConfig {
            scan: ScanConfig {
                exclude_patterns: vec!["**/*.spec.ts".to_string(), "invalid[pattern".to_string()],
                ..ScanConfig::default()
            },
            ..EngineConfig::default()
        };

        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("scan.excludePatterns[1]")),
                field!(ValidationError.message, contains_substring("Invalid glob pattern")),
                field!(ValidationError.message, contains_substring("invalid[pattern"))
            ]])
        );
    }

    #[rstest]
    #[case::nested_path("locales/auto.json")]
    #[case::empty("")]
    #[case::other_extension("auto.jsonc")]
    #[case::no_extension("auto-generated")]
    fn validate_invalid_overlay_file(#[case] overlay: &str) {
        let settings = EngineConfig {
            locales: LocalesConfig { overlay_file: overlay.to_string(), ..LocalesConfig::default() },
            ..EngineConfig::default()
        };

        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![field!(ValidationError.field_path, eq("locales.overlayFile"))])
        );
    }

    #[googletest::test]
    fn validate_overlay_extension_ignores_case() {
        let settings = EngineConfig {
            locales: LocalesConfig {
                overlay_file: "machine.JSON".to_string(),
                ..LocalesConfig::default()
            },
            ..EngineConfig::default()
        };

        expect_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    #[case::negative(-1.0)]
    #[case::above_hundred(100.5)]
    fn validate_coverage_threshold_out_of_range(#[case] percent: f64) {
        let settings = EngineConfig {
            policy: Policy::default().with_min_coverage(percent),
            ..EngineConfig::default()
        };

        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![field!(ValidationError.field_path, eq("policy.minCoveragePercent"))])
        );
    }

    #[rstest]
    fn with_min_coverage_clears_missing_limit() {
        let policy = Policy::default().with_min_coverage(90.0);

        assert_that!(policy.max_missing, none());
        assert_that!(policy.min_coverage_percent, some(eq(90.0)));
        assert_that!(policy.max_placeholders, some(eq(0)));
    }

    #[rstest]
    fn effective_threads_is_at_least_one() {
        assert_that!(IndexingConfig::default().effective_threads(), ge(1));
        assert_that!(IndexingConfig { num_threads: Some(3) }.effective_threads(), eq(3));
    }

    #[rstest]
    fn config_error_validation_errors_format() {
        let settings = EngineConfig {
            key_separator: String::new(),
            scan: ScanConfig { extensions: vec![], ..ScanConfig::default() },
            ..EngineConfig::default()
        };

        let errors = settings.validate().unwrap_err();
        let config_error = ConfigError::ValidationErrors(errors);

        let error_message = format!("{config_error}");
        assert_that!(error_message, contains_substring("Configuration validation failed"));
        assert_that!(error_message, contains_substring("1. keySeparator"));
        assert_that!(error_message, contains_substring("2. scan.extensions"));
        assert_that!(error_message, contains_substring("At least one extension"));
    }
}
