//! One scan → load → validate → (fix) pass.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::{
    ConfigError,
    ConfigManager,
    EngineConfig,
};
use crate::issue::Issue;
use crate::locale::{
    LoadOutcome,
    LocaleError,
    LocaleStore,
};
use crate::remediator::{
    OverlayWriter,
    RemediationError,
    Remediator,
};
use crate::scanner::{
    ScanError,
    ScanOutcome,
    SourceScanner,
};
use crate::validator::{
    CoverageReport,
    CoverageValidator,
};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Locale(#[from] LocaleError),

    #[error(transparent)]
    Remediation(#[from] RemediationError),
}

/// What `--fix` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemediationSummary {
    /// Keys drafted across all locales.
    pub drafted: usize,
    /// Overlay files written, in locale order.
    pub written: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Final state; after a fix this reflects the reloaded overlays.
    pub report: CoverageReport,
    pub remediation: Option<RemediationSummary>,
}

/// Runs the whole pipeline for one project.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    source_root: PathBuf,
    locales_dir: PathBuf,
}

impl Engine {
    /// Uses the manager's settings with paths resolved against its root.
    #[must_use]
    pub fn new(manager: &ConfigManager) -> Self {
        Self::from_config(manager.get_settings().clone(), manager.source_root(), manager.locales_dir())
    }

    #[must_use]
    pub const fn from_config(config: EngineConfig, source_root: PathBuf, locales_dir: PathBuf) -> Self {
        Self { config, source_root, locales_dir }
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scans, loads and validates. With `fix`, drafts missing keys into the
    /// overlay files and validates again against the reloaded locales.
    pub async fn run(&self, fix: bool) -> Result<RunOutcome, EngineError> {
        let scanner = SourceScanner::new(self.source_root.clone(), &self.config)?;
        let store = LocaleStore::new(&self.config);

        tracing::info!(
            source_root = %self.source_root.display(),
            locales_dir = %self.locales_dir.display(),
            "Starting coverage run"
        );
        let (scan, load) = tokio::join!(scanner.scan(), self.load_locales(&store));
        let scan = scan?;
        let load = load?;

        let validator = CoverageValidator::new(&self.config);
        let report = self.validate(&validator, &scan, &load, &[]);
        if !fix {
            return Ok(RunOutcome { report, remediation: None });
        }

        let remediation =
            Remediator::new(&self.config, self.locales_dir.clone()).remediate(&report, &load.namespaces);
        let written = OverlayWriter::new(&self.config).persist(&remediation.plan).await?;
        let summary = RemediationSummary { drafted: remediation.plan.total(), written };
        tracing::info!(drafted = summary.drafted, files = summary.written.len(), "Remediation complete");

        let load = if summary.written.is_empty() { load } else { self.load_locales(&store).await? };
        let report = self.validate(&validator, &scan, &load, remediation.plan.issues());

        Ok(RunOutcome { report, remediation: Some(summary) })
    }

    async fn load_locales(&self, store: &LocaleStore) -> Result<LoadOutcome, LocaleError> {
        store.load(&self.config.locales.codes, &self.locales_dir).await
    }

    fn validate(
        &self,
        validator: &CoverageValidator,
        scan: &ScanOutcome,
        load: &LoadOutcome,
        extra: &[Issue],
    ) -> CoverageReport {
        let report = validator.validate(&scan.index(), &load.namespaces).merge_issues(
            scan.issues.iter().chain(&load.issues).chain(extra).cloned(),
        );
        tracing::info!(
            used_keys = report.summary().used_key_count,
            locales = report.summary().locale_count,
            errors = report.summary().error_count,
            warnings = report.summary().warning_count,
            "Validated {}",
            self.locales_dir.display()
        );
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;
    use std::path::Path;

    use googletest::prelude::*;
    use tempfile::TempDir;

    use super::*;
    use crate::issue::IssueKind;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn engine(root: &Path) -> Engine {
        let mut manager = ConfigManager::new();
        manager.load_settings(Some(root.to_path_buf()), None).unwrap();
        Engine::new(&manager)
    }

    #[googletest::test]
    #[tokio::test]
    async fn run_reports_scan_and_load_problems_together() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/App.tsx", "t('app.title')");
        write(temp.path(), "locales/en/common.json", r#"{ "app": { "title": "App" } }"#);
        write(temp.path(), "locales/es/common.json", "{ broken");

        let outcome = engine(temp.path()).run(false).await.unwrap();

        let report = outcome.report;
        expect_that!(outcome.remediation, none());
        expect_that!(report.locale("en").unwrap().missing, is_empty());
        expect_that!(report.locale("es").unwrap().missing, elements_are![eq("app.title")]);
        expect_that!(report.issues_of(IssueKind::MalformedLocaleFile).count(), eq(1));
    }

    #[tokio::test]
    async fn run_fails_without_any_locale() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/App.tsx", "t('app.title')");

        let result = engine(temp.path()).run(false).await;

        assert!(matches!(result, Err(EngineError::Locale(LocaleError::NoLocalesLoaded { .. }))));
    }

    #[googletest::test]
    #[tokio::test]
    async fn run_with_fix_reflects_reloaded_overlay() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/App.tsx", "t('common.save')\nt('clinical.chartReview')");
        write(temp.path(), "locales/es/common.json", "{}");

        let outcome = engine(temp.path()).run(true).await.unwrap();

        let es = outcome.report.locale("es").unwrap();
        expect_that!(es.missing, is_empty());
        expect_that!(es.placeholder_count, eq(1));
        expect_that!(
            outcome.remediation,
            some(field!(RemediationSummary.drafted, eq(&2)))
        );
        expect_that!(
            outcome.report.issues_of(IssueKind::PlaceholderContamination).next(),
            some(field!(Issue.key, some(eq("clinical.chartReview"))))
        );
    }
}
