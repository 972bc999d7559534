//! Human-readable and JSON rendering of coverage reports.

mod gate;

use std::collections::BTreeMap;
use std::path::{
    Path,
    PathBuf,
};

pub use gate::{
    Gate,
    GateDecision,
    Violation,
};
use thiserror::Error;

use crate::issue::{
    Issue,
    IssueKind,
};
use crate::types::SourceLocation;
use crate::validator::CoverageReport;

/// Group heading for issues that belong to no locale.
pub const GENERAL_GROUP: &str = "general";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to serialise report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write report to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pretty JSON for CI artifacts.
pub fn to_json(report: &CoverageReport) -> Result<String, ReportError> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

pub async fn write_json(report: &CoverageReport, path: &Path) -> Result<(), ReportError> {
    let json = to_json(report)?;
    let to_error = |source| ReportError::Write { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(to_error)?;
    }
    tokio::fs::write(path, json).await.map_err(to_error)?;
    tracing::info!(path = %path.display(), "Wrote JSON report");
    Ok(())
}

/// Issues grouped by locale, then coverage per locale, then the verdict.
#[must_use]
pub fn render_text(report: &CoverageReport, decision: &GateDecision) -> String {
    let mut groups: BTreeMap<&str, Vec<&Issue>> = BTreeMap::new();
    let mut general = Vec::new();
    for issue in report.issues() {
        match issue.locale.as_deref() {
            Some(locale) => groups.entry(locale).or_default().push(issue),
            None => general.push(issue),
        }
    }

    let general = (!general.is_empty()).then_some((GENERAL_GROUP, general));

    let mut out = String::new();
    for (heading, issues) in groups.into_iter().chain(general) {
        out.push_str(&format!("[{heading}]\n"));
        for issue in issues {
            out.push_str(&format!("  {}\n", render_issue(issue)));
        }
        out.push('\n');
    }

    if !report.per_locale().is_empty() {
        out.push_str("Coverage:\n");
        for (locale, coverage) in report.per_locale() {
            out.push_str(&format!(
                "  {locale:<8} {:>6.1}%  missing {}  placeholders {}  malformed {}  total {}\n",
                coverage.coverage_percent,
                coverage.missing.len(),
                coverage.placeholder_count,
                coverage.malformed_count,
                coverage.total,
            ));
        }
        out.push('\n');
    }

    for violation in &decision.violations {
        let scope = violation.locale.as_deref().unwrap_or(GENERAL_GROUP);
        out.push_str(&format!("  violation [{scope}] {}\n", violation.message));
    }
    out.push_str(&decision.summary);
    out.push('\n');
    out
}

fn render_issue(issue: &Issue) -> String {
    let mut line = format!("{:<7} {}", issue.severity, issue.kind);
    if let Some(key) = &issue.key {
        line.push_str(&format!(" {key}"));
    }
    if issue.kind != IssueKind::MissingTranslation || issue.locations.is_empty() {
        line.push_str(&format!(" {}", issue.detail));
    }
    if !issue.locations.is_empty() {
        let sites: Vec<String> = issue.locations.iter().map(render_location).collect();
        line.push_str(&format!(" ({})", sites.join(", ")));
    }
    line
}

fn render_location(location: &SourceLocation) -> String {
    if location.line == 0 {
        location.file.display().to_string()
    } else {
        location.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use googletest::prelude::*;
    use tempfile::TempDir;

    use super::*;
    use crate::config::{
        EngineConfig,
        Policy,
    };
    use crate::locale::LocaleNamespace;
    use crate::scanner::UsageIndex;
    use crate::types::UsageKey;
    use crate::validator::CoverageValidator;

    fn sample_report() -> CoverageReport {
        let used = UsageIndex::from_usages([
            UsageKey::new("a.b", "src/App.tsx", 3),
            UsageKey::new("a.c", "src/App.tsx", 7),
            UsageKey::new("a.c", "src/Other.tsx", 1),
        ]);
        let locales = BTreeMap::from([
            ("en".to_string(), LocaleNamespace::from_pairs("en", "en.json", [("a.b", "X")])),
            (
                "es".to_string(),
                LocaleNamespace::from_pairs("es", "es.json", [("a.b", "Y"), ("a.c", "Z")]),
            ),
        ]);
        CoverageValidator::new(&EngineConfig::default())
            .validate(&used, &locales)
            .merge_issues([Issue::new(
                IssueKind::FileUnreadable,
                "Source file bad.ts is not valid UTF-8",
            )
            .with_location(SourceLocation::new("bad.ts", 0))])
    }

    #[googletest::test]
    fn render_text_groups_by_locale_with_call_sites() {
        let report = sample_report();
        let decision = Gate::new(Policy::default()).decide(&report);

        let text = render_text(&report, &decision);

        expect_that!(
            text,
            contains_substring("[en]\n  error   MISSING_TRANSLATION a.c (src/App.tsx:7, src/Other.tsx:1)\n")
        );
        expect_that!(text, contains_substring("[general]\n  warning FILE_UNREADABLE Source file bad.ts"));
        expect_that!(text, contains_substring("(bad.ts)\n"));
        expect_that!(text, contains_substring("  en         50.0%  missing 1"));
        expect_that!(text, contains_substring("violation [en] 1 missing translations"));
        expect_that!(text, ends_with(format!("{}\n", decision.summary)));
        expect_that!(text, not(contains_substring("[es]")));
    }

    #[tokio::test]
    async fn write_json_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("reports").join("coverage.json");

        write_json(&sample_report(), &path).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.pointer("/perLocale/en/missing"), Some(&serde_json::json!(["a.c"])));
        assert_eq!(written.pointer("/summary/usedKeyCount"), Some(&serde_json::json!(2)));
    }
}
