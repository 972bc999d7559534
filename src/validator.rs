//! Set-difference validation of used keys against loaded locales.

use std::collections::{
    BTreeMap,
    BTreeSet,
};

use serde::Serialize;

use crate::classifier::{
    KeyClass,
    KeyClassifier,
};
use crate::config::EngineConfig;
use crate::issue::{
    Issue,
    IssueKind,
    Severity,
    sort_issues,
};
use crate::locale::LocaleNamespace;
use crate::scanner::UsageIndex;

/// Coverage figures for one locale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleCoverage {
    pub missing: BTreeSet<String>,
    pub unused: BTreeSet<String>,
    pub placeholder_count: usize,
    pub malformed_count: usize,
    pub total: usize,
    pub coverage_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub used_key_count: usize,
    pub locale_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub issue_counts: BTreeMap<IssueKind, usize>,
}

impl ReportSummary {
    fn tally(used_key_count: usize, locale_count: usize, issues: &[Issue]) -> Self {
        let mut summary = Self { used_key_count, locale_count, ..Self::default() };
        for issue in issues {
            *summary.issue_counts.entry(issue.kind).or_default() += 1;
            match issue.severity {
                Severity::Error => summary.error_count += 1,
                Severity::Warning => summary.warning_count += 1,
                Severity::Info => summary.info_count += 1,
            }
        }
        summary
    }
}

/// Snapshot of one validation run. Built once, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    used_keys: BTreeSet<String>,
    per_locale: BTreeMap<String, LocaleCoverage>,
    issues: Vec<Issue>,
    summary: ReportSummary,
}

impl CoverageReport {
    fn new(
        used_keys: BTreeSet<String>,
        per_locale: BTreeMap<String, LocaleCoverage>,
        mut issues: Vec<Issue>,
    ) -> Self {
        sort_issues(&mut issues);
        let summary = ReportSummary::tally(used_keys.len(), per_locale.len(), &issues);
        Self { used_keys, per_locale, issues, summary }
    }

    /// A new report carrying extra issues, e.g. load and scan problems.
    #[must_use]
    pub fn merge_issues(self, extra: impl IntoIterator<Item = Issue>) -> Self {
        let Self { used_keys, per_locale, mut issues, .. } = self;
        issues.extend(extra);
        Self::new(used_keys, per_locale, issues)
    }

    #[must_use]
    pub const fn used_keys(&self) -> &BTreeSet<String> {
        &self.used_keys
    }

    #[must_use]
    pub const fn per_locale(&self) -> &BTreeMap<String, LocaleCoverage> {
        &self.per_locale
    }

    #[must_use]
    pub fn locale(&self, code: &str) -> Option<&LocaleCoverage> {
        self.per_locale.get(code)
    }

    /// Issues in report order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }

    #[must_use]
    pub const fn summary(&self) -> &ReportSummary {
        &self.summary
    }
}

/// Compares used keys with each locale's key space. Performs no I/O.
#[derive(Debug, Clone)]
pub struct CoverageValidator {
    classifier: KeyClassifier,
    separator: String,
    report_unused_keys: bool,
}

impl CoverageValidator {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            classifier: KeyClassifier::from_config(config),
            separator: config.key_separator.clone(),
            report_unused_keys: config.report_unused_keys,
        }
    }

    #[must_use]
    pub fn validate(
        &self,
        usages: &UsageIndex,
        locales: &BTreeMap<String, LocaleNamespace>,
    ) -> CoverageReport {
        let used_keys: BTreeSet<String> = usages.keys().map(String::from).collect();
        let mut issues = Vec::new();
        let mut per_locale = BTreeMap::new();

        for (code, namespace) in locales {
            let coverage = self.check_locale(code, namespace, usages, &mut issues);
            per_locale.insert(code.clone(), coverage);
        }
        issues.extend(self.cross_locale_conflicts(locales));

        tracing::debug!(
            used = used_keys.len(),
            locales = per_locale.len(),
            issues = issues.len(),
            "Validation complete"
        );
        CoverageReport::new(used_keys, per_locale, issues)
    }

    fn check_locale(
        &self,
        code: &str,
        namespace: &LocaleNamespace,
        usages: &UsageIndex,
        issues: &mut Vec<Issue>,
    ) -> LocaleCoverage {
        let missing: BTreeSet<String> =
            usages.keys().filter(|key| !namespace.contains_key(key)).map(String::from).collect();
        for key in &missing {
            issues.push(
                Issue::new(
                    IssueKind::MissingTranslation,
                    format!("Key '{key}' is used but not defined for locale '{code}'"),
                )
                .with_key(key.as_str())
                .with_locale(code)
                .with_locations(usages.call_sites(key).iter().cloned()),
            );
        }

        let mut placeholder_count = 0;
        let mut malformed_count = 0;
        for (key, value) in namespace.iter() {
            let classification = self.classifier.classify(key, value);
            let kind = match classification.class {
                KeyClass::Valid => continue,
                KeyClass::Placeholder => {
                    placeholder_count += 1;
                    IssueKind::PlaceholderContamination
                }
                KeyClass::Malformed => {
                    malformed_count += 1;
                    IssueKind::MalformedValue
                }
            };
            let source = namespace
                .entry(key)
                .map(|entry| format!(" in {}", entry.source.display()))
                .unwrap_or_default();
            issues.push(
                Issue::new(kind, format!("{}{source}", classification.reason))
                    .with_key(key)
                    .with_locale(code),
            );
        }

        for (leaf, child) in namespace.prefix_conflicts(&self.separator) {
            issues.push(
                Issue::new(
                    IssueKind::KeyTypeConflict,
                    format!("'{leaf}' is a value but '{child}' nests beneath it"),
                )
                .with_key(leaf)
                .with_locale(code),
            );
        }

        let unused: BTreeSet<String> =
            namespace.keys().filter(|key| !usages.contains(key)).map(String::from).collect();
        if self.report_unused_keys {
            for key in &unused {
                issues.push(
                    Issue::new(
                        IssueKind::UnusedTranslation,
                        format!("Key '{key}' is defined but never used"),
                    )
                    .with_key(key.as_str())
                    .with_locale(code),
                );
            }
        }

        let used_count = usages.len();
        LocaleCoverage {
            coverage_percent: coverage_percent(used_count, missing.len()),
            missing,
            unused,
            placeholder_count,
            malformed_count,
            total: namespace.len(),
        }
    }

    /// Paths that are a value in one locale and a group in another.
    ///
    /// Conflicts inside a single locale are reported by `check_locale` and
    /// skipped here.
    fn cross_locale_conflicts(&self, locales: &BTreeMap<String, LocaleNamespace>) -> Vec<Issue> {
        let containers: BTreeMap<&str, BTreeSet<String>> = locales
            .iter()
            .map(|(code, namespace)| (code.as_str(), namespace.container_paths(&self.separator)))
            .collect();

        let mut issues = Vec::new();
        for (leaf_code, namespace) in locales {
            let own_containers = containers.get(leaf_code.as_str());
            for key in namespace.keys() {
                if own_containers.is_some_and(|own| own.contains(key)) {
                    continue;
                }
                for (group_code, group_paths) in &containers {
                    if *group_code == leaf_code.as_str()
                        || !group_paths.contains(key)
                        || locales.get(*group_code).is_some_and(|other| other.contains_key(key))
                    {
                        continue;
                    }
                    issues.push(
                        Issue::new(
                            IssueKind::KeyTypeConflict,
                            format!(
                                "'{key}' is a value in locale '{leaf_code}' but a group in locale '{group_code}'"
                            ),
                        )
                        .with_key(key),
                    );
                }
            }
        }
        issues
    }
}

/// Share of used keys that resolve, as a percentage. 100 when nothing is used.
#[allow(clippy::float_arithmetic, clippy::cast_precision_loss)]
#[must_use]
pub fn coverage_percent(used: usize, missing: usize) -> f64 {
    if used == 0 {
        return 100.0;
    }
    let covered = used.saturating_sub(missing);
    100.0 * covered as f64 / used as f64
}
