//! Mapping a coverage report to pass or fail.

use std::process::ExitCode;

use crate::config::Policy;
use crate::issue::IssueKind;
use crate::validator::CoverageReport;

/// One broken threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// `None` for run-wide violations.
    pub locale: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub passed: bool,
    pub exit_code: u8,
    pub summary: String,
    pub violations: Vec<Violation>,
}

impl GateDecision {
    #[must_use]
    pub fn process_exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_code)
    }

    /// Prints the grouped issue list and the verdict to stdout.
    #[allow(clippy::print_stdout)]
    pub fn announce(&self, report: &CoverageReport) {
        print!("{}", super::render_text(report, self));
    }
}

/// Applies a [`Policy`] to reports.
#[derive(Debug, Clone, Copy)]
pub struct Gate {
    policy: Policy,
}

impl Gate {
    #[must_use]
    pub const fn new(policy: Policy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &Policy {
        &self.policy
    }

    #[must_use]
    pub fn decide(&self, report: &CoverageReport) -> GateDecision {
        let policy = &self.policy;
        let mut violations = Vec::new();

        for (locale, coverage) in report.per_locale() {
            let mut violate = |message: String| {
                violations.push(Violation { locale: Some(locale.clone()), message });
            };

            if let Some(max) = policy.max_missing
                && coverage.missing.len() > max
            {
                violate(format!("{} missing translations (allowed {max})", coverage.missing.len()));
            }
            if let Some(max) = policy.max_placeholders
                && coverage.placeholder_count > max
            {
                violate(format!("{} placeholder values (allowed {max})", coverage.placeholder_count));
            }
            if let Some(min) = policy.min_coverage_percent
                && coverage.coverage_percent < min
            {
                violate(format!("coverage {:.1}% is below {min}%", coverage.coverage_percent));
            }
            if policy.treat_malformed_as_fatal && coverage.malformed_count > 0 {
                violate(format!("{} malformed values", coverage.malformed_count));
            }
        }

        if policy.treat_malformed_as_fatal {
            let malformed_files = report.issues_of(IssueKind::MalformedLocaleFile).count();
            if malformed_files > 0 {
                violations.push(Violation {
                    locale: None,
                    message: format!("{malformed_files} malformed locale files"),
                });
            }
        }
        if policy.treat_conflicts_as_fatal {
            let conflicts = report.issues_of(IssueKind::KeyTypeConflict).count();
            if conflicts > 0 {
                violations.push(Violation {
                    locale: None,
                    message: format!("{conflicts} key type conflicts"),
                });
            }
        }

        let passed = violations.is_empty();
        let summary = summarize(report, passed, violations.len());
        GateDecision { passed, exit_code: u8::from(!passed), summary, violations }
    }
}

fn summarize(report: &CoverageReport, passed: bool, violation_count: usize) -> String {
    let counts = report.summary();
    let verdict = if passed { "PASS" } else { "FAIL" };
    let mut summary = format!(
        "{verdict}: {} used keys across {} locales, {} errors, {} warnings",
        counts.used_key_count, counts.locale_count, counts.error_count, counts.warning_count
    );
    if !passed {
        summary.push_str(&format!(", {violation_count} policy violations"));
    }
    summary
}
