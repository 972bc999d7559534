//! Report issues and their stable ordering.

use std::cmp::Ordering;
use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

use crate::types::SourceLocation;

/// Stable tag identifying what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    MissingTranslation,
    PlaceholderContamination,
    MalformedValue,
    LocaleDirectoryMissing,
    KeyTypeConflict,
    MalformedLocaleFile,
    FileUnreadable,
    KeyCollision,
    UnusedTranslation,
}

impl IssueKind {
    /// The tag as it appears in JSON reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingTranslation => "MISSING_TRANSLATION",
            Self::PlaceholderContamination => "PLACEHOLDER_CONTAMINATION",
            Self::MalformedValue => "MALFORMED_VALUE",
            Self::LocaleDirectoryMissing => "LOCALE_DIRECTORY_MISSING",
            Self::KeyTypeConflict => "KEY_TYPE_CONFLICT",
            Self::MalformedLocaleFile => "MALFORMED_LOCALE_FILE",
            Self::FileUnreadable => "FILE_UNREADABLE",
            Self::KeyCollision => "KEY_COLLISION",
            Self::UnusedTranslation => "UNUSED_TRANSLATION",
        }
    }

    /// Default severity attached when the issue is raised.
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::MissingTranslation | Self::PlaceholderContamination | Self::KeyTypeConflict => {
                Severity::Error
            }
            Self::MalformedValue
            | Self::LocaleDirectoryMissing
            | Self::MalformedLocaleFile
            | Self::FileUnreadable
            | Self::KeyCollision => Severity::Warning,
            Self::UnusedTranslation => Severity::Info,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Issue severity. Declaration order is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.pad("error"),
            Self::Warning => f.pad("warning"),
            Self::Info => f.pad("info"),
        }
    }
}

/// One entry in a coverage report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub detail: String,
    /// Where the problem was observed (call sites for missing keys, the
    /// offending file for load and scan problems).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<SourceLocation>,
}

impl Issue {
    #[must_use]
    pub fn new(kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            key: None,
            locale: None,
            detail: detail.into(),
            locations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.locations.push(location);
        self
    }

    #[must_use]
    pub fn with_locations(mut self, locations: impl IntoIterator<Item = SourceLocation>) -> Self {
        self.locations.extend(locations);
        self
    }

    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Report order: severity, then locale, then key. Issues without a
    /// locale or key sort before those with one.
    #[must_use]
    pub fn report_order(&self, other: &Self) -> Ordering {
        self.severity
            .cmp(&other.severity)
            .then_with(|| self.locale.cmp(&other.locale))
            .then_with(|| self.key.cmp(&other.key))
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.detail.cmp(&other.detail))
    }
}

/// Sorts issues into report order.
pub fn sort_issues(issues: &mut [Issue]) {
    issues.sort_by(Issue::report_order);
}
