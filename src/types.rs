//! Core types used throughout the project.

use std::fmt;
use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;

/// A dot-delimited path identifying one leaf value (e.g. `clinical.notes.title`).
pub type TranslationKey = String;

/// A position in a source file (1-indexed line).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
}

impl SourceLocation {
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self { file: file.into(), line }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// A translation key referenced from source code at a specific file and line.
///
/// Ordering is `(key, file, line)` so a sorted set groups call sites by key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UsageKey {
    pub key: TranslationKey,
    #[serde(flatten)]
    pub location: SourceLocation,
}

impl UsageKey {
    #[must_use]
    pub fn new(key: impl Into<TranslationKey>, file: impl Into<PathBuf>, line: u32) -> Self {
        Self { key: key.into(), location: SourceLocation::new(file, line) }
    }
}

/// A leaf value in a locale document.
///
/// Arrays are terminal and opaque: they are never descended into and are
/// excluded from text heuristics. Empty objects are kept as opaque leaves so
/// that flattening stays reversible. Any other non-string JSON value is a
/// scalar, which the classifier reports as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LeafValue {
    Text(String),
    Opaque(Value),
    Scalar(Value),
}

impl LeafValue {
    /// Wraps a terminal JSON value. Non-empty objects are not leaves and
    /// must be flattened before reaching here.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Opaque(value.clone()),
            _ => Self::Scalar(value.clone()),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Opaque(v) | Self::Scalar(v) => v.clone(),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Opaque(_) | Self::Scalar(_) => None,
        }
    }
}

impl From<&str> for LeafValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}
