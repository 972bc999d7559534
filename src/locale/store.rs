//! Loading locale directories into merged namespaces.

use std::collections::BTreeMap;
use std::path::{
    Path,
    PathBuf,
};
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use super::flatten::{
    FlattenedDocument,
    flatten_json,
};
use super::namespace::LocaleNamespace;
use crate::config::EngineConfig;
use crate::issue::{
    Issue,
    IssueKind,
};
use crate::types::SourceLocation;

#[derive(Error, Debug)]
pub enum LocaleError {
    #[error("Failed to read locale file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Locale file {} is larger than {limit} bytes", path.display())]
    TooLarge { path: PathBuf, limit: u64 },

    #[error("Timed out reading locale file {}", path.display())]
    Timeout { path: PathBuf },

    #[error("Failed to parse locale file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Locale file {} must contain a JSON object at the top level", path.display())]
    NotAnObject { path: PathBuf },

    #[error("No locale could be loaded from {}", root.display())]
    NoLocalesLoaded { root: PathBuf },
}

impl LocaleError {
    fn into_issue(self, locale: &str) -> Issue {
        let (kind, location) = match &self {
            Self::Parse { path, source } => (
                IssueKind::MalformedLocaleFile,
                SourceLocation::new(path, u32::try_from(source.line()).unwrap_or(u32::MAX)),
            ),
            Self::NotAnObject { path } => (IssueKind::MalformedLocaleFile, SourceLocation::new(path, 1)),
            Self::Unreadable { path, .. } | Self::TooLarge { path, .. } | Self::Timeout { path } => {
                (IssueKind::FileUnreadable, SourceLocation::new(path, 0))
            }
            Self::NoLocalesLoaded { root } => {
                (IssueKind::LocaleDirectoryMissing, SourceLocation::new(root, 0))
            }
        };
        Issue::new(kind, self.to_string()).with_locale(locale).with_location(location)
    }
}

/// Namespaces for every locale that could be loaded, plus what went wrong.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub namespaces: BTreeMap<String, LocaleNamespace>,
    pub issues: Vec<Issue>,
}

/// Result of loading one locale directory.
#[derive(Debug)]
enum LocaleLoad {
    Missing { code: String, dir: PathBuf },
    Loaded { namespace: LocaleNamespace, issues: Vec<Issue> },
}

/// Reads per-locale directories of JSON documents.
#[derive(Debug, Clone)]
pub struct LocaleStore {
    separator: String,
    overlay_file: String,
    file_extension: String,
    max_file_bytes: u64,
    read_timeout: Duration,
}

impl LocaleStore {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            separator: config.key_separator.clone(),
            overlay_file: config.locales.overlay_file.clone(),
            file_extension: config.locales.file_extension.clone(),
            max_file_bytes: config.locales.max_file_bytes,
            read_timeout: config.scan.read_timeout(),
        }
    }

    /// Path of the overlay document for a locale.
    #[must_use]
    pub fn overlay_path(&self, root_dir: &Path, locale: &str) -> PathBuf {
        root_dir.join(locale).join(&self.overlay_file)
    }

    /// Locale codes present under `root_dir`, i.e. its subdirectory names, sorted.
    pub async fn discover_locales(&self, root_dir: &Path) -> Vec<String> {
        let mut codes = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(root_dir).await else {
            tracing::warn!(root = %root_dir.display(), "Locales directory cannot be listed");
            return codes;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_dir = entry.file_type().await.is_ok_and(|ft| ft.is_dir());
            if is_dir && let Some(name) = entry.file_name().to_str() {
                codes.push(name.to_string());
            }
        }
        codes.sort();
        codes
    }

    /// Loads each locale directory under `root_dir` into one namespace.
    ///
    /// A missing directory or a bad file becomes an issue and loading carries
    /// on. Fails only when not a single locale directory could be found.
    pub async fn load(
        &self,
        locale_codes: &[String],
        root_dir: &Path,
    ) -> Result<LoadOutcome, LocaleError> {
        let codes =
            if locale_codes.is_empty() { self.discover_locales(root_dir).await } else { locale_codes.to_vec() };
        tracing::debug!(root = %root_dir.display(), ?codes, "Loading locales");

        let loads =
            futures::future::join_all(codes.iter().map(|code| self.load_locale(code, root_dir))).await;

        let mut outcome = LoadOutcome::default();
        for load in loads {
            match load {
                LocaleLoad::Missing { code, dir } => {
                    tracing::warn!(locale = %code, dir = %dir.display(), "Locale directory missing");
                    outcome.issues.push(
                        Issue::new(
                            IssueKind::LocaleDirectoryMissing,
                            format!("Locale directory {} does not exist", dir.display()),
                        )
                        .with_locale(code),
                    );
                }
                LocaleLoad::Loaded { namespace, issues } => {
                    outcome.issues.extend(issues);
                    outcome.namespaces.insert(namespace.locale().to_string(), namespace);
                }
            }
        }

        if outcome.namespaces.is_empty() {
            tracing::error!(root = %root_dir.display(), "No locale could be loaded");
            return Err(LocaleError::NoLocalesLoaded { root: root_dir.to_path_buf() });
        }

        tracing::info!(
            locales = outcome.namespaces.len(),
            issues = outcome.issues.len(),
            "Locales loaded"
        );
        Ok(outcome)
    }

    async fn load_locale(&self, code: &str, root_dir: &Path) -> LocaleLoad {
        let dir = root_dir.join(code);
        if !tokio::fs::metadata(&dir).await.is_ok_and(|m| m.is_dir()) {
            return LocaleLoad::Missing { code: code.to_string(), dir };
        }

        let mut namespace = LocaleNamespace::new(code);
        let mut issues = Vec::new();

        for path in self.locale_files(&dir).await {
            let document = match self.read_document(&path).await {
                Ok(document) => document,
                Err(error) => {
                    tracing::warn!(locale = %code, %error, "Skipping locale file");
                    issues.push(error.into_issue(code));
                    continue;
                }
            };
            tracing::debug!(locale = %code, file = %path.display(), keys = document.leaves.len(), "Merging locale file");

            for key in &document.duplicates {
                issues.push(
                    Issue::new(
                        IssueKind::KeyCollision,
                        format!("'{key}' is defined twice in {}; the later definition wins", path.display()),
                    )
                    .with_locale(code)
                    .with_key(key.clone())
                    .with_location(SourceLocation::new(&path, 0)),
                );
            }

            for collision in namespace.merge_document(document, &path) {
                tracing::warn!(
                    locale = %code,
                    key = %collision.key,
                    winner = %collision.winner.display(),
                    "Key defined by more than one file"
                );
                issues.push(
                    Issue::new(
                        IssueKind::KeyCollision,
                        format!(
                            "'{}' in {} is overridden by {}",
                            collision.key,
                            collision.overridden.display(),
                            collision.winner.display()
                        ),
                    )
                    .with_locale(code)
                    .with_key(collision.key)
                    .with_location(SourceLocation::new(collision.winner, 0)),
                );
            }
        }

        LocaleLoad::Loaded { namespace, issues }
    }

    /// Data files of one locale directory in merge order: sorted by file
    /// name, with the overlay file always last.
    async fn locale_files(&self, dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let mut overlay = None;
        let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
            return files;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let is_file = entry.file_type().await.is_ok_and(|ft| ft.is_file());
            let has_extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.file_extension));
            if !is_file || !has_extension {
                continue;
            }
            if entry.file_name().to_str() == Some(self.overlay_file.as_str()) {
                overlay = Some(path);
            } else {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        files.extend(overlay);
        files
    }

    async fn read_document(&self, path: &Path) -> Result<FlattenedDocument, LocaleError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|source| LocaleError::Unreadable { path: path.to_path_buf(), source })?;
        if metadata.len() > self.max_file_bytes {
            return Err(LocaleError::TooLarge { path: path.to_path_buf(), limit: self.max_file_bytes });
        }

        let content = tokio::time::timeout(self.read_timeout, tokio::fs::read_to_string(path))
            .await
            .map_err(|_| LocaleError::Timeout { path: path.to_path_buf() })?
            .map_err(|source| LocaleError::Unreadable { path: path.to_path_buf(), source })?;

        parse_document(&content, path, &self.separator)
    }
}

/// Parses and flattens one locale document.
pub fn parse_document(
    content: &str,
    path: &Path,
    separator: &str,
) -> Result<FlattenedDocument, LocaleError> {
    let json: Value = serde_json::from_str(content)
        .map_err(|source| LocaleError::Parse { path: path.to_path_buf(), source })?;
    if !json.is_object() {
        return Err(LocaleError::NotAnObject { path: path.to_path_buf() });
    }
    Ok(flatten_json(&json, separator))
}
