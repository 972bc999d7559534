//! Drafting values for missing keys and writing them to the overlay file.

mod terms;

use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::path::{
    Path,
    PathBuf,
};

use jsonc_parser::ParseOptions;
use jsonc_parser::cst::{
    CstInputValue,
    CstRootNode,
};
pub use terms::{
    Term,
    TermLanguage,
    lookup,
    split_words,
    translate_segment,
};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::issue::{
    Issue,
    IssueKind,
    Severity,
};
use crate::locale::{
    LocaleError,
    LocaleNamespace,
    UnflattenError,
    parse_document,
    unflatten,
};
use crate::types::LeafValue;
use crate::validator::CoverageReport;

/// Prefix of generated values. The classifier flags it through the `todo` marker.
pub const PLACEHOLDER_TAG: &str = "[TODO]";

#[derive(Error, Debug)]
pub enum RemediationError {
    #[error("Failed to read overlay file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write overlay file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Overlay file {} is not a JSON object and cannot be updated", path.display())]
    OverlayParse { path: PathBuf },

    /// The overlay exists but the locale loader rejects it, so keys written
    /// to it would never be read back.
    #[error("Overlay file is left untouched until it loads cleanly: {source}")]
    OverlayUnloadable {
        #[source]
        source: LocaleError,
    },

    #[error("Overlay for {} would be inconsistent: {source}", path.display())]
    Conflict {
        path: PathBuf,
        #[source]
        source: UnflattenError,
    },

    #[error("Failed to serialise overlay {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Keys to add to one locale's overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayAdditions {
    pub overlay_path: PathBuf,
    pub entries: BTreeMap<String, LeafValue>,
}

/// What a remediation run intends to write. Nothing is on disk yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemediationPlan {
    additions: BTreeMap<String, OverlayAdditions>,
    issues: Vec<Issue>,
}

impl RemediationPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.values().all(|additions| additions.entries.is_empty())
    }

    /// Number of keys across all locales.
    #[must_use]
    pub fn total(&self) -> usize {
        self.additions.values().map(|additions| additions.entries.len()).sum()
    }

    #[must_use]
    pub fn additions_for(&self, locale: &str) -> Option<&OverlayAdditions> {
        self.additions.get(locale)
    }

    pub fn additions(&self) -> impl Iterator<Item = (&str, &OverlayAdditions)> {
        self.additions.iter().map(|(locale, additions)| (locale.as_str(), additions))
    }

    /// Keys that could not be added, as `KEY_TYPE_CONFLICT` warnings.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }
}

/// Plan plus the namespaces it would produce.
#[derive(Debug, Clone)]
pub struct Remediation {
    pub plan: RemediationPlan,
    pub namespaces: BTreeMap<String, LocaleNamespace>,
}

/// Drafts a value for every missing key, one locale at a time.
#[derive(Debug, Clone)]
pub struct Remediator {
    separator: String,
    locales_dir: PathBuf,
    overlay_file: String,
}

impl Remediator {
    #[must_use]
    pub fn new(config: &EngineConfig, locales_dir: PathBuf) -> Self {
        Self {
            separator: config.key_separator.clone(),
            locales_dir,
            overlay_file: config.locales.overlay_file.clone(),
        }
    }

    #[must_use]
    pub fn overlay_path(&self, locale: &str) -> PathBuf {
        self.locales_dir.join(locale).join(&self.overlay_file)
    }

    /// Value drafted for `key` in `locale`: a table translation for English
    /// and Spanish when every word is known, a tagged placeholder otherwise.
    #[must_use]
    pub fn synthesize(&self, key: &str, locale: &str) -> String {
        let segment = key.rsplit(self.separator.as_str()).next().unwrap_or(key);
        TermLanguage::from_locale(locale)
            .and_then(|language| translate_segment(segment, language))
            .unwrap_or_else(|| format!("{PLACEHOLDER_TAG} {}", key.replace(&self.separator, " ")))
    }

    /// Builds new namespaces with a value for each `MISSING_TRANSLATION` issue.
    ///
    /// Input namespaces are left untouched. Keys whose path clashes with an
    /// existing value or group are skipped and reported.
    #[must_use]
    pub fn remediate(
        &self,
        report: &CoverageReport,
        locales: &BTreeMap<String, LocaleNamespace>,
    ) -> Remediation {
        let mut missing: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for issue in report.issues_of(IssueKind::MissingTranslation) {
            if let (Some(locale), Some(key)) = (issue.locale.as_deref(), issue.key.as_deref()) {
                missing.entry(locale).or_default().insert(key);
            }
        }

        let mut namespaces = locales.clone();
        let mut plan = RemediationPlan::default();
        for (locale, keys) in missing {
            let Some(namespace) = namespaces.get_mut(locale) else {
                continue;
            };
            let overlay_path = self.overlay_path(locale);
            let mut entries = BTreeMap::new();
            let mut containers = namespace.container_paths(&self.separator);

            for key in keys {
                if namespace.contains_key(key) {
                    continue;
                }
                if let Some(reason) = self.path_conflict(key, namespace, &containers) {
                    tracing::warn!(locale, key, "Not remediating: {reason}");
                    plan.issues.push(
                        Issue::new(IssueKind::KeyTypeConflict, format!("Not remediated: {reason}"))
                            .with_severity(Severity::Warning)
                            .with_key(key)
                            .with_locale(locale),
                    );
                    continue;
                }

                let value = LeafValue::Text(self.synthesize(key, locale));
                namespace.insert(key, value.clone(), &overlay_path);
                containers.extend(prefixes(key, &self.separator).map(String::from));
                entries.insert(key.to_string(), value);
            }

            tracing::info!(locale, added = entries.len(), "Drafted missing translations");
            plan.additions.insert(locale.to_string(), OverlayAdditions { overlay_path, entries });
        }

        Remediation { plan, namespaces }
    }

    fn path_conflict(
        &self,
        key: &str,
        namespace: &LocaleNamespace,
        containers: &BTreeSet<String>,
    ) -> Option<String> {
        if containers.contains(key) {
            return Some(format!("'{key}' is already a group of values"));
        }
        prefixes(key, &self.separator)
            .find(|prefix| namespace.contains_key(prefix))
            .map(|prefix| format!("'{prefix}' is a value, so '{key}' cannot nest beneath it"))
    }
}

fn prefixes<'a>(key: &'a str, separator: &'a str) -> impl Iterator<Item = &'a str> {
    key.match_indices(separator).filter_map(|(index, _)| key.get(..index))
}

/// Persists a plan to the overlay files and nothing else.
#[derive(Debug, Clone)]
pub struct OverlayWriter {
    separator: String,
}

impl OverlayWriter {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self { separator: config.key_separator.clone() }
    }

    /// Writes every locale with additions and returns the files written.
    ///
    /// Locales with nothing to add are not touched, so their overlay keeps
    /// its modification time. Every overlay is rendered before the first
    /// write, so a rejected overlay leaves all files as they were.
    pub async fn persist(&self, plan: &RemediationPlan) -> Result<Vec<PathBuf>, RemediationError> {
        let mut rendered = Vec::new();
        for (locale, additions) in plan.additions() {
            if additions.entries.is_empty() {
                continue;
            }
            let path = &additions.overlay_path;
            let content = match tokio::fs::read_to_string(path).await {
                Ok(existing) => self.edit_existing(path, &existing, &additions.entries)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    self.render_new(path, &additions.entries)?
                }
                Err(source) => return Err(RemediationError::Read { path: path.clone(), source }),
            };
            rendered.push((locale, additions, content));
        }

        let mut written = Vec::new();
        for (locale, additions, content) in rendered {
            let path = &additions.overlay_path;
            write_file(path, &content).await?;
            tracing::info!(locale, path = %path.display(), keys = additions.entries.len(), "Updated overlay");
            written.push(path.clone());
        }
        Ok(written)
    }

    fn render_new(
        &self,
        path: &Path,
        entries: &BTreeMap<String, LeafValue>,
    ) -> Result<String, RemediationError> {
        let document = unflatten(entries, &self.separator)
            .map_err(|source| RemediationError::Conflict { path: path.to_path_buf(), source })?;
        let mut content = serde_json::to_string_pretty(&document)
            .map_err(|source| RemediationError::Serialize { path: path.to_path_buf(), source })?;
        content.push('\n');
        Ok(content)
    }

    fn edit_existing(
        &self,
        path: &Path,
        existing: &str,
        entries: &BTreeMap<String, LeafValue>,
    ) -> Result<String, RemediationError> {
        if existing.trim().is_empty() {
            return self.render_new(path, entries);
        }
        // Same acceptance rule as the loader: strict JSON with an object root.
        parse_document(existing, path, &self.separator)
            .map_err(|source| RemediationError::OverlayUnloadable { source })?;
        entries.iter().try_fold(existing.to_string(), |text, (key, value)| {
            insert_key_to_json_text(&text, key, value, &self.separator)
                .ok_or_else(|| RemediationError::OverlayParse { path: path.to_path_buf() })
        })
    }
}

/// Sets a key through the CST so existing formatting survives. A property
/// that is already present is overwritten in place, never duplicated.
#[must_use]
pub fn insert_key_to_json_text(
    json_text: &str,
    key: &str,
    value: &LeafValue,
    separator: &str,
) -> Option<String> {
    let root = CstRootNode::parse(json_text, &ParseOptions::default()).ok()?;
    if root.value().is_some() && root.object_value().is_none() {
        return None;
    }

    let mut current = root.object_value_or_set();
    let mut parts = key.split(separator).peekable();
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            let value = to_cst_value(&value.to_json());
            if let Some(existing) = current.get(part) {
                existing.set_value(value);
            } else {
                current.append(part, value);
            }
        } else {
            current = current.object_value_or_set(part);
        }
    }

    Some(root.to_string())
}

fn to_cst_value(value: &serde_json::Value) -> CstInputValue {
    match value {
        serde_json::Value::Null => CstInputValue::Null,
        serde_json::Value::Bool(b) => CstInputValue::Bool(*b),
        serde_json::Value::Number(n) => CstInputValue::Number(n.to_string()),
        serde_json::Value::String(s) => CstInputValue::String(s.clone()),
        serde_json::Value::Array(items) => {
            CstInputValue::Array(items.iter().map(to_cst_value).collect())
        }
        serde_json::Value::Object(map) => CstInputValue::Object(
            map.iter().map(|(key, value)| (key.clone(), to_cst_value(value))).collect(),
        ),
    }
}

/// Writes a sibling temp file, then renames it over `path`.
async fn write_file(path: &Path, content: &str) -> Result<(), RemediationError> {
    let to_error = |source| RemediationError::Write { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(to_error)?;
    }
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);
    tokio::fs::write(&temp, content).await.map_err(to_error)?;
    tokio::fs::rename(&temp, path).await.map_err(to_error)
}
