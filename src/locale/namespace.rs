//! Merged key space for one locale.

use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::path::{
    Path,
    PathBuf,
};

use serde::Serialize;

use super::flatten::{
    FlattenedDocument,
    find_prefix_conflicts,
};
use crate::types::LeafValue;

/// A value and the file it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleEntry {
    pub value: LeafValue,
    pub source: PathBuf,
}

/// A key defined by two files of the same locale; the later file won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    pub key: String,
    pub overridden: PathBuf,
    pub winner: PathBuf,
}

/// Flat mapping from translation key to value for one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleNamespace {
    locale: String,
    entries: BTreeMap<String, LocaleEntry>,
}

impl LocaleNamespace {
    #[must_use]
    pub fn new(locale: impl Into<String>) -> Self {
        Self { locale: locale.into(), entries: BTreeMap::new() }
    }

    /// Builds a namespace from in-memory pairs, attributing them to `source`.
    #[must_use]
    pub fn from_pairs<K, V>(
        locale: impl Into<String>,
        source: impl AsRef<Path>,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<LeafValue>,
    {
        let mut namespace = Self::new(locale);
        for (key, value) in pairs {
            namespace.insert(key, value.into(), source.as_ref());
        }
        namespace
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LeafValue> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&LocaleEntry> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LeafValue)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), &entry.value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts or replaces a key, returning the replaced entry.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: LeafValue,
        source: &Path,
    ) -> Option<LocaleEntry> {
        self.entries.insert(key.into(), LocaleEntry { value, source: source.to_path_buf() })
    }

    /// Right-biased merge of one flattened document.
    ///
    /// Every key already defined by an earlier document is overwritten and
    /// reported as a collision.
    pub fn merge_document(&mut self, document: FlattenedDocument, source: &Path) -> Vec<KeyCollision> {
        let mut collisions = Vec::new();
        for (key, value) in document.leaves {
            if let Some(previous) = self.insert(key.clone(), value, source) {
                collisions.push(KeyCollision {
                    key,
                    overridden: previous.source,
                    winner: source.to_path_buf(),
                });
            }
        }
        collisions
    }

    /// Plain key to value map, e.g. for serializing with `unflatten`.
    #[must_use]
    pub fn to_leaf_map(&self) -> BTreeMap<String, LeafValue> {
        self.entries.iter().map(|(key, entry)| (key.clone(), entry.value.clone())).collect()
    }

    /// Every path that some key in this locale nests beneath.
    #[must_use]
    pub fn container_paths(&self, separator: &str) -> BTreeSet<String> {
        let mut containers = BTreeSet::new();
        for key in self.entries.keys() {
            for (index, _) in key.match_indices(separator) {
                if let Some(prefix) = key.get(..index) {
                    containers.insert(prefix.to_string());
                }
            }
        }
        containers
    }

    /// `(leaf, child)` pairs where a key is a value and a group at once.
    #[must_use]
    pub fn prefix_conflicts(&self, separator: &str) -> Vec<(String, String)> {
        find_prefix_conflicts(self.keys(), separator)
    }
}
