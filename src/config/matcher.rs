//! File matcher for source scanning.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::ScanConfig;

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// Decides which directories are pruned and which files are scanned.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    source_root: PathBuf,
    extensions: HashSet<String>,
    exclude_dirs: HashSet<String>,
    exclude_set: GlobSet,
}

impl FileMatcher {
    pub fn new(source_root: PathBuf, settings: &ScanConfig) -> Result<Self, MatcherError> {
        let exclude_set = Self::build_glob_set(&settings.exclude_patterns, |pattern, source| {
            MatcherError::InvalidExcludePattern { pattern, source }
        })?;

        Ok(Self {
            source_root,
            extensions: settings.extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
            exclude_dirs: settings.exclude_dirs.iter().cloned().collect(),
            exclude_set,
        })
    }

    fn build_glob_set<F>(patterns: &[String], make_error: F) -> Result<GlobSet, MatcherError>
    where
        F: Fn(String, globset::Error) -> MatcherError,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| make_error(pattern.clone(), e))?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }

    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Returns true if a directory with this name must not be descended into.
    #[must_use]
    pub fn is_excluded_dir(&self, name: &OsStr) -> bool {
        name.to_str().is_some_and(|name| self.exclude_dirs.contains(name))
    }

    /// Returns true if the path has a scanned extension and matches no exclude pattern.
    ///
    /// The path must be absolute and under the source root.
    #[must_use]
    pub fn is_source_file(&self, absolute_path: &Path) -> bool {
        let Some(relative_path) = absolute_path.strip_prefix(&self.source_root).ok() else {
            return false;
        };

        self.is_source_file_relative(relative_path)
    }

    /// Same as [`Self::is_source_file`] for a path relative to the source root.
    #[must_use]
    pub fn is_source_file_relative(&self, relative_path: &Path) -> bool {
        let has_extension = relative_path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| self.extensions.contains(&ext.to_ascii_lowercase()));

        has_extension && !self.exclude_set.is_match(relative_path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::path::PathBuf;

    use rstest::rstest;

    use super::*;

    fn create_settings(extensions: &[&str], exclude_patterns: &[&str]) -> ScanConfig {
        ScanConfig {
            extensions: extensions.iter().copied().map(String::from).collect(),
            exclude_patterns: exclude_patterns.iter().copied().map(String::from).collect(),
            ..ScanConfig::default()
        }
    }

    #[rstest]
    fn is_source_file_with_default_settings() {
        let matcher = FileMatcher::new(PathBuf::from("/workspace/src"), &ScanConfig::default())
            .expect("valid patterns");

        assert!(matcher.is_source_file(Path::new("/workspace/src/index.ts")));
        assert!(matcher.is_source_file(Path::new("/workspace/src/App.TSX")));
        assert!(matcher.is_source_file(Path::new("/workspace/src/views/Home.vue")));

        assert!(!matcher.is_source_file(Path::new("/workspace/src/README.md")));
        assert!(!matcher.is_source_file(Path::new("/workspace/src/locales/en.json")));
    }

    #[rstest]
    fn is_source_file_with_exclude_patterns() {
        let settings = create_settings(&["ts"], &["**/*.spec.ts", "generated/**"]);
        let matcher =
            FileMatcher::new(PathBuf::from("/workspace"), &settings).expect("valid patterns");

        assert!(matcher.is_source_file(Path::new("/workspace/app/index.ts")));
        assert!(!matcher.is_source_file(Path::new("/workspace/app/index.spec.ts")));
        assert!(!matcher.is_source_file(Path::new("/workspace/generated/api.ts")));
    }

    #[rstest]
    fn is_source_file_outside_root() {
        let matcher = FileMatcher::new(PathBuf::from("/workspace"), &ScanConfig::default())
            .expect("valid patterns");

        assert!(!matcher.is_source_file(Path::new("/other/src/index.ts")));
    }

    #[rstest]
    #[case::node_modules("node_modules", true)]
    #[case::git(".git", true)]
    #[case::dist("dist", true)]
    #[case::components("components", false)]
    #[case::partial_name("node_modules_backup", false)]
    fn is_excluded_dir_matches_whole_names(#[case] name: &str, #[case] expected: bool) {
        let matcher = FileMatcher::new(PathBuf::from("/workspace"), &ScanConfig::default())
            .expect("valid patterns");

        assert_eq!(matcher.is_excluded_dir(OsStr::new(name)), expected);
    }

    #[rstest]
    fn new_with_invalid_exclude_pattern() {
        let settings = create_settings(&["ts"], &["[invalid"]);

        let result = FileMatcher::new(PathBuf::from("/workspace"), &settings);

        assert!(matches!(result, Err(MatcherError::InvalidExcludePattern { .. })));
    }

    #[rstest]
    fn source_root_accessor() {
        let matcher = FileMatcher::new(PathBuf::from("/workspace"), &ScanConfig::default())
            .expect("valid patterns");

        assert_eq!(matcher.source_root(), Path::new("/workspace"));
    }
}
