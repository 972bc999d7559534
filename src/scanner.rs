//! Source tree traversal and translation key extraction.

mod rules;

use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;
use std::time::Duration;

use ignore::WalkBuilder;
pub use rules::{
    ExtractionRule,
    PatternRule,
    RuleMatch,
    RuleSet,
};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::{
    EngineConfig,
    FileMatcher,
    MatcherError,
};
use crate::issue::{
    Issue,
    IssueKind,
};
use crate::types::{
    SourceLocation,
    UsageKey,
};

/// Number of call sites kept per key for diagnostics.
pub const MAX_CALL_SITES: usize = 3;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source root {} does not exist", .0.display())]
    MissingRoot(PathBuf),

    #[error(transparent)]
    Matcher(#[from] MatcherError),

    #[error("File discovery task failed: {0}")]
    Discovery(#[from] tokio::task::JoinError),
}

/// Reasons a single file could not be scanned.
#[derive(Error, Debug)]
enum FileScanError {
    #[error("Failed to read source file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source file {} is larger than {limit} bytes", path.display())]
    TooLarge { path: PathBuf, limit: u64 },

    #[error("Timed out reading source file {}", path.display())]
    Timeout { path: PathBuf },

    #[error("Source file {} is not valid UTF-8", path.display())]
    NotUtf8 { path: PathBuf },
}

impl FileScanError {
    fn into_issue(self) -> Issue {
        let path = match &self {
            Self::Unreadable { path, .. }
            | Self::TooLarge { path, .. }
            | Self::Timeout { path }
            | Self::NotUtf8 { path } => path.clone(),
        };
        Issue::new(IssueKind::FileUnreadable, self.to_string())
            .with_location(SourceLocation::new(path, 0))
    }
}

/// Everything one pass over the source tree produced.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Deduplicated by `(key, file, line)`.
    pub usages: BTreeSet<UsageKey>,
    pub issues: Vec<Issue>,
    pub files_scanned: usize,
}

impl ScanOutcome {
    #[must_use]
    pub fn index(&self) -> UsageIndex {
        UsageIndex::from_usages(self.usages.iter().cloned())
    }
}

/// Used keys and where they are called from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageIndex {
    sites: BTreeMap<String, Vec<SourceLocation>>,
}

impl UsageIndex {
    #[must_use]
    pub fn from_usages(usages: impl IntoIterator<Item = UsageKey>) -> Self {
        let mut sites: BTreeMap<String, Vec<SourceLocation>> = BTreeMap::new();
        for usage in usages {
            sites.entry(usage.key).or_default().push(usage.location);
        }
        for locations in sites.values_mut() {
            locations.sort();
            locations.dedup();
        }
        Self { sites }
    }

    /// Index with no call-site information, e.g. for tests or callers that
    /// already have a key set.
    #[must_use]
    pub fn from_keys<K: Into<String>>(keys: impl IntoIterator<Item = K>) -> Self {
        Self { sites: keys.into_iter().map(|key| (key.into(), Vec::new())).collect() }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sites.keys().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.sites.contains_key(key)
    }

    /// The first few call sites of a key in file/line order.
    #[must_use]
    pub fn call_sites(&self, key: &str) -> &[SourceLocation] {
        self.sites
            .get(key)
            .and_then(|locations| locations.get(..locations.len().min(MAX_CALL_SITES)))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct ReadLimits {
    max_file_bytes: u64,
    timeout: Duration,
}

/// Walks a source root and extracts every translation key reference.
///
/// Scanning is restartable: each call to [`SourceScanner::scan`] does a
/// fresh pass and shares no state with earlier ones.
#[derive(Debug, Clone)]
pub struct SourceScanner {
    matcher: FileMatcher,
    rules: Arc<RuleSet>,
    respect_gitignore: bool,
    limits: ReadLimits,
    num_threads: usize,
}

impl SourceScanner {
    pub fn new(source_root: PathBuf, config: &EngineConfig) -> Result<Self, ScanError> {
        Ok(Self {
            matcher: FileMatcher::new(source_root, &config.scan)?,
            rules: Arc::new(RuleSet::builtin()),
            respect_gitignore: config.scan.respect_gitignore,
            limits: ReadLimits {
                max_file_bytes: config.scan.max_file_bytes,
                timeout: config.scan.read_timeout(),
            },
            num_threads: config.indexing.effective_threads(),
        })
    }

    /// Replaces the extraction rules.
    #[must_use]
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    #[must_use]
    pub fn source_root(&self) -> &Path {
        self.matcher.source_root()
    }

    /// Scans every matching file under the source root.
    ///
    /// Unreadable files become `FILE_UNREADABLE` issues; the pass always
    /// completes. Fails only when the source root itself is absent.
    pub async fn scan(&self) -> Result<ScanOutcome, ScanError> {
        let root = self.source_root().to_path_buf();
        if !tokio::fs::metadata(&root).await.is_ok_and(|m| m.is_dir()) {
            return Err(ScanError::MissingRoot(root));
        }

        let matcher = self.matcher.clone();
        let respect_gitignore = self.respect_gitignore;
        let files =
            tokio::task::spawn_blocking(move || find_source_files(&matcher, respect_gitignore))
                .await?;
        tracing::debug!(root = %root.display(), files = files.len(), "Found source files");

        let semaphore = Arc::new(Semaphore::new(self.num_threads));
        let mut tasks = JoinSet::new();
        for path in files {
            let semaphore = Arc::clone(&semaphore);
            let rules = Arc::clone(&self.rules);
            let limits = self.limits;
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                scan_file(path, &rules, limits).await
            });
        }

        let mut outcome = ScanOutcome::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(Some(usages))) => {
                    outcome.files_scanned += 1;
                    outcome.usages.extend(usages);
                }
                Ok(Ok(None)) => {}
                Ok(Err(error)) => {
                    tracing::warn!("{error}");
                    outcome.issues.push(error.into_issue());
                }
                Err(error) => tracing::warn!(?error, "Scan task failed"),
            }
        }

        tracing::info!(
            files = outcome.files_scanned,
            usages = outcome.usages.len(),
            skipped = outcome.issues.len(),
            "Source scan complete"
        );
        Ok(outcome)
    }
}

/// Lists files to scan, pruning excluded directories before descending.
fn find_source_files(matcher: &FileMatcher, respect_gitignore: bool) -> Vec<PathBuf> {
    let prune = matcher.clone();
    let mut found_files = Vec::new();

    for result in WalkBuilder::new(matcher.source_root())
        .hidden(false)
        .git_ignore(respect_gitignore)
        .git_global(respect_gitignore)
        .git_exclude(respect_gitignore)
        .require_git(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir && entry.depth() > 0 && prune.is_excluded_dir(entry.file_name()))
        })
        .build()
    {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(?err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        if matcher.is_source_file(entry.path()) {
            found_files.push(entry.into_path());
        }
    }

    found_files.sort();
    found_files
}

/// Reads and scans one file. `Ok(None)` means the file was skipped as binary.
async fn scan_file(
    path: PathBuf,
    rules: &RuleSet,
    limits: ReadLimits,
) -> Result<Option<Vec<UsageKey>>, FileScanError> {
    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|source| FileScanError::Unreadable { path: path.clone(), source })?;
    if metadata.len() > limits.max_file_bytes {
        return Err(FileScanError::TooLarge { path, limit: limits.max_file_bytes });
    }

    let bytes = match tokio::time::timeout(limits.timeout, tokio::fs::read(&path)).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(source)) => return Err(FileScanError::Unreadable { path, source }),
        Err(_) => return Err(FileScanError::Timeout { path }),
    };

    if bytes.contains(&0) {
        tracing::debug!(path = %path.display(), "Skipping binary file");
        return Ok(None);
    }

    let Ok(text) = String::from_utf8(bytes) else {
        return Err(FileScanError::NotUtf8 { path });
    };

    let usages = extract_usages(&text, &path, rules);
    tracing::debug!(path = %path.display(), usages = usages.len(), "Scanned file");
    Ok(Some(usages))
}

/// Applies every rule to `text`, attributing matches to `path`.
#[must_use]
pub fn extract_usages(text: &str, path: &Path, rules: &RuleSet) -> Vec<UsageKey> {
    let unique: BTreeSet<UsageKey> = rules
        .extract_all(text)
        .into_iter()
        .map(|found| UsageKey::new(found.key, path, found.line))
        .collect();
    unique.into_iter().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use tempfile::TempDir;

    use super::*;

    fn write(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn scanner(root: &Path) -> SourceScanner {
        SourceScanner::new(root.to_path_buf(), &EngineConfig::default()).unwrap()
    }

    fn used_keys(outcome: &ScanOutcome) -> Vec<String> {
        outcome.index().keys().map(String::from).collect()
    }

    #[tokio::test]
    async fn scan_collects_keys_from_matching_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "App.tsx", b"export const App = () => <p>{t('app.title')}</p>;\n");
        write(temp.path(), "views/Home.vue", b"<h1>{{ $t('home.heading') }}</h1>\n");
        write(temp.path(), "notes.md", b"t('not.scanned')\n");

        let outcome = scanner(temp.path()).scan().await.unwrap();

        assert_that!(used_keys(&outcome), elements_are![eq("app.title"), eq("home.heading")]);
        assert_that!(outcome.files_scanned, eq(2));
        assert_that!(outcome.issues, is_empty());
    }

    #[tokio::test]
    async fn scan_prunes_excluded_directories() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/index.ts", b"t('kept.key')");
        write(temp.path(), "node_modules/lib/index.js", b"t('vendor.key')");
        write(temp.path(), "src/dist/bundle.js", b"t('built.key')");

        let outcome = scanner(temp.path()).scan().await.unwrap();

        assert_that!(used_keys(&outcome), elements_are![eq("kept.key")]);
    }

    #[tokio::test]
    async fn scan_deduplicates_same_site_found_by_two_rules() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.ts", b"translate('x.y')\nt('x.y')\nt('x.y')\n");

        let outcome = scanner(temp.path()).scan().await.unwrap();

        let lines: Vec<u32> = outcome.usages.iter().map(|u| u.location.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert_that!(outcome.index().len(), eq(1));
    }

    #[tokio::test]
    async fn scan_reports_unreadable_file_and_continues() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "good.ts", b"t('good.key')");
        write(temp.path(), "latin1.ts", b"t('bad.key') // caf\xe9");

        let outcome = scanner(temp.path()).scan().await.unwrap();

        assert_that!(used_keys(&outcome), elements_are![eq("good.key")]);
        assert_that!(
            outcome.issues,
            elements_are![all![
                field!(Issue.kind, eq(&IssueKind::FileUnreadable)),
                field!(Issue.locations, elements_are![field!(SourceLocation.file, eq(&temp.path().join("latin1.ts")))]),
            ]]
        );
    }

    #[tokio::test]
    async fn scan_skips_binary_and_oversized_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "binary.js", b"t('bin.key')\0\0");
        write(temp.path(), "huge.js", format!("t('huge.key'){}", " ".repeat(64)).as_bytes());
        let config = EngineConfig {
            scan: crate::config::ScanConfig { max_file_bytes: 32, ..Default::default() },
            ..Default::default()
        };

        let outcome =
            SourceScanner::new(temp.path().to_path_buf(), &config).unwrap().scan().await.unwrap();

        assert_that!(outcome.usages, is_empty());
        assert_that!(
            outcome.issues,
            elements_are![field!(Issue.kind, eq(&IssueKind::FileUnreadable))]
        );
    }

    #[tokio::test]
    async fn scan_fails_for_missing_root() {
        let temp = TempDir::new().unwrap();

        let result = scanner(&temp.path().join("nope")).scan().await;

        assert!(matches!(result, Err(ScanError::MissingRoot(_))));
    }

    #[tokio::test]
    async fn scan_is_restartable() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.ts", b"t('a.one')");
        let scanner = scanner(temp.path());

        let first = scanner.scan().await.unwrap();
        write(temp.path(), "b.ts", b"t('b.two')");
        let second = scanner.scan().await.unwrap();

        assert_that!(used_keys(&first), elements_are![eq("a.one")]);
        assert_that!(used_keys(&second), elements_are![eq("a.one"), eq("b.two")]);
    }

    #[googletest::test]
    fn usage_index_keeps_first_three_call_sites() {
        let index = UsageIndex::from_usages([
            UsageKey::new("k", "b.ts", 1),
            UsageKey::new("k", "a.ts", 9),
            UsageKey::new("k", "a.ts", 2),
            UsageKey::new("k", "c.ts", 4),
        ]);

        expect_that!(
            index.call_sites("k"),
            elements_are![
                eq(&SourceLocation::new("a.ts", 2)),
                eq(&SourceLocation::new("a.ts", 9)),
                eq(&SourceLocation::new("b.ts", 1)),
            ]
        );
        expect_that!(index.call_sites("unknown"), is_empty());
    }
}
