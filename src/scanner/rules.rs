//! Call-site patterns that pull translation keys out of source text.

use std::fmt;
use std::sync::{
    Arc,
    LazyLock,
};

use regex::Regex;

/// A key found by a rule, with its 1-indexed line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RuleMatch {
    pub key: String,
    pub line: u32,
}

/// One call-site style. Rules see raw text and know nothing about traversal.
pub trait ExtractionRule: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn extract(&self, text: &str) -> Vec<RuleMatch>;
}

/// Rule backed by a regular expression whose first capture group is the key.
#[derive(Debug, Clone)]
pub struct PatternRule {
    name: String,
    regex: Regex,
}

impl PatternRule {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self { name: name.into(), regex: Regex::new(pattern)? })
    }
}

impl ExtractionRule for PatternRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, text: &str) -> Vec<RuleMatch> {
        let lines = LineIndex::new(text);
        self.regex
            .captures_iter(text)
            .filter_map(|captures| captures.get(1))
            .map(|key| RuleMatch { key: key.as_str().to_string(), line: lines.line_of(key.start()) })
            .collect()
    }
}

struct RuleSource {
    name: &'static str,
    pattern: &'static str,
}

/// Leading guard so `t(` is not matched inside `split(` or `$att(`.
macro_rules! call_prefix {
    () => {
        r"(?m)(?:^|[^\w$])"
    };
}

/// Key literal: no interpolation, no trailing separator.
macro_rules! key_literal {
    () => {
        r#"["'`]([A-Za-z0-9_](?:[A-Za-z0-9_.\-]*[A-Za-z0-9_])?)["'`]"#
    };
}

const BUILTIN_RULES: &[RuleSource] = &[
    // t('key'), $t('key'), i18n.t('key')
    RuleSource { name: "call", pattern: concat!(call_prefix!(), r"\$?t\(\s*", key_literal!(), r"\s*\)") },
    // t('key', { count }), i18n.t('key', options)
    RuleSource {
        name: "call-with-params",
        pattern: concat!(call_prefix!(), r"\$?t\(\s*", key_literal!(), r"\s*,"),
    },
    // translate('key'), i18n.translate('key', ...)
    RuleSource {
        name: "translate-call",
        pattern: concat!(call_prefix!(), r"translate\(\s*", key_literal!(), r"\s*[,)]"),
    },
    // <Trans i18nKey="key" />
    RuleSource {
        name: "i18n-key-attribute",
        pattern: concat!(r"\bi18nKey\s*=\s*\{?\s*", key_literal!()),
    },
];

static BUILTIN_CACHE: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    BUILTIN_RULES
        .iter()
        .filter_map(|source| {
            PatternRule::new(source.name, source.pattern)
                .map_err(|e| tracing::error!("Failed to compile {} rule: {e}", source.name))
                .ok()
        })
        .collect()
});

/// Ordered list of extraction rules applied independently to each file.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Arc<dyn ExtractionRule>>,
}

impl RuleSet {
    /// The built-in call-site styles.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            rules: BUILTIN_CACHE
                .iter()
                .map(|rule| -> Arc<dyn ExtractionRule> { Arc::new(rule.clone()) })
                .collect(),
        }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Appends a rule after the existing ones.
    #[must_use]
    pub fn with_rule(mut self, rule: impl ExtractionRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.name())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs every rule over the text. The same key may be reported by several rules.
    #[must_use]
    pub fn extract_all(&self, text: &str) -> Vec<RuleMatch> {
        self.rules.iter().flat_map(|rule| rule.extract(text)).collect()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Byte offset to line number lookup.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(index, _)| index + 1));
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> u32 {
        let line = self.starts.partition_point(|&start| start <= offset);
        u32::try_from(line).unwrap_or(u32::MAX)
    }
}
