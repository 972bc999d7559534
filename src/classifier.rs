//! Content heuristics that tell real translations from placeholders.

use std::fmt;

use serde::Serialize;

use crate::config::{
    ClassifierConfig,
    EngineConfig,
};
use crate::types::LeafValue;

/// Substrings that mark a value as not yet translated (matched case-insensitively).
pub const PLACEHOLDER_MARKERS: &[&str] = &["todo", "placeholder", "missing", "fixme"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyClass {
    Valid,
    Placeholder,
    Malformed,
}

/// Which rule decided the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassReason {
    Opaque,
    Translated,
    NotText,
    Empty,
    EqualsKey,
    EqualsLastSegment,
    Marker(&'static str),
    BraceWrapped,
    AllCaps,
    TooShort { min: usize },
}

impl fmt::Display for ClassReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opaque => write!(f, "structured value"),
            Self::Translated => write!(f, "translated"),
            Self::NotText => write!(f, "value is not a string"),
            Self::Empty => write!(f, "value is empty"),
            Self::EqualsKey => write!(f, "value equals its key"),
            Self::EqualsLastSegment => write!(f, "value equals the last key segment"),
            Self::Marker(marker) => write!(f, "value contains the marker '{marker}'"),
            Self::BraceWrapped => write!(f, "value is wrapped in braces"),
            Self::AllCaps => write!(f, "value is all capitals"),
            Self::TooShort { min } => write!(f, "value is shorter than {min} characters"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub class: KeyClass,
    pub reason: ClassReason,
}

impl Classification {
    const fn new(class: KeyClass, reason: ClassReason) -> Self {
        Self { class, reason }
    }
}

/// Pure `(key, value)` classifier. Holds only its rule switches.
#[derive(Debug, Clone)]
pub struct KeyClassifier {
    settings: ClassifierConfig,
    separator: String,
}

impl KeyClassifier {
    #[must_use]
    pub fn new(settings: ClassifierConfig, separator: impl Into<String>) -> Self {
        Self { settings, separator: separator.into() }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.classifier, config.key_separator.clone())
    }

    /// Classifies one leaf. Rules run as an ordered short-circuit chain; the
    /// first hit supplies the reason.
    #[must_use]
    pub fn classify(&self, key: &str, value: &LeafValue) -> Classification {
        let text = match value {
            LeafValue::Opaque(_) => return Classification::new(KeyClass::Valid, ClassReason::Opaque),
            LeafValue::Scalar(_) => {
                return Classification::new(KeyClass::Malformed, ClassReason::NotText);
            }
            LeafValue::Text(text) => text,
        };

        if text.is_empty() {
            return Classification::new(KeyClass::Malformed, ClassReason::Empty);
        }

        self.placeholder_reason(key, text).map_or(
            Classification::new(KeyClass::Valid, ClassReason::Translated),
            |reason| Classification::new(KeyClass::Placeholder, reason),
        )
    }

    fn placeholder_reason(&self, key: &str, text: &str) -> Option<ClassReason> {
        if text == key {
            return Some(ClassReason::EqualsKey);
        }
        if key.rsplit(self.separator.as_str()).next().is_some_and(|last| last == text) {
            return Some(ClassReason::EqualsLastSegment);
        }

        let lowered = text.to_lowercase();
        if let Some(marker) = PLACEHOLDER_MARKERS.iter().copied().find(|marker| lowered.contains(*marker)) {
            return Some(ClassReason::Marker(marker));
        }

        if text.len() >= 2 && text.starts_with('{') && text.ends_with('}') {
            return Some(ClassReason::BraceWrapped);
        }

        if self.settings.all_caps_rule
            && text.len() >= 2
            && text.chars().all(|c| c.is_ascii_uppercase() || c == '_')
        {
            return Some(ClassReason::AllCaps);
        }

        if let Some(min) = self.settings.min_value_length
            && text.chars().count() < min
        {
            return Some(ClassReason::TooShort { min });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn classifier() -> KeyClassifier {
        KeyClassifier::new(ClassifierConfig::default(), ".")
    }

    #[rstest]
    #[case::equals_key("x.y", "x.y", ClassReason::EqualsKey)]
    #[case::equals_last_segment("common.save", "save", ClassReason::EqualsLastSegment)]
    #[case::todo_marker("a.b", "TODO: translate", ClassReason::Marker("todo"))]
    #[case::fixme_marker("a.b", "Fixme later", ClassReason::Marker("fixme"))]
    #[case::missing_marker("a.b", "[missing] a.b", ClassReason::Marker("missing"))]
    #[case::placeholder_marker("a.b", "placeholder text", ClassReason::Marker("placeholder"))]
    #[case::braces("a.b", "{a.b}", ClassReason::BraceWrapped)]
    #[case::all_caps("a.b", "SAVE_BUTTON", ClassReason::AllCaps)]
    fn classify_placeholder(#[case] key: &str, #[case] value: &str, #[case] reason: ClassReason) {
        let result = classifier().classify(key, &LeafValue::from(value));

        assert_that!(result, eq(Classification { class: KeyClass::Placeholder, reason }));
    }

    #[rstest]
    #[case::sentence("common.save", "Guardar cambios")]
    #[case::capitalised_word("common.save", "Save")]
    #[case::single_capital("a.b", "A")]
    #[case::caps_with_space("a.b", "NEW ITEM")]
    #[case::interpolation_inside("a.b", "Hello {{name}}")]
    fn classify_valid(#[case] key: &str, #[case] value: &str) {
        let result = classifier().classify(key, &LeafValue::from(value));

        assert_that!(result.class, eq(KeyClass::Valid));
    }

    #[rstest]
    #[case::number(LeafValue::Scalar(json!(3)), ClassReason::NotText)]
    #[case::null(LeafValue::Scalar(json!(null)), ClassReason::NotText)]
    #[case::empty(LeafValue::from(""), ClassReason::Empty)]
    fn classify_malformed(#[case] value: LeafValue, #[case] reason: ClassReason) {
        let result = classifier().classify("a.b", &value);

        assert_that!(result, eq(Classification { class: KeyClass::Malformed, reason }));
    }

    #[googletest::test]
    fn opaque_values_skip_text_heuristics() {
        let result = classifier().classify("list", &LeafValue::Opaque(json!(["TODO", "list"])));

        expect_that!(result.class, eq(KeyClass::Valid));
    }

    #[googletest::test]
    fn equals_key_wins_over_marker() {
        let result = classifier().classify("todo", &LeafValue::from("todo"));

        expect_that!(result.reason, eq(ClassReason::EqualsKey));
    }

    #[googletest::test]
    fn all_caps_rule_can_be_disabled() {
        let classifier =
            KeyClassifier::new(ClassifierConfig { all_caps_rule: false, ..Default::default() }, ".");

        let result = classifier.classify("a.b", &LeafValue::from("OK"));

        expect_that!(result.class, eq(KeyClass::Valid));
    }

    #[googletest::test]
    fn min_length_rule_is_opt_in() {
        let strict =
            KeyClassifier::new(ClassifierConfig { min_value_length: Some(3), ..Default::default() }, ".");

        expect_that!(classifier().classify("a.b", &LeafValue::from("Ja")).class, eq(KeyClass::Valid));
        expect_that!(
            strict.classify("a.b", &LeafValue::from("Ja")).reason,
            eq(ClassReason::TooShort { min: 3 })
        );
    }

    #[googletest::test]
    fn last_segment_uses_configured_separator() {
        let classifier = KeyClassifier::new(ClassifierConfig::default(), ":");

        let result = classifier.classify("common:save", &LeafValue::from("save"));

        expect_that!(result.reason, eq(ClassReason::EqualsLastSegment));
    }

    #[rstest]
    #[case("")]
    #[case("\u{0}")]
    #[case("ÅÄÖ")]
    #[case("{")]
    #[case("}{")]
    #[case("__")]
    #[case("🙂 emoji")]
    fn classify_is_total(#[case] value: &str) {
        let result = classifier().classify("k", &LeafValue::from(value));

        assert_that!(
            result.class,
            any![eq(KeyClass::Valid), eq(KeyClass::Placeholder), eq(KeyClass::Malformed)]
        );
    }
}
