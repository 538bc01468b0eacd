//! Template catalogue loading.
//!
//! A catalogue is a JSON object mapping template ids to records holding a
//! `template` phrase, e.g.
//!
//! ```json
//! {
//!   "yoy_change": {
//!     "template": "The company's {current_period} {metric_name} was {current_value}."
//!   }
//! }
//! ```
//!
//! Key order is significant: it is the match-priority order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

use super::TemplateError;

/// Record field holding the template phrase.
pub const PHRASE_FIELD: &str = "template";

/// Non-greedy `{name}` placeholder pattern.
static PLACEHOLDER_PATTERN: OnceLock<regex::Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
pub(crate) fn placeholder_pattern() -> &'static regex::Regex {
    PLACEHOLDER_PATTERN.get_or_init(|| {
        regex::Regex::new(r"\{(.*?)\}").expect("Static regex pattern is guaranteed to be valid")
    })
}

/// One catalogue entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateRecord {
    pub id: String,
    pub phrase: String,
}

impl TemplateRecord {
    #[must_use]
    pub fn new(id: impl Into<String>, phrase: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phrase: phrase.into(),
        }
    }
}

/// Ordered, immutable list of template records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateCatalogue {
    records: Vec<TemplateRecord>,
}

impl TemplateCatalogue {
    /// Build a catalogue from records already in priority order.
    #[must_use]
    pub const fn new(records: Vec<TemplateRecord>) -> Self {
        Self { records }
    }

    /// Build a catalogue from bare phrases; ids are their positions.
    #[must_use]
    pub fn from_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = phrases
            .into_iter()
            .enumerate()
            .map(|(i, phrase)| TemplateRecord::new(i.to_string(), phrase))
            .collect();
        Self { records }
    }

    /// Parse a catalogue document.
    ///
    /// # Errors
    /// Returns `MalformedCatalogue` if the document is not an object of
    /// records each holding a string `template` field. Nothing is returned
    /// for a partially valid document.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, TemplateError> {
        let entries = value.as_object().ok_or_else(|| {
            TemplateError::MalformedCatalogue("expected a JSON object of template records".into())
        })?;

        let records = entries
            .iter()
            .map(|(id, record)| {
                record
                    .get(PHRASE_FIELD)
                    .and_then(serde_json::Value::as_str)
                    .map(|phrase| TemplateRecord::new(id.as_str(), phrase))
                    .ok_or_else(|| {
                        TemplateError::MalformedCatalogue(format!(
                            "record '{id}' lacks a string '{PHRASE_FIELD}' field"
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { records })
    }

    pub fn from_json_str(json: &str) -> Result<Self, TemplateError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Load a catalogue file.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        info!("Loading template catalogue from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let catalogue = Self::from_json_str(&content)?;
        info!("Loaded {} templates", catalogue.len());
        Ok(catalogue)
    }

    #[must_use]
    pub fn records(&self) -> &[TemplateRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TemplateRecord> {
        self.records.iter()
    }

    /// Phrases in catalogue order.
    #[must_use]
    pub fn phrases(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.phrase.as_str()).collect()
    }

    /// Distinct placeholder names across the whole catalogue.
    #[must_use]
    pub fn keywords(&self) -> BTreeSet<String> {
        extract_keywords(&self.phrases())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a TemplateCatalogue {
    type Item = &'a TemplateRecord;
    type IntoIter = std::slice::Iter<'a, TemplateRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Phrases of a raw catalogue document, in document order.
///
/// # Errors
/// Returns `MalformedCatalogue` if any record lacks its phrase.
pub fn extract_phrases(catalogue: &serde_json::Value) -> Result<Vec<String>, TemplateError> {
    Ok(TemplateCatalogue::from_value(catalogue)?
        .records
        .into_iter()
        .map(|r| r.phrase)
        .collect())
}

/// Distinct `{name}` placeholder names found in `phrases`.
///
/// Names may contain any character except `}`. Empty placeholders (`{}`) are
/// not reported.
#[must_use]
pub fn extract_keywords<S: AsRef<str>>(phrases: &[S]) -> BTreeSet<String> {
    phrases
        .iter()
        .flat_map(|phrase| placeholder_names(phrase.as_ref()))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Every placeholder name of `phrase`, in order, repeats included.
pub(crate) fn placeholder_names(phrase: &str) -> impl Iterator<Item = &str> {
    placeholder_pattern()
        .captures_iter(phrase)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_catalogue_preserves_document_order() {
        let catalogue = TemplateCatalogue::from_json_str(
            r#"{
                "zeta": {"template": "last {a}"},
                "alpha": {"template": "first {b}"},
                "mid": {"template": "middle {c}", "analysis_type": "growth"}
            }"#,
        )
        .expect("valid catalogue should parse");

        let ids: Vec<&str> = catalogue.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
        assert_eq!(catalogue.phrases(), vec!["last {a}", "first {b}", "middle {c}"]);
    }

    #[test]
    fn test_missing_phrase_field_is_malformed() {
        let doc = json!({
            "ok": {"template": "fine {x}"},
            "broken": {"text": "no template here"}
        });

        let result = TemplateCatalogue::from_value(&doc);
        assert!(
            matches!(result, Err(TemplateError::MalformedCatalogue(ref msg)) if msg.contains("broken"))
        );
        assert!(extract_phrases(&doc).is_err());
    }

    #[test]
    fn test_non_string_phrase_is_malformed() {
        let doc = json!({"t": {"template": 42}});
        assert!(matches!(
            TemplateCatalogue::from_value(&doc),
            Err(TemplateError::MalformedCatalogue(_))
        ));
    }

    #[test]
    fn test_non_object_document_is_malformed() {
        let doc = json!(["The company's {metric_name}"]);
        assert!(matches!(
            TemplateCatalogue::from_value(&doc),
            Err(TemplateError::MalformedCatalogue(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_reported() {
        assert!(matches!(
            TemplateCatalogue::from_json_str("{not json"),
            Err(TemplateError::Json(_))
        ));
    }

    #[test]
    fn test_keywords_collapse_duplicates() {
        let keywords = extract_keywords(&["{a} and {b}", "{b} then {a} then {a}"]);
        let expected: BTreeSet<String> = ["a", "b"].into_iter().map(String::from).collect();
        assert_eq!(keywords, expected);
    }

    #[test]
    fn test_keywords_allow_punctuation() {
        let keywords = extract_keywords(&["{_for_the_metric} {pct.change} {a b}"]);
        assert!(keywords.contains("_for_the_metric"));
        assert!(keywords.contains("pct.change"));
        assert!(keywords.contains("a b"));
    }

    #[test]
    fn test_keywords_skip_empty_and_unclosed() {
        let keywords = extract_keywords(&["{} open { brace", "{x"]);
        assert!(keywords.is_empty());
    }

    #[test]
    fn test_keywords_nested_open_brace_is_part_of_name() {
        let keywords = extract_keywords(&["{a{b} c"]);
        assert!(keywords.contains("a{b"));
    }
}
