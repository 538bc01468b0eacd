//! Line matching against a compiled catalogue.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::{Bindings, CompiledTemplate, TemplateCatalogue, TemplateError};

/// Outcome of matching one data line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchResult {
    /// The line was generated from `phrase`. `bindings` holds exactly the
    /// keywords of that phrase.
    Matched {
        template_id: String,
        phrase: String,
        bindings: Bindings,
    },
    /// No template matched. `bindings` maps every catalogue keyword to `""`.
    NotMatched { bindings: Bindings },
}

impl MatchResult {
    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    #[must_use]
    pub const fn bindings(&self) -> &Bindings {
        match self {
            Self::Matched { bindings, .. } | Self::NotMatched { bindings } => bindings,
        }
    }

    #[must_use]
    pub fn template_id(&self) -> Option<&str> {
        match self {
            Self::Matched { template_id, .. } => Some(template_id),
            Self::NotMatched { .. } => None,
        }
    }

    #[must_use]
    pub fn phrase(&self) -> Option<&str> {
        match self {
            Self::Matched { phrase, .. } => Some(phrase),
            Self::NotMatched { .. } => None,
        }
    }

    /// Flatten into the `(matched, bindings)` pair callers index with.
    #[must_use]
    pub fn into_parts(self) -> (bool, Bindings) {
        match self {
            Self::Matched { bindings, .. } => (true, bindings),
            Self::NotMatched { bindings } => (false, bindings),
        }
    }
}

/// A catalogue compiled for repeated matching.
///
/// Templates are tried in catalogue order and the first match wins. The
/// matcher holds no mutable state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    templates: Vec<CompiledTemplate>,
    keywords: BTreeSet<String>,
}

impl TemplateMatcher {
    /// Compile every template of `catalogue`.
    ///
    /// # Errors
    /// Fails on the first template that does not compile; no matcher is
    /// produced in that case.
    pub fn new(catalogue: &TemplateCatalogue) -> Result<Self, TemplateError> {
        let templates = catalogue
            .iter()
            .cloned()
            .map(CompiledTemplate::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let keywords = catalogue.keywords();

        info!(
            "Template matcher ready: {} templates, {} keywords",
            templates.len(),
            keywords.len()
        );

        Ok(Self {
            templates,
            keywords,
        })
    }

    pub fn from_phrases<S: AsRef<str>>(phrases: &[S]) -> Result<Self, TemplateError> {
        Self::new(&TemplateCatalogue::from_phrases(
            phrases.iter().map(|p| p.as_ref().to_string()),
        ))
    }

    /// Find the first template that generated `line` and extract its
    /// keyword values.
    #[must_use]
    pub fn match_line(&self, line: &str) -> MatchResult {
        debug!("Matching data line: {line}");

        for template in &self.templates {
            if let Some(bindings) = template.captures(line) {
                debug!("Matched template '{}'", template.id());
                return MatchResult::Matched {
                    template_id: template.id().to_string(),
                    phrase: template.phrase().to_string(),
                    bindings,
                };
            }
        }

        debug!("No matching template");
        MatchResult::NotMatched {
            bindings: self.empty_bindings(),
        }
    }

    /// Every catalogue keyword bound to the empty string.
    #[must_use]
    pub fn empty_bindings(&self) -> Bindings {
        self.keywords
            .iter()
            .map(|k| (k.clone(), String::new()))
            .collect()
    }

    #[must_use]
    pub const fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    #[must_use]
    pub fn templates(&self) -> &[CompiledTemplate] {
        &self.templates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// One-off match of `line` against `phrases`, compiling them on the spot.
///
/// Prefer building a [`TemplateMatcher`] once when matching many lines.
///
/// # Errors
/// Returns an error only if a phrase cannot be compiled.
pub fn match_line<S: AsRef<str>>(line: &str, phrases: &[S]) -> Result<MatchResult, TemplateError> {
    Ok(TemplateMatcher::from_phrases(phrases)?.match_line(line))
}
