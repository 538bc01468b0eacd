//! Template matching engine.
//!
//! A catalogue of phrases with `{keyword}` placeholders is compiled once; each
//! raw data line is then matched against it to recover the keyword values the
//! line was generated from.

use std::collections::BTreeMap;

pub mod catalogue;
pub mod error;
pub mod matcher;
pub mod pattern;

pub use catalogue::{PHRASE_FIELD, TemplateCatalogue, TemplateRecord, extract_keywords, extract_phrases};
pub use error::TemplateError;
pub use matcher::{MatchResult, TemplateMatcher, match_line};
pub use pattern::CompiledTemplate;

/// Keyword → matched substring.
pub type Bindings = BTreeMap<String, String>;
