#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod retry;
pub mod template;

pub use retry::{RetryPolicy, retry_with_backoff};
pub use template::{
    Bindings, CompiledTemplate, MatchResult, TemplateCatalogue, TemplateError, TemplateMatcher,
    TemplateRecord, extract_keywords, extract_phrases, match_line,
};

/// Field carrying the company identifier in every company-data document.
pub const COMPANY_ID_FIELD: &str = "company_id";

/// Field carrying the untouched source line in every company-data document.
pub const RAW_DATA_LINE_FIELD: &str = "raw_data_line";

/// Document fields owned by the ingestion caller. Template keywords must never
/// use these names.
pub const RESERVED_FIELDS: [&str; 2] = [COMPANY_ID_FIELD, RAW_DATA_LINE_FIELD];

/// A company-data line ready to be written to the search index.
///
/// The template bindings are flattened next to the caller-owned fields, so a
/// serialized document looks like
/// `{"company_id": 642, "raw_data_line": "...", "current_period": "Q1 2022", ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexDocument {
    pub company_id: u64,
    pub raw_data_line: String,
    #[serde(flatten)]
    pub metadata: Bindings,
}

impl IndexDocument {
    #[must_use]
    pub fn new(company_id: u64, raw_data_line: impl Into<String>, metadata: Bindings) -> Self {
        Self {
            company_id,
            raw_data_line: raw_data_line.into(),
            metadata,
        }
    }

    /// Hex SHA-256 of `{company_id}:{raw_data_line}`. The same line of the same
    /// company always maps to the same id; bindings do not take part.
    #[must_use]
    pub fn id(&self) -> String {
        let key = format!("{}:{}", self.company_id, self.raw_data_line);
        format!("{:x}", Sha256::digest(key.as_bytes()))
    }
}

/// Destination for indexed documents.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Write (or overwrite) the document `id` in `index`.
    async fn write(&self, index: &str, id: &str, body: &serde_json::Value) -> anyhow::Result<()>;

    /// Make every previous write durable.
    async fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
