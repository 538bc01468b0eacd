#![warn(
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

//! Ingestion of company data into search-index documents.
//!
//! Every non-blank line of a company source file is matched against the
//! template catalogue; the resulting bindings, the company id and the raw line
//! form one document. Metric definitions and the catalogue itself are indexed
//! as reference data.

mod error;
mod pipeline;
mod sink;

pub use error::{IngestError, Result};
pub use pipeline::{IngestPipeline, IngestReport, company_id_from_path, ensure_no_reserved_keywords};
pub use sink::{JsonlSink, MemorySink, SinkEntry};
