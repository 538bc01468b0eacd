use std::path::PathBuf;

use finsight_core::TemplateError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Template catalogue error: {0}")]
    Template(#[from] TemplateError),

    #[error("Template keyword '{0}' collides with a reserved document field")]
    KeyCollision(String),

    #[error("Company data file name is not a company id: {}", .0.display())]
    InvalidCompanyId(PathBuf),

    #[error("Reference data file {} must hold a JSON object", .0.display())]
    MalformedReference(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document sink error: {0}")]
    Sink(anyhow::Error),
}
