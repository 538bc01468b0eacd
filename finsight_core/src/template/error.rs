use thiserror::Error;

/// Errors raised while loading or compiling a template catalogue.
///
/// A failing line match is never an error: see [`super::MatchResult`].
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Malformed template catalogue: {0}")]
    MalformedCatalogue(String),

    #[error("Template '{template_id}' contains an empty placeholder")]
    EmptyPlaceholder { template_id: String },

    #[error("Failed to compile template '{template_id}': {source}")]
    Regex {
        template_id: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to read template catalogue: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid template catalogue JSON: {0}")]
    Json(#[from] serde_json::Error),
}
