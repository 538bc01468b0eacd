use std::path::PathBuf;

use finsight_core::TemplateMatcher;

/// Input parameters for the Match command strategy.
#[derive(Debug, Clone)]
pub struct MatchInput {
    pub config: Option<PathBuf>,
    /// The raw data line to match
    pub line: String,
    /// Optional catalogue override
    pub templates: Option<PathBuf>,
}

/// Strategy matching a single line and printing the result as JSON.
#[derive(Debug, Clone, Copy)]
pub struct MatchStrategy;

impl super::CommandStrategy for MatchStrategy {
    type Input = MatchInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let catalogue = super::load_catalogue(input.config.as_deref(), input.templates)?;
        let matcher = TemplateMatcher::new(&catalogue)?;

        let result = matcher.match_line(&input.line);
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }
}
