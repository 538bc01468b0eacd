use std::path::PathBuf;

/// Input parameters for the Keywords command strategy.
#[derive(Debug, Clone)]
pub struct KeywordsInput {
    pub config: Option<PathBuf>,
    /// Optional catalogue override
    pub templates: Option<PathBuf>,
}

/// Strategy printing the sorted keyword set of a catalogue, one per line.
#[derive(Debug, Clone, Copy)]
pub struct KeywordsStrategy;

impl super::CommandStrategy for KeywordsStrategy {
    type Input = KeywordsInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let catalogue = super::load_catalogue(input.config.as_deref(), input.templates)?;

        for keyword in catalogue.keywords() {
            println!("{keyword}");
        }
        Ok(())
    }
}
