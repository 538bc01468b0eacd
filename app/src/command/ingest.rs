use std::path::PathBuf;

use finsight_core::{TemplateCatalogue, TemplateMatcher};
use finsight_ingest::{IngestPipeline, JsonlSink};
use tracing::info;

/// Input parameters for the Ingest command strategy.
#[derive(Debug, Clone)]
pub struct IngestInput {
    pub config: Option<PathBuf>,
    /// Optional company data directory override
    pub company_data: Option<PathBuf>,
    /// Optional output file override
    pub output: Option<PathBuf>,
    /// Skip metric definitions and template catalogue upload
    pub skip_reference: bool,
}

/// Strategy running the ingestion pipeline into a JSON lines file.
///
/// Setup (catalogue load, compile, reserved field check) completes before the
/// output file is created, so a broken catalogue leaves no partial output.
#[derive(Debug, Clone, Copy)]
pub struct IngestStrategy;

impl super::CommandStrategy for IngestStrategy {
    type Input = IngestInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = super::load_config(input.config.as_deref())?;
        let paths = &config.paths;

        let catalogue = TemplateCatalogue::load(&paths.templates_data_path)?;
        let matcher = TemplateMatcher::new(&catalogue)?;
        finsight_ingest::ensure_no_reserved_keywords(matcher.keywords())?;

        let company_data = input
            .company_data
            .unwrap_or_else(|| paths.company_data_path.clone());
        let output = input.output.unwrap_or_else(|| paths.output_path.clone());

        let sink = JsonlSink::create(&output).await?;
        let pipeline = IngestPipeline::with_matcher(
            matcher,
            sink,
            config.index.clone(),
            config.ingest.retry.clone(),
        )?;

        let mut report = pipeline.ingest_company_dir(&company_data).await?;
        if input.skip_reference {
            info!("Skipping reference data upload");
        } else {
            report.reference_documents = pipeline
                .upload_reference_data(
                    &paths.templates_data_path,
                    paths.metrics_data_path.as_deref(),
                )
                .await?;
        }

        info!(
            "Ingestion finished, {} documents written to {}",
            report.lines + report.reference_documents,
            pipeline.sink().path().display()
        );
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}
