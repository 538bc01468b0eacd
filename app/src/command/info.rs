use std::path::{Path, PathBuf};

use finsight_core::TemplateCatalogue;
use tracing::info;

/// Strategy for displaying configuration information.
///
/// Prints the effective data paths, index names and retry schedule, and
/// checks that the configured template catalogue loads.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = super::load_config(input.as_deref())?;

        println!("=== finsight Configuration ===\n");

        println!("Paths:");
        println!("  Templates: {}", describe(&config.paths.templates_data_path));
        match config.paths.metrics_data_path {
            Some(ref path) => println!("  Metrics: {}", describe(path)),
            None => println!("  Metrics: (not set)"),
        }
        println!("  Company Data: {}", describe(&config.paths.company_data_path));
        println!("  Output: {}", config.paths.output_path.display());
        println!();

        println!("Template Catalogue:");
        info!("Checking template catalogue");
        match TemplateCatalogue::load(&config.paths.templates_data_path) {
            Ok(catalogue) => {
                println!("  Templates: {}", catalogue.len());
                println!("  Keywords: {}", catalogue.keywords().len());
            }
            Err(e) => {
                println!("  Status: Failed to load");
                println!("  Error: {e}");
            }
        }
        println!();

        println!("Indices:");
        println!("  Company Data: {}", config.index.company_data);
        println!("  Metrics Data: {}", config.index.metrics_data);
        println!("  Templates Data: {}", config.index.templates_data);
        println!();

        let retry = &config.ingest.retry;
        println!("Retry:");
        println!("  Base Delays (ms): {:?}", retry.base_delays_ms);
        println!(
            "  Final Retries: {} (every {}ms)",
            retry.final_retries, retry.final_delay_ms
        );
        println!("  Max Attempts: {}", retry.max_attempts());

        Ok(())
    }
}

fn describe(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (missing)", path.display())
    }
}
