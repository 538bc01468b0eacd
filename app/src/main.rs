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

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod command;

use command::{
    CommandStrategy, InfoStrategy, IngestInput, IngestStrategy, InitStrategy, KeywordsInput,
    KeywordsStrategy, MatchInput, MatchStrategy, VersionStrategy,
};

#[derive(Parser)]
#[command(name = "finsight")]
#[command(about = "Template matching and indexing of company financial data", long_about = None)]
struct Cli {
    /// Config file (defaults to $FINSIGHT_CONFIG or ~/finsight/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Init,
    /// Show configuration
    Info,
    /// List the keywords of the template catalogue
    Keywords {
        /// Template catalogue to read instead of the configured one
        #[arg(short, long)]
        templates: Option<PathBuf>,
    },
    /// Match one raw data line against the template catalogue
    Match {
        /// The line to match
        #[arg(short, long)]
        line: String,

        /// Template catalogue to read instead of the configured one
        #[arg(short, long)]
        templates: Option<PathBuf>,
    },
    /// Build index documents from the company data
    Ingest {
        /// Company data directory to read instead of the configured one
        #[arg(long)]
        company_data: Option<PathBuf>,

        /// Output file to write instead of the configured one
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not index the metric definitions and the template catalogue
        #[arg(long)]
        skip_reference: bool,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = cli.config;

    match cli.command {
        Commands::Init => InitStrategy.execute(config).await,
        Commands::Info => InfoStrategy.execute(config).await,
        Commands::Keywords { templates } => {
            KeywordsStrategy
                .execute(KeywordsInput { config, templates })
                .await
        }
        Commands::Match { line, templates } => {
            MatchStrategy
                .execute(MatchInput {
                    config,
                    line,
                    templates,
                })
                .await
        }
        Commands::Ingest {
            company_data,
            output,
            skip_reference,
        } => {
            IngestStrategy
                .execute(IngestInput {
                    config,
                    company_data,
                    output,
                    skip_reference,
                })
                .await
        }
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
