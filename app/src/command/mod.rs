//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input, dispatched
//! statically from `main`.

use std::path::{Path, PathBuf};

use finsight_config::Config;
use finsight_core::TemplateCatalogue;

mod info;
mod ingest;
mod init;
mod keywords;
mod match_line;
mod version;

pub use info::InfoStrategy;
pub use ingest::{IngestInput, IngestStrategy};
pub use init::InitStrategy;
pub use keywords::{KeywordsInput, KeywordsStrategy};
pub use match_line::{MatchInput, MatchStrategy};
pub use version::VersionStrategy;

/// Contract shared by every command strategy.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Load the config from `path`, or from the default location.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Load the catalogue named on the command line, falling back to the
/// configured one. The config is only read when no path is given.
fn load_catalogue(
    config: Option<&Path>,
    templates: Option<PathBuf>,
) -> anyhow::Result<TemplateCatalogue> {
    let path = match templates {
        Some(path) => path,
        None => load_config(config)?.paths.templates_data_path,
    };
    Ok(TemplateCatalogue::load(&path)?)
}
