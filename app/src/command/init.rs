use std::path::PathBuf;

use finsight_config::Config;

/// Strategy for initializing the configuration.
///
/// Creates the default configuration file, at the `--config` path when one is
/// given.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        match input {
            Some(path) => {
                Config::create_config_at(&path)?;
                println!("✅ Created config file at: {}", path.display());
                Ok(())
            }
            None => Config::create_config(),
        }
    }
}
