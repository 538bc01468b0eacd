use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use finsight_core::RetryPolicy;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "FINSIGHT_CONFIG";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Data locations. Relative paths are resolved against the directory holding
/// the config file.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathsConfig {
    pub templates_data_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_data_path: Option<PathBuf>,
    pub company_data_path: PathBuf,
    #[serde(default = "PathsConfig::default_output_path")]
    pub output_path: PathBuf,
}

impl PathsConfig {
    fn default_output_path() -> PathBuf {
        PathBuf::from("output/documents.jsonl")
    }

    fn resolve_against(&mut self, base: &Path) {
        for path in [
            &mut self.templates_data_path,
            &mut self.company_data_path,
            &mut self.output_path,
        ] {
            resolve(path, base);
        }
        if let Some(path) = self.metrics_data_path.as_mut() {
            resolve(path, base);
        }
    }
}

fn resolve(path: &mut PathBuf, base: &Path) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

/// Names of the indices documents are written to.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    #[serde(default = "IndexConfig::default_company_data")]
    pub company_data: String,
    #[serde(default = "IndexConfig::default_metrics_data")]
    pub metrics_data: String,
    #[serde(default = "IndexConfig::default_templates_data")]
    pub templates_data: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            company_data: Self::default_company_data(),
            metrics_data: Self::default_metrics_data(),
            templates_data: Self::default_templates_data(),
        }
    }
}

impl IndexConfig {
    fn default_company_data() -> String {
        "company_data".to_string()
    }

    fn default_metrics_data() -> String {
        "metrics_data".to_string()
    }

    fn default_templates_data() -> String {
        "templates_data".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct IngestConfig {
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Config {
    /// `$FINSIGHT_CONFIG`, or `~/finsight/config.json`.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }
        Ok(Self::config_dir()?.join("config.json"))
    }

    fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("finsight"))
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'finsight init' to create config.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(config_path)?;
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::from_json_str(&content, base_dir)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {e}", config_path.display()))?;

        info!("Configuration loaded from {}", config_path.display());
        Ok(config)
    }

    /// Parse a config document, resolving relative paths against `base_dir`.
    pub fn from_json_str(json: &str, base_dir: &Path) -> anyhow::Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.paths.resolve_against(base_dir);
        Ok(config)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_path = match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => PathBuf::from(path),
            None => Self::ensure_config_dir()?.join("config.json"),
        };
        Self::create_config_at(&config_path)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Put the template catalogue at paths.templates_data_path");
        println!("   2. Put one <company_id>.txt file per company under paths.company_data_path");
        println!("   3. Run 'finsight ingest' to build the index documents");
        println!();
        println!("🔧 Configuration options:");
        println!("   - paths.metrics_data_path: optional metric definitions to index");
        println!("   - index.*: index names documents are written to");
        println!("   - ingest.retry: backoff schedule for document writes");
        println!();
        Ok(())
    }

    /// Write the default config to `config_path`, refusing to overwrite.
    pub fn create_config_at(config_path: &Path) -> anyhow::Result<()> {
        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let config_template = r#"{
  "paths": {
    "templates_data_path": "data/templates.json",
    "metrics_data_path": "data/metrics.json",
    "company_data_path": "data/company_data",
    "output_path": "output/documents.jsonl"
  },
  "index": {
    "company_data": "company_data",
    "metrics_data": "metrics_data",
    "templates_data": "templates_data"
  },
  "ingest": {
    "retry": {
      "base_delays_ms": [200, 400, 800],
      "final_retries": 2,
      "final_delay_ms": 1000
    }
  }
}"#;

        std::fs::write(config_path, config_template)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_json_str(
            r#"{"paths": {"templates_data_path": "t.json", "company_data_path": "companies"}}"#,
            Path::new("/srv/finsight"),
        )
        .expect("minimal config should parse");

        assert_eq!(
            config.paths.templates_data_path,
            PathBuf::from("/srv/finsight/t.json")
        );
        assert_eq!(
            config.paths.output_path,
            PathBuf::from("/srv/finsight/output/documents.jsonl")
        );
        assert!(config.paths.metrics_data_path.is_none());
        assert_eq!(config.index, IndexConfig::default());
        assert_eq!(config.ingest.retry, RetryPolicy::default());
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_absolute_paths_are_kept() {
        let config = Config::from_json_str(
            r#"{"paths": {
                "templates_data_path": "/data/t.json",
                "metrics_data_path": "m.json",
                "company_data_path": "/data/companies"
            }}"#,
            Path::new("/etc/finsight"),
        )
        .expect("config should parse");

        assert_eq!(config.paths.templates_data_path, PathBuf::from("/data/t.json"));
        assert_eq!(
            config.paths.metrics_data_path,
            Some(PathBuf::from("/etc/finsight/m.json"))
        );
    }

    #[test]
    fn test_missing_paths_section_is_rejected() {
        let result = Config::from_json_str(r#"{"index": {}}"#, Path::new("."));
        assert!(result.is_err());
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_created_config_loads() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join("nested").join("config.json");

        Config::create_config_at(&path).expect("config should be created");
        let config = Config::load_from(&path).expect("created config should load");

        assert_eq!(
            config.paths.company_data_path,
            dir.path().join("nested").join("data/company_data")
        );
        assert_eq!(config.ingest.retry.final_retries, 2);

        assert!(Config::create_config_at(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = Config::load_from(Path::new("/nonexistent/finsight/config.json"));
        assert!(result.is_err());
    }
}
