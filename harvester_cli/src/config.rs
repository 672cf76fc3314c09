use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use harvester_core::{JobConfig, JobSettings};
use std::path::{Path, PathBuf};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "HARVESTER_";

/// Configuration manager that handles XDG-compliant paths and layered configuration
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Create a new ConfigManager with default XDG-compliant paths
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a ConfigManager with a specific path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get the default XDG-compliant configuration path
    fn default_config_path() -> PathBuf {
        #[cfg(not(target_os = "windows"))]
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg_config).join("harvester/config.toml");
        }

        #[cfg(target_os = "linux")]
        {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config/harvester/config.toml")
        }

        #[cfg(target_os = "macos")]
        {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Library/Application Support/harvester/config.toml")
        }

        #[cfg(target_os = "windows")]
        {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("harvester\\config.toml")
        }
    }

    /// Layered figment: defaults, then the TOML file, then the environment
    pub fn figment(&self) -> Figment {
        let mut figment = Figment::new();

        // Layer 1: Defaults
        figment = figment.merge(Serialized::default("job", JobSettings::default()));

        // Layer 2: Config file (if exists)
        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        // Layer 3: Environment variables
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load the job configuration
    pub fn load(&self) -> Result<JobConfig> {
        if !self.config_path.exists() {
            log::warn!(
                "No configuration file at {}, relying on {ENV_PREFIX}* variables",
                self.config_path.display()
            );
        }

        self.figment().extract().with_context(|| {
            format!(
                "Failed to load configuration from {}",
                self.config_path.display()
            )
        })
    }
}

/// Render a resolved configuration back to TOML
pub fn to_toml(config: &JobConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to render configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvester_core::{HashAlgorithm, SinkConfig, SourceConfig};
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
[job]
interval_seconds = 30
hash_algorithm = "crc32"

[source]
type = "local"
to_load = "/data/in"
loaded = "/data/done"

[[processors]]
type = "gzip"

[sink]
type = "archive"
transmit = "/data/tx"
archive = "/data/archive"
regex = '(\d{4})-(\d{2})'
format = "$1/$2"
"#;

    #[test]
    fn test_load_from_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, CONFIG).unwrap();

        let config = ConfigManager::with_path(path).load().unwrap();

        assert_eq!(config.job.interval_seconds, 30);
        assert_eq!(config.job.hash_algorithm, HashAlgorithm::Crc32);
        assert_eq!(config.job.chunk_size, harvester_core::DEFAULT_CHUNK_SIZE);
        assert!(matches!(config.source, SourceConfig::Local { .. }));
        assert!(matches!(config.sink, SinkConfig::Archive { .. }));
        assert_eq!(config.processors.len(), 1);
    }

    #[test]
    fn test_missing_file_without_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("absent.toml"));
        assert!(manager.load().is_err());
    }

    #[test]
    fn test_rendered_toml_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, CONFIG).unwrap();
        let config = ConfigManager::with_path(path.clone()).load().unwrap();

        fs::write(&path, to_toml(&config).unwrap()).unwrap();
        let reloaded = ConfigManager::with_path(path).load().unwrap();
        assert_eq!(config, reloaded);
    }
}
