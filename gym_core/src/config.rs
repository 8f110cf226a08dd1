//! Configuration file support for gymlog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/gymlog/config.toml`.
//! Every section is optional.

use crate::providers::AdConfig;
use crate::stats::ChartRange;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub ads: AdConfig,

    #[serde(default)]
    pub stats: StatsConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Statistics display configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct StatsConfig {
    #[serde(default)]
    pub default_range: ChartRange,
}

fn home_or_cwd() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_or_cwd().join(".local/share"));
    base.join("gymlog")
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_or_cwd().join(".config"));
        base.join("gymlog").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Override the data directory (CLI `--data-dir`)
    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data.data_dir = dir;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ads.clicks_between_ads, 5);
        assert_eq!(config.stats.default_range, ChartRange::Month);
        assert!(config.data.data_dir.ends_with("gymlog"));
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.ads.clicks_between_ads = 8;
        config.stats.default_range = ChartRange::Year;
        config.save_to(&path).unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed.ads.clicks_between_ads, 8);
        assert_eq!(parsed.stats.default_range, ChartRange::Year);
        assert_eq!(parsed.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[stats]
default_range = "1W"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.stats.default_range, ChartRange::Week);
        assert_eq!(config.ads.clicks_between_ads, 5); // default
    }

    #[test]
    fn test_invalid_range_rejected() {
        let toml_str = r#"
[stats]
default_range = "2W"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_data_dir_override() {
        let config = Config::default().with_data_dir(Some(PathBuf::from("/tmp/gym")));
        assert_eq!(config.data.data_dir, PathBuf::from("/tmp/gym"));
    }
}
