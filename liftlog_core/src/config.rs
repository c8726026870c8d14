//! TOML configuration.
//!
//! The file lives at `$XDG_CONFIG_HOME/liftlog/config.toml` unless
//! `LIFTLOG_CONFIG` names another path. Every section is optional.

use crate::merge::DEFAULT_CHUNK_SIZE;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub export: ExportConfig,
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

/// Default user for commands that need one
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub current_user: Option<String>,
}

/// Import tuning
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

/// Export destination
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        PathBuf::from(home).join(".local/share")
    });
    base.join("liftlog")
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "LIFTLOG_CONFIG";

impl Config {
    /// Load from [`Config::config_path`]; a missing file means all defaults
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            tracing::debug!("{:?} does not exist, using default config", path);
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Parse and validate the TOML file at `path`
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&text)?;
        config.validate()?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// `$LIFTLOG_CONFIG` when set, otherwise `<config dir>/liftlog/config.toml`
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
        base.join("liftlog").join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        if self.import.chunk_size == 0 {
            return Err(Error::Config("import.chunk_size must be at least 1".into()));
        }
        if matches!(self.user.current_user.as_deref(), Some("")) {
            return Err(Error::Config("user.current_user must not be empty".into()));
        }
        Ok(())
    }

    /// Write to [`Config::config_path`]
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Write as pretty TOML, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let text = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("cannot encode config: {}", e)))?;
        std::fs::write(path, text)?;
        tracing::info!("Wrote config to {:?}", path);
        Ok(())
    }
}
