//! Configuration for the recordmap CLI
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (recordmap.toml)
//! - Environment variables (RECORDMAP__*)
//!
//! ## Example config file (recordmap.toml):
//! ```toml
//! [output]
//! format = "compact"
//!
//! [store]
//! dataset = "./customers.json"
//! entity = "customer"
//! primary_key = "id"
//!
//! [logging]
//! filter = "recordmap=debug"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecordMapConfig {
    #[serde(default)]
    pub output: OutputConfig,

    /// Memory store seeding
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl OutputFormat {
    pub fn render(&self, value: &serde_json::Value) -> serde_json::Result<String> {
        match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
            OutputFormat::Compact => serde_json::to_string(value),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON array of rows used to seed the memory store
    #[serde(default)]
    pub dataset: Option<PathBuf>,

    #[serde(default = "default_entity")]
    pub entity: String,

    #[serde(default = "default_primary_key")]
    pub primary_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Tracing filter used when RUST_LOG is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_entity() -> String {
    "customer".to_string()
}

fn default_primary_key() -> String {
    "id".to_string()
}

fn default_filter() -> String {
    "recordmap=info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dataset: None,
            entity: default_entity(),
            primary_key: default_primary_key(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl RecordMapConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a required file when given
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["recordmap.toml", ".recordmap.toml", "config/recordmap.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "recordmap", "recordmap") {
            let xdg_config = dirs.config_dir().join("recordmap.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("RECORDMAP")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Dataset path, resolved against the working directory
    pub fn dataset_path(&self) -> Option<PathBuf> {
        self.store.dataset.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                std::env::current_dir().unwrap_or_default().join(p)
            }
        })
    }
}
