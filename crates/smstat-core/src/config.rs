//! TOML configuration
//!
//! Looked up at `<config_dir>/smstat/config.toml` unless a path is given.
//! Every section is optional; a missing default file yields defaults.
//!
//! ```toml
//! [storage]
//! backend = "sqlite"          # or "memory"
//! path = "/var/lib/smstat/smstat.db"
//!
//! [stats]
//! country_fee_enabled = false
//! top_senders_limit = 5
//! match_policy = "first_match"
//!
//! [logging]
//! level = "warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::classifier::MatchPolicy;
use crate::error::CoreError;
use crate::service::{ServiceOptions, SmsService};
use crate::stats::OutputMode;
use crate::store::{MemoryStore, RecordStore, SqliteStore};

/// Storage backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    #[default]
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    /// Database file; defaults to `<data_local_dir>/smstat/smstat.db`
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(default_db_path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub country_fee_enabled: bool,
    pub top_senders_limit: i64,
    pub match_policy: MatchPolicy,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            country_fee_enabled: false,
            top_senders_limit: 5,
            match_policy: MatchPolicy::FirstMatch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Full configuration file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub stats: StatsConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                CoreError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let config = Self::parse(&content, path)?;
        debug!(?path, "Loaded config");
        Ok(config)
    }

    /// Load `path` when given, else the default location
    ///
    /// An explicit path must exist. The default file is optional.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, CoreError> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) => match Self::load(&path) {
                Err(CoreError::FileNotFound { .. }) => {
                    debug!(?path, "Config file not found, using defaults");
                    Ok(Self::default())
                }
                other => other,
            },
            None => Ok(Self::default()),
        }
    }

    fn parse(content: &str, path: &Path) -> Result<Self, CoreError> {
        let config: Config = toml::from_str(content).map_err(|e| CoreError::TomlParse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.stats.top_senders_limit < 0 {
            return Err(CoreError::InvalidConfig {
                message: format!(
                    "stats.top_senders_limit must be >= 0, got {}",
                    self.stats.top_senders_limit
                ),
            });
        }
        if self.storage.backend == Backend::Sqlite && self.storage.resolved_path().is_none() {
            return Err(CoreError::InvalidConfig {
                message: "storage.path is required when no data directory is available"
                    .to_string(),
            });
        }
        Ok(())
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            output_mode: OutputMode::from_enabled(self.stats.country_fee_enabled),
            match_policy: self.stats.match_policy,
        }
    }

    /// Open the configured store
    pub fn open_store(&self) -> Result<Arc<dyn RecordStore>, CoreError> {
        match self.storage.backend {
            Backend::Memory => Ok(Arc::new(MemoryStore::new())),
            Backend::Sqlite => {
                let path = self.storage.resolved_path().ok_or_else(|| {
                    CoreError::InvalidConfig {
                        message: "no database path configured".to_string(),
                    }
                })?;
                Ok(Arc::new(SqliteStore::open(&path)?))
            }
        }
    }

    /// Store plus options, ready to use
    pub fn build_service(&self) -> Result<SmsService, CoreError> {
        Ok(SmsService::new(self.open_store()?, self.service_options()))
    }
}

/// `<config_dir>/smstat/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("smstat").join("config.toml"))
}

/// `<data_local_dir>/smstat/smstat.db`
pub fn default_db_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("smstat").join("smstat.db"))
}
