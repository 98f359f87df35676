//! Core configuration.
//!
//! # Responsibility
//! - Describe tunables for logging, undo history, search and sync.
//! - Load them from JSON with per-field defaults and validate the result.
//!
//! # Invariants
//! - A missing section or field falls back to its default.
//! - A loaded config has already passed [`CoreConfig::validate`].

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_UNDO_DEPTH: usize = 100;
const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 500;

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    crate::logging::default_log_level().to_string()
}

fn default_undo_depth() -> usize {
    DEFAULT_UNDO_DEPTH
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Top-level configuration for one core instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Logging configuration. Logging stays off while `log_dir` is unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_dir: None,
        }
    }
}

/// Action engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of undo snapshots kept per session. `0` disables undo.
    #[serde(default = "default_undo_depth")]
    pub undo_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            undo_depth: DEFAULT_UNDO_DEPTH,
        }
    }
}

/// Item picker search configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Sync engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Replace a pending content write when a newer one for the same item
    /// is queued.
    #[serde(default = "default_true")]
    pub coalesce_edits: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            coalesce_edits: true,
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, err) => write!(f, "failed to read config `{}`: {err}", path.display()),
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid config `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(_, err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl CoreConfig {
    /// Parses and validates JSON configuration text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::logging::normalize_level(&self.logging.level).map_err(|reason| {
            ConfigError::Invalid {
                field: "logging.level",
                reason,
            }
        })?;
        if let Some(dir) = &self.logging.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid {
                    field: "logging.log_dir",
                    reason: format!("must be an absolute path, got `{}`", dir.display()),
                });
            }
        }
        if self.search.page_size == 0 || self.search.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid {
                field: "search.page_size",
                reason: format!("must be within 1..={MAX_PAGE_SIZE}"),
            });
        }
        Ok(())
    }
}
