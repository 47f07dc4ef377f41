//! Engine configuration
//!
//! Loaded from a JSON file. Every key is optional; missing keys take their
//! defaults. The parsed configuration is validated before use.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event, Logger, Severity};

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for this schema
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration parsed but holds an unusable value
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "CONFIG_IO",
            ConfigError::Parse(_) => "CONFIG_PARSE",
            ConfigError::Invalid(_) => "CONFIG_INVALID",
        }
    }
}

/// What to do with a flat-list node whose parent id matches no node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Fail with `DanglingReference`
    #[default]
    Reject,
    /// Keep the node as an additional root
    TreatAsRoot,
}

/// What to do with input keys the schema does not declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Fail with `UnknownField`
    #[default]
    Reject,
    /// Drop the key silently
    Ignore,
}

/// Validation engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Deepest nesting level allowed; the top-level record is depth 0
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Flat-list reconstruction policy for unknown parent ids
    #[serde(default)]
    pub orphan_policy: OrphanPolicy,

    /// Handling of undeclared input keys
    #[serde(default)]
    pub unknown_fields: UnknownFieldPolicy,

    /// Minimum log severity (`trace`, `info`, `warn`, `error`)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_depth() -> usize {
    32
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            orphan_policy: OrphanPolicy::default(),
            unknown_fields: UnknownFieldPolicy::default(),
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from file and apply its `log_level` to the
    /// process-wide logger.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_json(&content)?;
        config.apply_logging();

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", &path.display().to_string()),
                ("max_depth", &config.max_depth.to_string()),
            ],
        );

        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be > 0".into()));
        }

        if Severity::from_level(&self.log_level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "Invalid log_level: '{}'. Expected trace, info, warn or error.",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Returns a copy with a different depth bound
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns a copy with a different orphan policy
    pub fn with_orphan_policy(mut self, policy: OrphanPolicy) -> Self {
        self.orphan_policy = policy;
        self
    }

    /// Returns a copy with a different unknown-field policy
    pub fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    /// Applies `log_level` to the process-wide logger
    pub fn apply_logging(&self) {
        if let Some(severity) = Severity::from_level(&self.log_level) {
            Logger::set_min_severity(severity);
        }
    }
}
