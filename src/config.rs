//! Engine configuration
//!
//! Loaded from a JSON file. Every field except `base_url` is optional and
//! falls back to its default.
//!
//! ```json
//! { "base_url": "http://localhost:8080/api/visualizer", "debounce_ms": 600 }
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::{Logger, Severity};

/// Configuration error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    /// File could not be read
    ConfigIo,
    /// File is not valid JSON for this structure
    ConfigParse,
    /// A value is out of range
    ConfigInvalid,
}

impl ConfigErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigIo => "VIZ_CONFIG_IO",
            Self::ConfigParse => "VIZ_CONFIG_PARSE",
            Self::ConfigInvalid => "VIZ_CONFIG_INVALID",
        }
    }
}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    code: ConfigErrorCode,
    message: String,
}

impl ConfigError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::ConfigIo,
            message: msg.into(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::ConfigParse,
            message: msg.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::ConfigInvalid,
            message: msg.into(),
        }
    }

    pub fn code(&self) -> ConfigErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizerConfig {
    /// Base URL of the schema and query endpoints
    pub base_url: String,

    /// Quiet period before a changed request is committed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How long a cached result is served without refetching
    #[serde(default = "default_fresh_ttl_secs")]
    pub fresh_ttl_secs: u64,

    /// How long a cached result is kept at all
    #[serde(default = "default_retain_ttl_secs")]
    pub retain_ttl_secs: u64,

    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default = "default_max_limit")]
    pub max_limit: u32,

    /// Deepest group nesting the editor allows; the root is level 1
    #[serde(default = "default_max_filter_depth")]
    pub max_filter_depth: usize,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Ask the query service to report the joins it used
    #[serde(default)]
    pub include_join_hint: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_url() -> String {
    "http://localhost:8080/api/visualizer".to_string()
}
fn default_debounce_ms() -> u64 {
    600
}
fn default_fresh_ttl_secs() -> u64 {
    30
}
fn default_retain_ttl_secs() -> u64 {
    300
}
fn default_limit() -> u32 {
    1000
}
fn default_max_limit() -> u32 {
    10_000
}
fn default_max_filter_depth() -> usize {
    4
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            debounce_ms: default_debounce_ms(),
            fresh_ttl_secs: default_fresh_ttl_secs(),
            retain_ttl_secs: default_retain_ttl_secs(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            max_filter_depth: default_max_filter_depth(),
            request_timeout_ms: default_request_timeout_ms(),
            include_join_hint: false,
            log_level: default_log_level(),
        }
    }
}

impl VisualizerConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::io(format!("Failed to read config: {}", e)))?;

        let config: VisualizerConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::parse(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("base_url must not be empty"));
        }

        if self.fresh_ttl_secs > self.retain_ttl_secs {
            return Err(ConfigError::invalid(format!(
                "fresh_ttl_secs ({}) must not exceed retain_ttl_secs ({})",
                self.fresh_ttl_secs, self.retain_ttl_secs
            )));
        }

        if self.default_limit == 0 || self.max_limit == 0 {
            return Err(ConfigError::invalid("limits must be > 0"));
        }

        if self.default_limit > self.max_limit {
            return Err(ConfigError::invalid(format!(
                "default_limit ({}) must not exceed max_limit ({})",
                self.default_limit, self.max_limit
            )));
        }

        if self.max_filter_depth == 0 {
            return Err(ConfigError::invalid("max_filter_depth must be >= 1"));
        }

        if self.request_timeout_ms == 0 {
            return Err(ConfigError::invalid("request_timeout_ms must be > 0"));
        }

        self.severity()?;

        Ok(())
    }

    pub fn severity(&self) -> ConfigResult<Severity> {
        Severity::parse(&self.log_level).ok_or_else(|| {
            ConfigError::invalid(format!("Invalid log_level: '{}'", self.log_level))
        })
    }

    /// Installs `log_level` as the process-wide minimum severity
    pub fn apply_logging(&self) -> ConfigResult<()> {
        Logger::set_min_severity(self.severity()?);
        Ok(())
    }
}
