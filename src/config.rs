//! Server settings and constants.
//!
//! Server settings (listen address, where the monitored-service files live,
//! probe concurrency, logging format) are loaded from a TOML file. The list of
//! monitored services itself is kept separately as JSON, one file per
//! environment, and handled by [`crate::registry`].

use const_format::formatcp;
use serde::Deserialize;
use std::path::Path;

use crate::environment::Environment;

// =============================================================================
// HTTP Response Cache Control
// =============================================================================

/// Static dashboard assets
pub const HTTP_CACHE_STATIC_MAX_AGE: u32 = 3600;

pub const CACHE_CONTROL_STATIC: &str = formatcp!("public, max-age={}", HTTP_CACHE_STATIC_MAX_AGE);

/// API responses reflect live probe results and must never be cached
pub const CACHE_CONTROL_API: &str = "no-store";

/// Content type for every JSON body the API produces
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

// =============================================================================
// Probe Constants
// =============================================================================

pub const PROBE_USER_AGENT: &str = formatcp!("HealthCheck/{}", PROBE_AGENT_VERSION);
const PROBE_AGENT_VERSION: &str = "1.0";

pub const PROBE_ACCEPT: &str = "application/json";

/// Message on a healthy result
pub const MESSAGE_HEALTHY: &str = "Operacional";

/// Message on a result that timed out
pub const MESSAGE_TIMEOUT: &str = "Timeout";

/// Message on a transport failure that carries no text of its own
pub const MESSAGE_CONNECTION_ERROR: &str = "connection error";

/// Status text a health endpoint reports when it is up (compared case-insensitively)
pub const STATUS_UP: &str = "UP";

/// Format for result and summary timestamps (ISO local date-time)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

// =============================================================================
// Monitored-service Defaults
// =============================================================================

/// Refresh interval suggested to dashboard clients, in milliseconds
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 30_000;

/// Per-probe connect and read timeout, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Category of services that do not declare one
pub const DEFAULT_CATEGORY: &str = "Geral";

/// Expected response status of services that do not declare one
pub const DEFAULT_EXPECTED_STATUS: u16 = 200;

/// Per-environment monitored-service files, resolved inside `monitor.config_dir`
pub const CONFIG_FILE_HOMOLOG: &str = "config-homolog.json";
pub const CONFIG_FILE_PROD: &str = "config-prod.json";

/// Upper bound on probes in flight during one cycle
pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 32;

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default settings file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default directory for the per-environment service files
pub const DEFAULT_SERVICES_DIR: &str = "config";

/// Default directory for the dashboard's static files
pub const DEFAULT_STATIC_DIR: &str = "public";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "healthcheck=debug,tower_http=debug";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    pub http: HttpServerConfig,
    /// Health monitoring settings
    #[serde(default)]
    pub monitor: MonitorSettings,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where monitored services are read from and how they are probed
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    /// Directory holding `config-homolog.json` and `config-prod.json`
    #[serde(default = "MonitorSettings::default_config_dir")]
    pub config_dir: String,
    /// Directory served as the dashboard front-end
    #[serde(default = "MonitorSettings::default_static_dir")]
    pub static_dir: String,
    /// Environment active at start-up
    #[serde(default)]
    pub default_environment: Environment,
    /// Maximum number of probes in flight during one cycle (default: 32)
    #[serde(default = "MonitorSettings::default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,
    /// Overall deadline for one health cycle; unset means no deadline
    pub cycle_deadline_seconds: Option<u64>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            config_dir: Self::default_config_dir(),
            static_dir: Self::default_static_dir(),
            default_environment: Environment::default(),
            max_concurrent_probes: Self::default_max_concurrent_probes(),
            cycle_deadline_seconds: None,
        }
    }
}

impl MonitorSettings {
    fn default_config_dir() -> String {
        DEFAULT_SERVICES_DIR.to_string()
    }

    fn default_static_dir() -> String {
        DEFAULT_STATIC_DIR.to_string()
    }

    fn default_max_concurrent_probes() -> usize {
        DEFAULT_MAX_CONCURRENT_PROBES
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, SettingsError> {
        let config: AppConfig = toml::from_str(contents)?;

        if config.monitor.max_concurrent_probes == 0 {
            return Err(SettingsError::Validation(
                "monitor.max_concurrent_probes must be at least 1".to_string(),
            ));
        }

        if config.monitor.cycle_deadline_seconds == Some(0) {
            return Err(SettingsError::Validation(
                "monitor.cycle_deadline_seconds must be positive when set".to_string(),
            ));
        }

        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Settings error: {0}")]
    Validation(String),
}
