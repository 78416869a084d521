//! Persisted list of monitored services.
//!
//! The list lives in a JSON file per environment:
//!
//! ```json
//! {"refreshInterval":30000,"timeout":5000,"services":[
//!   {"name":"Auth","url":"http://x/health","category":"Core","expectedStatus":200}
//! ]}
//! ```
//!
//! Loading never fails: a missing, unreadable or malformed file yields the
//! default configuration so a health cycle can always run. Saving replaces
//! the file wholesale and reports failures to the caller.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::{
    DEFAULT_CATEGORY, DEFAULT_EXPECTED_STATUS, DEFAULT_REFRESH_INTERVAL_MS, DEFAULT_TIMEOUT_MS,
};
use crate::environment::EnvironmentHandle;
use crate::json::{self, JsonObject, JsonValue, ParseError};
use crate::model::Service;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access service config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed service config: {0}")]
    Parse(#[from] ParseError),
    #[error("Invalid service config: {0}")]
    Invalid(String),
}

/// Global timing parameters plus the ordered list of monitored services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Refresh interval suggested to dashboard clients
    pub refresh_interval_ms: u64,
    /// Connect and read timeout applied to each probe
    pub timeout_ms: u64,
    pub services: Vec<Service>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            services: Vec::new(),
        }
    }
}

impl MonitorConfig {
    /// Read the persisted format strictly, as submitted through the API.
    ///
    /// Missing timing keys and service fields take their defaults; a service
    /// entry without `name` or `url`, a negative timing value or an
    /// `expectedStatus` above the status range is invalid.
    pub fn from_json(value: &JsonValue) -> Result<Self, ConfigError> {
        Self::read(value, Mode::Strict)
    }

    /// Read a stored file, keeping whatever is usable.
    ///
    /// Service entries without `name` or `url` are skipped and out-of-range
    /// values fall back to their defaults, each logged at `warn`. Only a file
    /// that is not an object, or whose `services` is not an array, is invalid.
    pub fn from_json_lenient(value: &JsonValue) -> Result<Self, ConfigError> {
        Self::read(value, Mode::Lenient)
    }

    fn read(value: &JsonValue, mode: Mode) -> Result<Self, ConfigError> {
        let root = value
            .as_object()
            .ok_or_else(|| ConfigError::Invalid("top level must be an object".to_string()))?;

        let refresh_interval_ms =
            timing(root, "refreshInterval", DEFAULT_REFRESH_INTERVAL_MS, mode)?;
        let timeout_ms = timing(root, "timeout", DEFAULT_TIMEOUT_MS, mode)?;

        let services = match root.get("services") {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(entries)) => {
                let mut services = Vec::with_capacity(entries.len());
                for (index, entry) in entries.iter().enumerate() {
                    match service_from_json(index, entry, mode) {
                        Ok(service) => services.push(service),
                        Err(e) if mode == Mode::Lenient => {
                            tracing::warn!(index, error = %e, "Skipping service entry");
                        }
                        Err(e) => return Err(e),
                    }
                }
                services
            }
            Some(_) => {
                return Err(ConfigError::Invalid("'services' must be an array".to_string()));
            }
        };

        Ok(Self {
            refresh_interval_ms,
            timeout_ms,
            services,
        })
    }

    /// Persisted format, keys in a fixed order.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            JsonObject::new()
                .with("refreshInterval", self.refresh_interval_ms)
                .with("timeout", self.timeout_ms)
                .with("services", self.services_json()),
        )
    }

    /// The `services` array of the persisted format.
    pub fn services_json(&self) -> JsonValue {
        JsonValue::Array(self.services.iter().map(service_to_json).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Strict,
    Lenient,
}

/// Millisecond setting; `0` means unset and takes `default`.
fn timing(root: &JsonObject, key: &str, default: u64, mode: Mode) -> Result<u64, ConfigError> {
    let value = root.get_int_or(key, default as i64);
    match u64::try_from(value) {
        Ok(0) => Ok(default),
        Ok(value) => Ok(value),
        Err(_) if mode == Mode::Lenient => {
            tracing::warn!(key, value, default, "Negative setting, using default");
            Ok(default)
        }
        Err(_) => Err(ConfigError::Invalid(format!(
            "'{}' must not be negative, got {}",
            key, value
        ))),
    }
}

fn service_from_json(index: usize, entry: &JsonValue, mode: Mode) -> Result<Service, ConfigError> {
    let object = entry
        .as_object()
        .ok_or_else(|| ConfigError::Invalid(format!("service #{} is not an object", index)))?;

    let required = |key: &str| {
        object
            .get_text(key)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ConfigError::Invalid(format!("service #{} has no '{}'", index, key)))
    };
    let name = required("name")?;
    let url = required("url")?;

    let category = object
        .get_text("category")
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let expected = object.get_int_or("expectedStatus", DEFAULT_EXPECTED_STATUS.into());
    let expected_status = match u16::try_from(expected) {
        // Unset, zero or negative
        _ if expected <= 0 => DEFAULT_EXPECTED_STATUS,
        Ok(status) => status,
        Err(_) if mode == Mode::Lenient => {
            tracing::warn!(service = %name, expected, "Out-of-range expectedStatus, using default");
            DEFAULT_EXPECTED_STATUS
        }
        Err(_) => {
            return Err(ConfigError::Invalid(format!(
                "service '{}' has out-of-range expectedStatus {}",
                name, expected
            )));
        }
    };

    Ok(Service {
        name,
        url,
        category,
        expected_status,
    })
}

fn service_to_json(service: &Service) -> JsonValue {
    JsonValue::Object(
        JsonObject::new()
            .with("name", service.name.as_str())
            .with("url", service.url.as_str())
            .with("category", service.category.as_str())
            .with("expectedStatus", service.expected_status),
    )
}

/// Source of the monitored-service configuration.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Current configuration, or the default one if it cannot be read.
    async fn load_config(&self) -> MonitorConfig;

    /// Replace the stored configuration.
    async fn save_config(&self, config: &MonitorConfig) -> Result<(), ConfigError>;
}

/// Configuration stored as JSON files, one per environment.
#[derive(Debug, Clone)]
pub struct JsonConfigRepository {
    dir: PathBuf,
    environment: EnvironmentHandle,
}

impl JsonConfigRepository {
    pub fn new(dir: impl Into<PathBuf>, environment: EnvironmentHandle) -> Self {
        Self {
            dir: dir.into(),
            environment,
        }
    }

    /// File backing the active environment.
    pub fn path(&self) -> PathBuf {
        self.environment.config_path(&self.dir)
    }

    /// Load from `path`, reporting files that cannot be read or parsed at
    /// all. A missing file is the default configuration.
    pub async fn read_from(path: &Path) -> Result<MonitorConfig, ConfigError> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Service config not found, using defaults");
                return Ok(MonitorConfig::default());
            }
            Err(e) => return Err(e.into()),
        };
        let value = json::parse(&contents)?;
        MonitorConfig::from_json_lenient(&value)
    }
}

#[async_trait]
impl ConfigRepository for JsonConfigRepository {
    async fn load_config(&self) -> MonitorConfig {
        // Resolve once so a concurrent environment switch cannot mix files
        let path = self.path();
        match Self::read_from(&path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load service config, using defaults"
                );
                MonitorConfig::default()
            }
        }
    }

    async fn save_config(&self, config: &MonitorConfig) -> Result<(), ConfigError> {
        let path = self.path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, json::serialize(&config.to_json())).await?;
        tracing::info!(
            path = %path.display(),
            services = config.services.len(),
            "Saved service config"
        );
        Ok(())
    }
}
