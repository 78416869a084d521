//! Monitored services and the results of probing them.

use std::fmt;

use chrono::{DateTime, Local};

use crate::config::{DEFAULT_CATEGORY, DEFAULT_EXPECTED_STATUS, TIMESTAMP_FORMAT};
use crate::json::{JsonObject, JsonValue};

/// A monitored HTTP service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub url: String,
    /// Grouping label in the report
    pub category: String,
    /// Response status that counts as healthy
    pub expected_status: u16,
}

impl Service {
    /// A service in the default category expecting `200`.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category: DEFAULT_CATEGORY.to_string(),
            expected_status: DEFAULT_EXPECTED_STATUS,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_expected_status(mut self, expected_status: u16) -> Self {
        self.expected_status = expected_status;
        self
    }
}

/// Outcome class of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    /// The request itself failed (timeout, refused connection, ...)
    Error,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Error => "error",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-system status reported inside a health response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Dot-joined chain of component names, e.g. `cache.redis`
    pub path: String,
    pub status: String,
}

impl Component {
    pub fn new(path: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: status.into(),
        }
    }
}

/// Result of probing one service.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthCheckResult {
    pub service_name: String,
    pub service_url: String,
    pub category: String,
    pub status: HealthStatus,
    /// `0` when no response was received
    pub status_code: u16,
    pub response_time_ms: u64,
    /// When the probe started
    pub timestamp: DateTime<Local>,
    pub message: String,
    /// Top-level `status` of a JSON health body
    pub root_status: Option<String>,
    /// Flattened component statuses, in traversal order
    pub components: Vec<Component>,
}

impl HealthCheckResult {
    /// Report record:
    /// `{name, url, category, status, statusCode, responseTime, timestamp, message, healthDetails?}`.
    ///
    /// `healthDetails` is only present when the body reported a root status
    /// or at least one component.
    pub fn to_json(&self) -> JsonValue {
        let mut record = JsonObject::new()
            .with("name", self.service_name.as_str())
            .with("url", self.service_url.as_str())
            .with("category", self.category.as_str())
            .with("status", self.status.as_str())
            .with("statusCode", self.status_code)
            .with("responseTime", self.response_time_ms)
            .with("timestamp", format_timestamp(&self.timestamp))
            .with("message", self.message.as_str());

        if self.root_status.is_some() || !self.components.is_empty() {
            let mut details = JsonObject::new().with("rootStatus", self.root_status.clone());
            if !self.components.is_empty() {
                let components = self
                    .components
                    .iter()
                    .map(|component| {
                        JsonValue::Object(
                            JsonObject::new()
                                .with("name", component.path.as_str())
                                .with("status", component.status.as_str()),
                        )
                    })
                    .collect::<Vec<_>>();
                details.insert("components", components);
            }
            record.insert("healthDetails", details);
        }

        JsonValue::Object(record)
    }
}

pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> HealthCheckResult {
        HealthCheckResult {
            service_name: "Auth".to_string(),
            service_url: "http://auth/health".to_string(),
            category: "Core".to_string(),
            status: HealthStatus::Healthy,
            status_code: 200,
            response_time_ms: 12,
            timestamp: Local::now(),
            message: "Operacional".to_string(),
            root_status: None,
            components: vec![],
        }
    }

    #[test]
    fn test_service_defaults() {
        let service = Service::new("Auth", "http://auth/health");
        assert_eq!(service.category, "Geral");
        assert_eq!(service.expected_status, 200);
    }

    #[test]
    fn test_health_status_display() {
        assert_eq!(format!("{}", HealthStatus::Healthy), "healthy");
        assert_eq!(format!("{}", HealthStatus::Unhealthy), "unhealthy");
        assert_eq!(format!("{}", HealthStatus::Error), "error");
    }

    #[test]
    fn test_record_without_details() {
        let json = result().to_json();
        let record = json.as_object().unwrap();
        assert_eq!(
            record.keys().collect::<Vec<_>>(),
            vec![
                "name",
                "url",
                "category",
                "status",
                "statusCode",
                "responseTime",
                "timestamp",
                "message"
            ]
        );
        assert_eq!(record.get_text("status").as_deref(), Some("healthy"));
        assert_eq!(record.get_int_or("statusCode", 0), 200);
    }

    #[test]
    fn test_record_with_details() {
        let mut result = result();
        result.root_status = Some("UP".to_string());
        result.components = vec![Component::new("db", "UP"), Component::new("db.pool", "UP")];

        let json = result.to_json();
        let details = json.as_object().unwrap().get_object("healthDetails").unwrap();
        assert_eq!(details.get_text("rootStatus").as_deref(), Some("UP"));

        let components = details.get_array("components").unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(
            components[1].as_object().unwrap().get_text("name").as_deref(),
            Some("db.pool")
        );
    }

    #[test]
    fn test_record_with_components_but_no_root_status() {
        let mut result = result();
        result.components = vec![Component::new("db", "DOWN")];

        let json = result.to_json();
        let details = json.as_object().unwrap().get_object("healthDetails").unwrap();
        assert_eq!(details.get("rootStatus"), Some(&JsonValue::Null));
    }
}
