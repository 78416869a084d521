//! One outbound health check per service.
//!
//! A probe issues a single `GET` and classifies the outcome:
//!
//! - the response status equals the service's expected status: healthy,
//!   otherwise unhealthy
//! - a 2xx response whose body is a JSON object may downgrade a healthy
//!   result, when its root `status` or any nested component status is not `UP`
//! - a timeout or transport failure: error, with status code `0`
//!
//! Failures never leave the prober; they are always turned into a result.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Local;
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::instrument;

use crate::config::{
    MESSAGE_CONNECTION_ERROR, MESSAGE_HEALTHY, MESSAGE_TIMEOUT, PROBE_ACCEPT, PROBE_USER_AGENT,
    STATUS_UP,
};
use crate::json::{self, JsonObject};
use crate::model::{Component, HealthCheckResult, HealthStatus, Service};

/// Performs a health check against one service.
#[async_trait]
pub trait HealthProber: Send + Sync {
    /// Probe `service`, bounding connect and read by `timeout` each.
    async fn check_health(&self, service: &Service, timeout: Duration) -> HealthCheckResult;
}

/// Failure to obtain any response from a service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("Timeout")]
    Timeout,
    #[error("{0}")]
    Transport(String),
}

impl ProbeError {
    fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return ProbeError::Timeout;
        }
        ProbeError::Transport(innermost_message(error))
    }

    /// Result message for this failure.
    pub fn message(&self) -> String {
        match self {
            ProbeError::Timeout => MESSAGE_TIMEOUT.to_string(),
            ProbeError::Transport(text) if text.trim().is_empty() => {
                MESSAGE_CONNECTION_ERROR.to_string()
            }
            ProbeError::Transport(text) => text.clone(),
        }
    }
}

/// Text of the deepest error in the source chain, e.g.
/// `Connection refused (os error 111)` rather than reqwest's generic wrapper.
fn innermost_message(error: &(dyn std::error::Error + 'static)) -> String {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

/// Probe over HTTP with reqwest.
///
/// The client is rebuilt only when the timeout changes between cycles.
#[derive(Debug, Default)]
pub struct HttpProber {
    client: Mutex<Option<(Duration, reqwest::Client)>>,
}

impl HttpProber {
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self, timeout: Duration) -> Result<reqwest::Client, ProbeError> {
        let mut cached = self.client.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached_timeout, client)) = cached.as_ref() {
            if *cached_timeout == timeout {
                return Ok(client.clone());
            }
        }

        let client = reqwest::Client::builder()
            .user_agent(PROBE_USER_AGENT)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            // Connect plus read, the worst case of the two separate bounds
            .timeout(timeout.saturating_mul(2))
            .build()
            .map_err(|e| ProbeError::Transport(innermost_message(&e)))?;
        *cached = Some((timeout, client.clone()));
        Ok(client)
    }

    /// Status code and, for 2xx responses, the body text.
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<(u16, Option<String>), ProbeError> {
        let client = self.client(timeout)?;
        let response = client
            .get(url)
            .header(USER_AGENT, PROBE_USER_AGENT)
            .header(ACCEPT, PROBE_ACCEPT)
            .send()
            .await
            .map_err(|e| ProbeError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Ok((status.as_u16(), None));
        }

        // A body that cannot be read leaves the status-code verdict alone
        let body = match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::debug!(url, error = %e, "Failed to read health body");
                None
            }
        };
        Ok((status.as_u16(), body))
    }
}

#[async_trait]
impl HealthProber for HttpProber {
    #[instrument(
        name = "probe.check_health",
        skip(self, service),
        fields(service = %service.name, url = %service.url, status_code, duration_ms)
    )]
    async fn check_health(&self, service: &Service, timeout: Duration) -> HealthCheckResult {
        let timestamp = Local::now();
        let start = Instant::now();

        let outcome = self
            .fetch(&service.url, timeout)
            .await
            .map(|(status_code, body)| evaluate(service.expected_status, status_code, body.as_deref()));

        let response_time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let span = tracing::Span::current();
        span.record("duration_ms", response_time_ms);

        let mut result = HealthCheckResult {
            service_name: service.name.clone(),
            service_url: service.url.clone(),
            category: service.category.clone(),
            status: HealthStatus::Error,
            status_code: 0,
            response_time_ms,
            timestamp,
            message: String::new(),
            root_status: None,
            components: Vec::new(),
        };

        match outcome {
            Ok(evaluation) => {
                span.record("status_code", evaluation.status_code);
                result.status = evaluation.status;
                result.status_code = evaluation.status_code;
                result.message = evaluation.message;
                result.root_status = evaluation.root_status;
                result.components = evaluation.components;
                tracing::debug!(status = %result.status, "Probe completed");
            }
            Err(e) => {
                result.message = e.message();
                tracing::debug!(error = %e, "Probe failed");
            }
        }

        result
    }
}

/// Classification of a response that was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub status: HealthStatus,
    pub status_code: u16,
    pub message: String,
    pub root_status: Option<String>,
    pub components: Vec<Component>,
}

/// Classify a received response.
///
/// `body` is only inspected for 2xx status codes and only when, once trimmed,
/// it looks like a JSON object. A body that fails to parse is ignored.
pub fn evaluate(expected_status: u16, status_code: u16, body: Option<&str>) -> Evaluation {
    let mut healthy = status_code == expected_status;
    let mut root_status = None;
    let mut components = Vec::new();

    if let Some(details) = body
        .filter(|_| (200..300).contains(&status_code))
        .and_then(parse_health_body)
    {
        root_status = details.0;
        components = details.1;

        if root_status.as_deref().is_some_and(|status| !is_up(status)) {
            healthy = false;
        }
        if components.iter().any(|component| !is_up(&component.status)) {
            healthy = false;
        }
    }

    let (status, message) = if healthy {
        (HealthStatus::Healthy, MESSAGE_HEALTHY.to_string())
    } else {
        (HealthStatus::Unhealthy, format!("Status {}", status_code))
    };

    Evaluation {
        status,
        status_code,
        message,
        root_status,
        components,
    }
}

fn is_up(status: &str) -> bool {
    status.eq_ignore_ascii_case(STATUS_UP)
}

/// Root status and flattened components of a JSON health body.
fn parse_health_body(body: &str) -> Option<(Option<String>, Vec<Component>)> {
    let body = body.trim();
    if !(body.starts_with('{') && body.ends_with('}')) {
        return None;
    }

    let value = match json::parse(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unparsable health body");
            return None;
        }
    };
    let object = value.as_object()?;

    let root_status = object.get_text("status").filter(|status| !status.is_empty());
    let components = object
        .get_object("components")
        .map(|components| extract_components(components, ""))
        .unwrap_or_default();

    Some((root_status, components))
}

/// Flatten a `components` tree depth-first.
///
/// Each entry whose value is an object contributes a component named by the
/// dot-joined path from `parent` when it has a non-empty `status`, followed by
/// its own nested `components`, if any.
pub fn extract_components(components: &JsonObject, parent: &str) -> Vec<Component> {
    let mut found = Vec::new();
    collect_components(components, parent, &mut found);
    found
}

fn collect_components(components: &JsonObject, parent: &str, found: &mut Vec<Component>) {
    for (name, value) in components.iter() {
        let Some(entry) = value.as_object() else {
            continue;
        };
        let path = if parent.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", parent, name)
        };

        if let Some(status) = entry.get_text("status").filter(|status| !status.is_empty()) {
            found.push(Component::new(path.clone(), status));
        }
        if let Some(nested) = entry.get_object("components") {
            collect_components(nested, &path, found);
        }
    }
}
