//! Probes and health cycles against mock HTTP services.

use std::sync::Arc;
use std::time::Duration;

use healthcheck::aggregator::{Aggregator, CycleLimits};
use healthcheck::environment::{Environment, EnvironmentHandle};
use healthcheck::model::{Component, HealthStatus, Service};
use healthcheck::probe::{HealthProber, HttpProber};
use healthcheck::registry::{ConfigRepository, JsonConfigRepository, MonitorConfig};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(2);

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_expected_status_without_body_is_healthy() {
    let server = MockServer::start().await;
    mount(&server, "/health", ResponseTemplate::new(200)).await;

    let service = Service::new("Auth", format!("{}/health", server.uri()));
    let result = HttpProber::new().check_health(&service, TIMEOUT).await;

    assert_eq!(result.status, HealthStatus::Healthy);
    assert_eq!(result.status_code, 200);
    assert_eq!(result.message, "Operacional");
    assert_eq!(result.root_status, None);
    assert!(result.components.is_empty());
}

#[tokio::test]
async fn test_probe_sends_identifying_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .and(header("user-agent", "HealthCheck/1.0"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let service = Service::new("Auth", format!("{}/health", server.uri()));
    let result = HttpProber::new().check_health(&service, TIMEOUT).await;

    // Without both headers the mock server answers 404
    assert_eq!(result.status_code, 200);
}

#[tokio::test]
async fn test_nested_components_downgrade_result() {
    let server = MockServer::start().await;
    let body = r#"{"status":"UP","components":{"db":{"status":"UP"},"cache":{"status":"DOWN","components":{"redis":{"status":"DOWN"}}}}}"#;
    mount(
        &server,
        "/actuator/health",
        ResponseTemplate::new(200).set_body_string(body),
    )
    .await;

    let service = Service::new("Billing", format!("{}/actuator/health", server.uri()));
    let result = HttpProber::new().check_health(&service, TIMEOUT).await;

    assert_eq!(result.status, HealthStatus::Unhealthy);
    assert_eq!(result.status_code, 200);
    assert_eq!(result.message, "Status 200");
    assert_eq!(result.root_status.as_deref(), Some("UP"));
    assert_eq!(
        result.components,
        vec![
            Component::new("db", "UP"),
            Component::new("cache", "DOWN"),
            Component::new("cache.redis", "DOWN"),
        ]
    );
}

#[tokio::test]
async fn test_unexpected_status_is_unhealthy_and_body_ignored() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/health",
        ResponseTemplate::new(503).set_body_string(r#"{"status":"DOWN"}"#),
    )
    .await;

    let service = Service::new("Search", format!("{}/health", server.uri()));
    let result = HttpProber::new().check_health(&service, TIMEOUT).await;

    assert_eq!(result.status, HealthStatus::Unhealthy);
    assert_eq!(result.status_code, 503);
    assert_eq!(result.message, "Status 503");
    assert_eq!(result.root_status, None);
}

#[tokio::test]
async fn test_custom_expected_status() {
    let server = MockServer::start().await;
    mount(&server, "/ping", ResponseTemplate::new(204)).await;

    let service = Service::new("Ping", format!("{}/ping", server.uri())).with_expected_status(204);
    let result = HttpProber::new().check_health(&service, TIMEOUT).await;

    assert_eq!(result.status, HealthStatus::Healthy);
    assert_eq!(result.status_code, 204);
}

#[tokio::test]
async fn test_plain_text_body_does_not_affect_classification() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/health",
        ResponseTemplate::new(200).set_body_string("DOWN"),
    )
    .await;

    let service = Service::new("Legacy", format!("{}/health", server.uri()));
    let result = HttpProber::new().check_health(&service, TIMEOUT).await;

    assert_eq!(result.status, HealthStatus::Healthy);
    assert_eq!(result.root_status, None);
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/health",
        ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
    )
    .await;

    let service = Service::new("Slow", format!("{}/health", server.uri()));
    let result = HttpProber::new()
        .check_health(&service, Duration::from_millis(50))
        .await;

    assert_eq!(result.status, HealthStatus::Error);
    assert_eq!(result.status_code, 0);
    assert_eq!(result.message, "Timeout");
    assert!(result.response_time_ms < 500);
}

#[tokio::test]
async fn test_refused_connection_is_error() {
    let service = Service::new("Gone", "http://127.0.0.1:1/health");
    let result = HttpProber::new().check_health(&service, TIMEOUT).await;

    assert_eq!(result.status, HealthStatus::Error);
    assert_eq!(result.status_code, 0);
    assert!(!result.message.is_empty());
}

#[tokio::test]
async fn test_invalid_url_is_error() {
    let service = Service::new("Broken", "not a url");
    let result = HttpProber::new().check_health(&service, TIMEOUT).await;

    assert_eq!(result.status, HealthStatus::Error);
    assert_eq!(result.status_code, 0);
    assert!(!result.message.is_empty());
}

#[tokio::test]
async fn test_cycle_over_saved_configuration() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/auth",
        ResponseTemplate::new(200).set_body_string(r#"{"status":"UP"}"#),
    )
    .await;
    mount(&server, "/billing", ResponseTemplate::new(500)).await;
    mount(
        &server,
        "/search",
        ResponseTemplate::new(200).set_body_string(r#"{"status":"DOWN"}"#),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let environment = EnvironmentHandle::new(Environment::Homolog);
    let registry = Arc::new(JsonConfigRepository::new(dir.path(), environment.clone()));
    let config = MonitorConfig {
        refresh_interval_ms: 30_000,
        timeout_ms: 2_000,
        services: vec![
            Service::new("Auth", format!("{}/auth", server.uri())).with_category("Core"),
            Service::new("Billing", format!("{}/billing", server.uri())).with_category("Payments"),
            Service::new("Search", format!("{}/search", server.uri())).with_category("Core"),
            Service::new("Gone", "http://127.0.0.1:1/health"),
        ],
    };
    registry.save_config(&config).await.unwrap();

    let aggregator = Aggregator::new(
        registry.clone(),
        Arc::new(HttpProber::new()),
        CycleLimits {
            max_concurrent_probes: 2,
            deadline: None,
        },
    );
    let report = aggregator.run_cycle().await;

    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.healthy, 1);
    assert_eq!(report.summary.unhealthy, 2);
    assert_eq!(report.summary.errors, 1);

    let categories = report
        .services_by_category
        .iter()
        .map(|group| group.category.as_str())
        .collect::<Vec<_>>();
    assert_eq!(categories, vec!["Core", "Payments", "Geral"]);

    let core = report.category("Core").unwrap();
    assert_eq!(core[0].service_name, "Auth");
    assert_eq!(core[1].service_name, "Search");
    assert_eq!(core[1].root_status.as_deref(), Some("DOWN"));

    // The other environment has no services yet
    environment.set(Environment::Prod);
    let report = aggregator.run_cycle().await;
    assert_eq!(report.summary.total, 0);
}
