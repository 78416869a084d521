//! Monitored-service configuration of the active environment.

use axum::extract::State;
use tracing::instrument;

use super::JsonResponse;
use crate::error::AppError;
use crate::json::{self, JsonObject};
use crate::registry::MonitorConfig;
use crate::state::AppState;

/// Current configuration plus the environment it belongs to.
pub async fn show(State(state): State<AppState>) -> JsonResponse {
    let config = state.registry.load_config().await;

    JsonResponse::ok(
        JsonObject::new()
            .with("refreshInterval", config.refresh_interval_ms)
            .with("timeout", config.timeout_ms)
            .with("environment", state.environment.current().as_str())
            .with("services", config.services_json()),
    )
}

/// Replace the configuration of the active environment.
#[instrument(name = "config::update", skip(state, body), fields(environment))]
pub async fn update(State(state): State<AppState>, body: String) -> Result<JsonResponse, AppError> {
    let environment = state.environment.current();
    tracing::Span::current().record("environment", environment.as_str());

    let request = json::parse(&body)?;
    let config = MonitorConfig::from_json(&request)?;
    state.registry.save_config(&config).await?;

    Ok(JsonResponse::ok(
        JsonObject::new()
            .with("success", true)
            .with("message", "Configuração atualizada com sucesso")
            .with("environment", environment.as_str()),
    ))
}
