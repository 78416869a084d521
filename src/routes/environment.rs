//! Active environment selection.

use axum::extract::State;
use tracing::instrument;

use super::JsonResponse;
use crate::environment::Environment;
use crate::error::AppError;
use crate::json::{self, JsonObject, JsonValue};
use crate::state::AppState;

pub async fn show(State(state): State<AppState>) -> JsonResponse {
    let available = Environment::ALL
        .iter()
        .map(|environment| JsonValue::from(environment.as_str()))
        .collect::<Vec<_>>();

    JsonResponse::ok(
        JsonObject::new()
            .with("current", state.environment.current().as_str())
            .with("available", available),
    )
}

/// Switch the environment whose service file subsequent cycles and saves use.
#[instrument(name = "environment::switch", skip(state, body))]
pub async fn switch(State(state): State<AppState>, body: String) -> Result<JsonResponse, AppError> {
    let request = json::parse(&body)?;
    let requested = request
        .as_object()
        .and_then(|object| object.get_text("environment"))
        .filter(|text| !text.trim().trim_matches(|c: char| c == '"' || c == '\'').trim().is_empty())
        .ok_or_else(|| {
            AppError::BadRequest("Campo 'environment' não encontrado ou vazio".to_string())
        })?;

    let environment = requested.parse::<Environment>().map_err(|e| {
        AppError::BadRequest(format!(
            "Ambiente inválido: '{}'. Use 'homolog' ou 'prod'",
            e.0
        ))
    })?;

    let previous = state.environment.set(environment);
    tracing::info!(from = %previous, to = %environment, "Switched environment");

    Ok(JsonResponse::ok(
        JsonObject::new()
            .with("success", true)
            .with("environment", environment.as_str())
            .with("message", format!("Ambiente alterado para: {}", environment)),
    ))
}
