//! Health endpoints.
//!
//! `/api/health` runs a full health cycle over the monitored services.
//! `/health` is the liveness probe of this process itself, used by container
//! orchestration and load balancers.

use axum::extract::State;

use super::JsonResponse;
use crate::state::AppState;

/// Run one health cycle and return the grouped report.
pub async fn report(State(state): State<AppState>) -> JsonResponse {
    let report = state.aggregator.run_cycle().await;
    JsonResponse::ok(report.to_json())
}

/// Liveness handler.
///
/// Returns a simple "ok" response to indicate the service is running.
pub async fn liveness() -> &'static str {
    "ok"
}
