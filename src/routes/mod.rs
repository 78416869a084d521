//! HTTP route handlers for the dashboard API.
//!
//! Every JSON body, in and out, goes through [`crate::json`]. API responses
//! are never cached; the static dashboard gets a long Cache-Control. All
//! responses allow any origin.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod config;
pub mod environment;
pub mod health;

use axum::{
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use http::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE};
use http::StatusCode;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::{CACHE_CONTROL_API, CACHE_CONTROL_STATIC, JSON_CONTENT_TYPE};
use crate::http::static_files::create_static_service;
use crate::json::{self, JsonValue};
use crate::middleware::request_id_layer;
use crate::state::AppState;

/// JSON body rendered with the in-crate serializer.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse(pub StatusCode, pub JsonValue);

impl JsonResponse {
    pub fn ok(value: impl Into<JsonValue>) -> Self {
        Self(StatusCode::OK, value.into())
    }
}

impl IntoResponse for JsonResponse {
    fn into_response(self) -> Response {
        (
            self.0,
            [(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            json::serialize(&self.1),
        )
            .into_response()
    }
}

/// Creates the Axum router with all routes and headers.
pub fn create_router(state: AppState) -> Router {
    // API - never cached, every call reflects the current configuration
    let api_routes = Router::new()
        .route("/api/health", get(health::report))
        .route("/api/config", get(config::show).post(config::update))
        .route(
            "/api/environment",
            get(environment::show).post(environment::switch),
        )
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_API),
        ));

    // Health check - no caching, always fresh for liveness probes
    let health_routes = Router::new().route("/health", get(health::liveness));

    // Dashboard front-end, anything no route above matched
    let static_routes = Router::new()
        .fallback_service(create_static_service(&state.config.monitor.static_dir))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_STATIC),
        ));

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .merge(static_routes)
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
