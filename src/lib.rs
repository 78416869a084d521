//! HealthCheck: polls a configurable list of HTTP services and reports their
//! health grouped by category.
//!
//! The crate bundles a small JSON implementation ([`json`]), the monitored
//! service registry ([`registry`]), the HTTP prober ([`probe`]) and the
//! concurrent health cycle ([`aggregator`]), plus the axum dashboard API that
//! exposes them.

pub mod aggregator;
pub mod config;
pub mod environment;
pub mod error;
pub mod http;
pub mod json;
pub mod middleware;
pub mod model;
pub mod probe;
pub mod registry;
pub mod routes;
pub mod state;

pub use error::AppError;
