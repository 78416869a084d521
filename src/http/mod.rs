//! HTTP server module.
//!
//! Serves the dashboard API over plain HTTP and drains in-flight requests on
//! SIGTERM/SIGINT.

mod server;
mod shutdown;
pub mod static_files;

pub use server::{serve, start_server, ServerError};
pub use shutdown::shutdown_signal;
