//! HealthCheck dashboard server.
//!
//! This is the application entry point. It loads settings from a TOML file,
//! initializes tracing, wires the service registry, prober and aggregator,
//! sets up the Axum router and starts the HTTP server. With `--once` it runs a
//! single health cycle and prints the report instead.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use healthcheck::config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use healthcheck::http::start_server;
use healthcheck::json;
use healthcheck::routes::create_router;
use healthcheck::state::AppState;

/// HealthCheck: polls HTTP services and reports their health
#[derive(Parser, Debug)]
#[command(name = "healthcheck", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "healthcheck=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Run one health cycle, print the report as JSON and exit
    #[arg(long)]
    once: bool,
}

/// Initialize tracing with filter priority: CLI > env > default
fn init_tracing(log_level: Option<String>, logging: &LoggingConfig) {
    let log_filter = log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));

    if logging.is_json() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = AppConfig::load(&args.config)?;
    init_tracing(args.log_level, &config.logging);

    tracing::info!(
        path = %args.config,
        config_dir = %config.monitor.config_dir,
        environment = %config.monitor.default_environment,
        max_concurrent_probes = config.monitor.max_concurrent_probes,
        cycle_deadline_seconds = ?config.monitor.cycle_deadline_seconds,
        "Loaded configuration"
    );

    let state = AppState::new(config.clone());

    if args.once {
        let report = state.aggregator.run_cycle().await;
        println!("{}", json::serialize(&report.to_json()));
        return Ok(());
    }

    let app = create_router(state);
    start_server(app, &config).await?;

    Ok(())
}
