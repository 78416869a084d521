//! Shared application state for request handlers.

use std::sync::Arc;

use crate::aggregator::{Aggregator, CycleLimits};
use crate::config::AppConfig;
use crate::environment::EnvironmentHandle;
use crate::probe::{HealthProber, HttpProber};
use crate::registry::{ConfigRepository, JsonConfigRepository};

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// The registry and the aggregator see the same [`EnvironmentHandle`], so an
/// environment switch affects the next load or save.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub environment: EnvironmentHandle,
    pub registry: Arc<dyn ConfigRepository>,
    pub aggregator: Aggregator,
}

impl AppState {
    /// Wire the JSON-file registry and the HTTP prober from settings.
    pub fn new(config: AppConfig) -> Self {
        let environment = EnvironmentHandle::new(config.monitor.default_environment);
        let registry: Arc<dyn ConfigRepository> = Arc::new(JsonConfigRepository::new(
            &config.monitor.config_dir,
            environment.clone(),
        ));
        let prober: Arc<dyn HealthProber> = Arc::new(HttpProber::new());
        Self::with_parts(config, environment, registry, prober)
    }

    /// Assemble state around an existing registry and prober.
    pub fn with_parts(
        config: AppConfig,
        environment: EnvironmentHandle,
        registry: Arc<dyn ConfigRepository>,
        prober: Arc<dyn HealthProber>,
    ) -> Self {
        let limits = CycleLimits::from(&config.monitor);
        let aggregator = Aggregator::new(Arc::clone(&registry), prober, limits);
        Self {
            config: Arc::new(config),
            environment,
            registry,
            aggregator,
        }
    }
}
