//! Health cycle: probe every configured service concurrently and summarize.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::instrument;

use crate::config::{MonitorSettings, DEFAULT_MAX_CONCURRENT_PROBES};
use crate::json::{JsonObject, JsonValue};
use crate::model::{format_timestamp, HealthCheckResult, HealthStatus};
use crate::probe::HealthProber;
use crate::registry::ConfigRepository;

/// Resource bounds for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleLimits {
    /// Probes in flight at once
    pub max_concurrent_probes: usize,
    /// Probes still running when this elapses are aborted and left out
    pub deadline: Option<Duration>,
}

impl Default for CycleLimits {
    fn default() -> Self {
        Self {
            max_concurrent_probes: DEFAULT_MAX_CONCURRENT_PROBES,
            deadline: None,
        }
    }
}

impl From<&MonitorSettings> for CycleLimits {
    fn from(settings: &MonitorSettings) -> Self {
        Self {
            max_concurrent_probes: settings.max_concurrent_probes,
            deadline: settings.cycle_deadline_seconds.map(Duration::from_secs),
        }
    }
}

/// Counts over the results of one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthSummary {
    pub total: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub errors: usize,
    /// When the cycle completed
    pub timestamp: DateTime<Local>,
}

/// Results sharing one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub category: String,
    pub results: Vec<HealthCheckResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub summary: HealthSummary,
    /// Categories in order of first appearance among `results`
    pub services_by_category: Vec<CategoryGroup>,
}

impl HealthReport {
    /// Group `results` by category, keeping their relative order.
    pub fn from_results(results: Vec<HealthCheckResult>, timestamp: DateTime<Local>) -> Self {
        let mut summary = HealthSummary {
            total: results.len(),
            healthy: 0,
            unhealthy: 0,
            errors: 0,
            timestamp,
        };

        let mut groups: Vec<CategoryGroup> = Vec::new();
        for result in results {
            match result.status {
                HealthStatus::Healthy => summary.healthy += 1,
                HealthStatus::Unhealthy => summary.unhealthy += 1,
                HealthStatus::Error => summary.errors += 1,
            }

            match groups.iter_mut().find(|group| group.category == result.category) {
                Some(group) => group.results.push(result),
                None => groups.push(CategoryGroup {
                    category: result.category.clone(),
                    results: vec![result],
                }),
            }
        }

        Self {
            summary,
            services_by_category: groups,
        }
    }

    pub fn category(&self, name: &str) -> Option<&[HealthCheckResult]> {
        self.services_by_category
            .iter()
            .find(|group| group.category == name)
            .map(|group| group.results.as_slice())
    }

    /// `{"services": {<category>: [record...]}, "summary": {...}}`
    pub fn to_json(&self) -> JsonValue {
        let mut services = JsonObject::new();
        for group in &self.services_by_category {
            let records = group
                .results
                .iter()
                .map(HealthCheckResult::to_json)
                .collect::<Vec<_>>();
            services.insert(group.category.as_str(), records);
        }

        let summary = JsonObject::new()
            .with("total", self.summary.total)
            .with("healthy", self.summary.healthy)
            .with("unhealthy", self.summary.unhealthy)
            .with("errors", self.summary.errors)
            .with("timestamp", format_timestamp(&self.summary.timestamp));

        JsonValue::Object(
            JsonObject::new()
                .with("services", services)
                .with("summary", summary),
        )
    }
}

type ProbeOutcome = (usize, HealthCheckResult);

/// Runs health cycles over the services of a [`ConfigRepository`].
#[derive(Clone)]
pub struct Aggregator {
    registry: Arc<dyn ConfigRepository>,
    prober: Arc<dyn HealthProber>,
    limits: CycleLimits,
}

impl Aggregator {
    pub fn new(
        registry: Arc<dyn ConfigRepository>,
        prober: Arc<dyn HealthProber>,
        limits: CycleLimits,
    ) -> Self {
        Self {
            registry,
            prober,
            limits,
        }
    }

    /// Probe every service once and summarize.
    ///
    /// The configuration is read once up front. A probe task that panics is
    /// logged and left out of the report; the cycle itself always completes.
    /// Results are reported in declared service order.
    #[instrument(
        name = "aggregator.run_cycle",
        skip(self),
        fields(services, completed, duration_ms)
    )]
    pub async fn run_cycle(&self) -> HealthReport {
        let start = Instant::now();
        let config = self.registry.load_config().await;
        let timeout = Duration::from_millis(config.timeout_ms);
        let span = tracing::Span::current();
        span.record("services", config.services.len());

        let semaphore = Arc::new(Semaphore::new(self.limits.max_concurrent_probes.max(1)));
        let mut tasks = JoinSet::new();
        for (index, service) in config.services.into_iter().enumerate() {
            let prober = Arc::clone(&self.prober);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // Held until the probe finishes; the semaphore is never closed
                let _permit = semaphore.acquire_owned().await;
                (index, prober.check_health(&service, timeout).await)
            });
        }

        let mut completed = Vec::with_capacity(tasks.len());
        match self.limits.deadline {
            Some(deadline) => {
                let drained = tokio::time::timeout(deadline, drain(&mut tasks, &mut completed)).await;
                if drained.is_err() {
                    tracing::warn!(
                        outstanding = tasks.len(),
                        deadline_ms = deadline.as_millis() as u64,
                        "Health cycle deadline reached, aborting outstanding probes"
                    );
                    tasks.abort_all();
                }
            }
            None => drain(&mut tasks, &mut completed).await,
        }

        completed.sort_by_key(|(index, _)| *index);
        let results = completed.into_iter().map(|(_, result)| result).collect::<Vec<_>>();

        span.record("completed", results.len());
        span.record("duration_ms", start.elapsed().as_millis() as u64);

        let report = HealthReport::from_results(results, Local::now());
        tracing::info!(
            total = report.summary.total,
            healthy = report.summary.healthy,
            unhealthy = report.summary.unhealthy,
            errors = report.summary.errors,
            "Health cycle completed"
        );
        report
    }
}

async fn drain(tasks: &mut JoinSet<ProbeOutcome>, completed: &mut Vec<ProbeOutcome>) {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => completed.push(outcome),
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                tracing::error!(error = %e, "Probe task failed, omitting its result");
            }
        }
    }
}
