//! Prometheus adapter for proximity pipeline run counters.

use async_trait::async_trait;
use prometheus::{IntCounterVec, Opts, Registry};

use crate::domain::ports::{
    PipelineFailureKind, PipelineMetrics, PipelineMetricsError, PipelineRunCounts,
};

/// Prometheus-backed recorder for pipeline runs.
pub struct PrometheusPipelineMetrics {
    runs_total: IntCounterVec,
    observations_total: IntCounterVec,
    events_total: IntCounterVec,
}

impl PrometheusPipelineMetrics {
    /// Create the counters and register them with `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error when Prometheus rejects registration, for example
    /// when the counters are already registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let runs_total = IntCounterVec::new(
            Opts::new("proximity_runs_total", "Proximity pipeline runs by outcome"),
            &["outcome"],
        )?;
        let observations_total = IntCounterVec::new(
            Opts::new(
                "proximity_observations_total",
                "Observations read by the proximity pipeline",
            ),
            &["status"],
        )?;
        let events_total = IntCounterVec::new(
            Opts::new(
                "proximity_events_total",
                "Qualifying pairs handled by the deduplicating writer",
            ),
            &["result"],
        )?;
        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(observations_total.clone()))?;
        registry.register(Box::new(events_total.clone()))?;
        Ok(Self {
            runs_total,
            observations_total,
            events_total,
        })
    }
}

fn as_u64(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

#[async_trait]
impl PipelineMetrics for PrometheusPipelineMetrics {
    async fn record_run(&self, counts: &PipelineRunCounts) -> Result<(), PipelineMetricsError> {
        let evaluated = counts
            .observations_read
            .saturating_sub(counts.observations_skipped);
        self.runs_total.with_label_values(&["committed"]).inc();
        self.observations_total
            .with_label_values(&["evaluated"])
            .inc_by(as_u64(evaluated));
        self.observations_total
            .with_label_values(&["skipped"])
            .inc_by(as_u64(counts.observations_skipped));
        self.events_total
            .with_label_values(&["written"])
            .inc_by(as_u64(counts.events_written));
        self.events_total
            .with_label_values(&["duplicate"])
            .inc_by(as_u64(counts.duplicates));
        Ok(())
    }

    async fn record_failure(&self, kind: PipelineFailureKind) -> Result<(), PipelineMetricsError> {
        self.runs_total.with_label_values(&[kind.as_str()]).inc();
        Ok(())
    }
}
