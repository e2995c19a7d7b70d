//! Port bundle and tuning for the proximity pipeline.

use std::sync::Arc;

use crate::domain::ports::{
    FacilityRepository, NoOpPipelineMetrics, ObservationFeed, PipelineMetrics,
    ProximityEventRepository, WatermarkStore,
};
use crate::domain::{BatchSize, PipelineName, ProximityEvaluator};

/// Port bundle required by the pipeline.
pub struct ProximityPipelinePorts {
    /// Change feed of committed observations.
    pub feed: Arc<dyn ObservationFeed>,
    /// Facility reference data.
    pub facilities: Arc<dyn FacilityRepository>,
    /// Deduplicating event writer.
    pub events: Arc<dyn ProximityEventRepository>,
    /// Watermark persistence.
    pub watermarks: Arc<dyn WatermarkStore>,
    /// Run counters.
    pub metrics: Arc<dyn PipelineMetrics>,
}

impl ProximityPipelinePorts {
    /// Build a strongly-typed port bundle.
    pub fn new(
        feed: Arc<dyn ObservationFeed>,
        facilities: Arc<dyn FacilityRepository>,
        events: Arc<dyn ProximityEventRepository>,
        watermarks: Arc<dyn WatermarkStore>,
        metrics: Arc<dyn PipelineMetrics>,
    ) -> Self {
        Self {
            feed,
            facilities,
            events,
            watermarks,
            metrics,
        }
    }

    /// Wire every store port to one adapter and discard metrics.
    pub fn from_store<S>(store: &Arc<S>) -> Self
    where
        S: ObservationFeed + FacilityRepository + ProximityEventRepository + WatermarkStore + 'static,
    {
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(NoOpPipelineMetrics),
        )
    }

    /// Replace the metrics recorder.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn PipelineMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Validated pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Pipeline identity; owns one watermark.
    pub pipeline_name: PipelineName,
    /// Distance model and threshold.
    pub evaluator: ProximityEvaluator,
    /// Maximum observations per run.
    pub batch_size: BatchSize,
    /// Upper bound on consecutive runs in one drain.
    pub max_runs_per_drain: usize,
}

impl PipelineConfig {
    /// Default drain bound.
    pub const DEFAULT_MAX_RUNS_PER_DRAIN: usize = 100;

    /// Configuration with default evaluator, batch size, and drain bound.
    pub fn new(pipeline_name: PipelineName) -> Self {
        Self {
            pipeline_name,
            evaluator: ProximityEvaluator::default(),
            batch_size: BatchSize::default(),
            max_runs_per_drain: Self::DEFAULT_MAX_RUNS_PER_DRAIN,
        }
    }

    /// Replace the evaluator.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: ProximityEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Replace the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: BatchSize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Replace the drain bound; zero is raised to one.
    #[must_use]
    pub fn with_max_runs_per_drain(mut self, max_runs: usize) -> Self {
        self.max_runs_per_drain = max_runs.max(1);
        self
    }
}
