//! Domain port for pipeline run counters.
//!
//! Keeps run observability at the domain boundary so a hosting process can
//! export counters without the orchestrator knowing the exporter.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors exposed when recording pipeline metrics.
    pub enum PipelineMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } =>
            "pipeline metrics exporter failed: {message}",
    }
}

/// Failure labels for aborted runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PipelineFailureKind {
    /// Change feed could not be read.
    FeedUnavailable,
    /// Facility set could not be read.
    FacilitiesUnavailable,
    /// Watermark could not be loaded.
    WatermarkUnavailable,
    /// A proximity event write failed.
    EventWriteFailed,
    /// The watermark commit failed.
    WatermarkCommitFailed,
}

impl PipelineFailureKind {
    /// Stable label for exporters and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FeedUnavailable => "feed_unavailable",
            Self::FacilitiesUnavailable => "facilities_unavailable",
            Self::WatermarkUnavailable => "watermark_unavailable",
            Self::EventWriteFailed => "event_write_failed",
            Self::WatermarkCommitFailed => "watermark_commit_failed",
        }
    }
}

/// Counters for one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineRunCounts {
    /// Observations read from the feed.
    pub observations_read: usize,
    /// Observations skipped for invalid coordinates.
    pub observations_skipped: usize,
    /// Events persisted by this run.
    pub events_written: usize,
    /// Repeats absorbed by the deduplicator.
    pub duplicates: usize,
}

/// Metrics recording port for pipeline runs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PipelineMetrics: Send + Sync {
    /// Record a completed run.
    async fn record_run(&self, counts: &PipelineRunCounts) -> Result<(), PipelineMetricsError>;

    /// Record an aborted run.
    async fn record_failure(&self, kind: PipelineFailureKind) -> Result<(), PipelineMetricsError>;
}

/// Metrics recorder that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPipelineMetrics;

#[async_trait]
impl PipelineMetrics for NoOpPipelineMetrics {
    async fn record_run(&self, _counts: &PipelineRunCounts) -> Result<(), PipelineMetricsError> {
        Ok(())
    }

    async fn record_failure(
        &self,
        _kind: PipelineFailureKind,
    ) -> Result<(), PipelineMetricsError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn no_op_metrics_accept_everything() {
        let metrics = NoOpPipelineMetrics;
        metrics
            .record_run(&PipelineRunCounts::default())
            .await
            .expect("no-op run record");
        metrics
            .record_failure(PipelineFailureKind::FeedUnavailable)
            .await
            .expect("no-op failure record");
    }

    #[rstest]
    #[case(PipelineFailureKind::FeedUnavailable, "feed_unavailable")]
    #[case(PipelineFailureKind::WatermarkCommitFailed, "watermark_commit_failed")]
    fn failure_labels_are_stable(#[case] kind: PipelineFailureKind, #[case] label: &str) {
        assert_eq!(kind.as_str(), label);
    }
}
