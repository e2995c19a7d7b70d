//! Run-level failures of the proximity pipeline.
//!
//! Every variant aborts the run before the watermark commit, so the whole
//! batch is retried on the next trigger. None of them indicates corrupted
//! data.

use crate::domain::ports::{
    FacilityRepositoryError, ObservationFeedError, PipelineFailureKind,
    ProximityEventRepositoryError, WatermarkStoreError,
};
use crate::domain::{ObservationId, ProximityKey};

/// Errors that abort a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// The change feed could not be read.
    #[error("observation feed unavailable: {source}")]
    FeedUnavailable {
        /// Adapter failure.
        source: ObservationFeedError,
    },
    /// The facility set could not be read.
    #[error("facility set unavailable: {source}")]
    FacilitiesUnavailable {
        /// Adapter failure.
        source: FacilityRepositoryError,
    },
    /// The stored watermark could not be loaded.
    #[error("watermark unavailable: {source}")]
    WatermarkUnavailable {
        /// Adapter failure.
        source: WatermarkStoreError,
    },
    /// A qualifying pair could not be written.
    #[error(
        "failed to write proximity event for vehicle {} facility {} observation {}: {source}",
        key.vehicle_id,
        key.facility_id,
        key.observation_id
    )]
    EventWriteFailed {
        /// Pair being written.
        key: ProximityKey,
        /// Adapter failure.
        source: ProximityEventRepositoryError,
    },
    /// The watermark commit failed after all events were written.
    #[error("failed to commit watermark at observation {processed}: {source}")]
    WatermarkCommitFailure {
        /// Position the run tried to commit.
        processed: ObservationId,
        /// Adapter failure.
        source: WatermarkStoreError,
    },
}

impl PipelineError {
    /// Metrics label for this failure.
    pub fn kind(&self) -> PipelineFailureKind {
        match self {
            Self::FeedUnavailable { .. } => PipelineFailureKind::FeedUnavailable,
            Self::FacilitiesUnavailable { .. } => PipelineFailureKind::FacilitiesUnavailable,
            Self::WatermarkUnavailable { .. } => PipelineFailureKind::WatermarkUnavailable,
            Self::EventWriteFailed { .. } => PipelineFailureKind::EventWriteFailed,
            Self::WatermarkCommitFailure { .. } => PipelineFailureKind::WatermarkCommitFailed,
        }
    }

    /// Whether the next trigger should simply retry.
    ///
    /// Every run failure is transient infrastructure trouble; the watermark
    /// was not advanced, so a retry replays the batch in full.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::FeedUnavailable { .. }
            | Self::FacilitiesUnavailable { .. }
            | Self::WatermarkUnavailable { .. }
            | Self::EventWriteFailed { .. }
            | Self::WatermarkCommitFailure { .. } => true,
        }
    }
}
