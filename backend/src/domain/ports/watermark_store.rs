//! Driven port for the per-pipeline watermark.

use async_trait::async_trait;

use crate::domain::{ObservationId, PipelineName, Watermark};

use super::define_port_error;

define_port_error! {
    /// Errors raised by watermark adapters.
    pub enum WatermarkStoreError {
        /// Store could not be reached.
        Connection { message: String } =>
            "watermark store connection failed: {message}",
        /// Query or update failed during execution.
        Query { message: String } =>
            "watermark store query failed: {message}",
    }
}

/// Result of a monotonic watermark write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkAdvance {
    /// The stored watermark moved forward to the requested position.
    Advanced,
    /// The stored watermark was already at or beyond the requested position,
    /// typically because an overlapping run committed first.
    AlreadyAhead,
}

/// Port for loading and committing pipeline watermarks.
///
/// `advance` must be a single conditional write in the store so overlapping
/// runs, possibly in different processes, can never move a watermark
/// backwards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Load the watermark for `pipeline`; unknown pipelines start at
    /// [`Watermark::Start`].
    async fn load(&self, pipeline: &PipelineName) -> Result<Watermark, WatermarkStoreError>;

    /// Move the watermark for `pipeline` forward to `processed`.
    async fn advance(
        &self,
        pipeline: &PipelineName,
        processed: ObservationId,
    ) -> Result<WatermarkAdvance, WatermarkStoreError>;
}
