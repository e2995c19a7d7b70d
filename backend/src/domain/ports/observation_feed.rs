//! Driven port for the change feed of committed location observations.
//!
//! The feed is pull-based and bounded by a [`Watermark`]: each call returns
//! observations strictly after the watermark, in identifier order, capped at
//! the requested batch size. Repeating a call with the same watermark returns
//! the same prefix of the log, which is what makes a pipeline run restartable.

use async_trait::async_trait;

use crate::domain::{BatchSize, LocationObservation, Watermark};

use super::define_port_error;

define_port_error! {
    /// Errors raised by change feed adapters.
    pub enum ObservationFeedError {
        /// Store could not be reached.
        Connection { message: String } =>
            "observation feed connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "observation feed query failed: {message}",
    }
}

/// Port for reading newly committed observations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObservationFeed: Send + Sync {
    /// Return up to `limit` observations after `since`, ordered by identifier.
    ///
    /// An empty vector means there is nothing new; it is not an error.
    async fn poll_new_observations(
        &self,
        since: Watermark,
        limit: BatchSize,
    ) -> Result<Vec<LocationObservation>, ObservationFeedError>;
}
