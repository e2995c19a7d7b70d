//! Domain ports for the hexagonal boundary of the proximity pipeline.
//!
//! Driven ports cover the store (change feed, facilities, proximity events,
//! watermarks) and run metrics. Adapters live under `crate::outbound`.

mod macros;
pub(crate) use macros::define_port_error;

mod facility_repository;
mod observation_feed;
mod pipeline_metrics;
mod proximity_event_repository;
mod watermark_store;

#[cfg(test)]
pub use facility_repository::MockFacilityRepository;
pub use facility_repository::{FacilityRepository, FacilityRepositoryError};
#[cfg(test)]
pub use observation_feed::MockObservationFeed;
pub use observation_feed::{ObservationFeed, ObservationFeedError};
#[cfg(test)]
pub use pipeline_metrics::MockPipelineMetrics;
pub use pipeline_metrics::{
    NoOpPipelineMetrics, PipelineFailureKind, PipelineMetrics, PipelineMetricsError,
    PipelineRunCounts,
};
#[cfg(test)]
pub use proximity_event_repository::MockProximityEventRepository;
pub use proximity_event_repository::{
    ProximityEventRepository, ProximityEventRepositoryError, RecordOutcome,
};
#[cfg(test)]
pub use watermark_store::MockWatermarkStore;
pub use watermark_store::{WatermarkAdvance, WatermarkStore, WatermarkStoreError};
