//! Domain primitives, the proximity evaluator, and the pipeline orchestrator.
//!
//! Purpose: keep distance maths, threshold classification, and run
//! orchestration free of storage concerns. Adapters plug in through the
//! traits in [`ports`].
//!
//! Public surface:
//! - `Coordinate`, `Haversine`: validated positions and great-circle distance.
//! - `Vehicle`, `Facility`, `LocationObservation`, `ProximityEvent`: data model.
//! - `Watermark`, `BatchSize`, `PipelineName`: feed cursor and run sizing.
//! - `ProximityEvaluator`: pure threshold classifier.
//! - `ProximityPipeline`: one triggered run, or a drain of several.

pub mod fleet;
pub mod geo;
pub mod pipeline;
pub mod ports;
pub mod proximity;
pub mod watermark;

pub use self::fleet::{
    Facility, FacilityId, LocationObservation, NewProximityEvent, ObservationId, ProximityEvent,
    ProximityEventId, ProximityKey, Vehicle, VehicleId,
};
pub use self::geo::{
    Coordinate, EARTH_MEAN_RADIUS_METERS, GeoError, Haversine, meters_to_kilometres,
};
pub use self::pipeline::{
    PipelineConfig, PipelineError, ProximityPipeline, ProximityPipelinePorts, RunSummary,
};
pub use self::proximity::{
    DEFAULT_PROXIMITY_THRESHOLD_METERS, ProximityEvaluator, ProximityMatch, ProximityThreshold,
    ProximityThresholdError,
};
pub use self::watermark::{BatchSize, PipelineName, PipelineNameError, Watermark};
