//! PostgreSQL adapters for the pipeline store ports.
//!
//! Adapters only translate between Diesel rows and domain types. The two
//! concurrency guarantees the pipeline relies on live in SQL: the unique
//! event triple (`diesel_proximity_event_repository`) and the conditional
//! watermark upsert (`diesel_watermark_store`).
//!
//! ```ignore
//! use fleet_proximity::outbound::persistence::{DbPool, PoolConfig, diesel_ports};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/fleet")).await?;
//! let ports = diesel_ports(&pool);
//! ```

mod diesel_facility_repository;
mod diesel_helpers;
mod diesel_observation_feed;
mod diesel_proximity_event_repository;
mod diesel_watermark_store;
mod migrations;
mod models;
mod pool;
mod schema;

use std::sync::Arc;

use crate::domain::ProximityPipelinePorts;
use crate::domain::ports::NoOpPipelineMetrics;

pub use diesel_facility_repository::DieselFacilityRepository;
pub use diesel_observation_feed::DieselObservationFeed;
pub use diesel_proximity_event_repository::DieselProximityEventRepository;
pub use diesel_watermark_store::DieselWatermarkStore;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};

/// Wire every store port to PostgreSQL; metrics are discarded until
/// replaced with [`ProximityPipelinePorts::with_metrics`].
pub fn diesel_ports(pool: &DbPool) -> ProximityPipelinePorts {
    ProximityPipelinePorts::new(
        Arc::new(DieselObservationFeed::new(pool.clone())),
        Arc::new(DieselFacilityRepository::new(pool.clone())),
        Arc::new(DieselProximityEventRepository::new(pool.clone())),
        Arc::new(DieselWatermarkStore::new(pool.clone())),
        Arc::new(NoOpPipelineMetrics),
    )
}
