//! Fleet reference data, observations, and proximity events.
//!
//! Vehicles and facilities are immutable reference data. Location
//! observations form an append-only log owned by the store; proximity events
//! are written exclusively by the deduplicating writer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geo::Coordinate;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw store identifier.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Raw store identifier.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id! {
    /// Unique vehicle identifier.
    VehicleId
}

define_id! {
    /// Unique facility identifier.
    FacilityId
}

define_id! {
    /// Store-assigned, monotonically increasing observation identifier.
    ObservationId
}

define_id! {
    /// Store-assigned proximity event identifier.
    ProximityEventId
}

/// A tracked vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle identifier.
    pub id: VehicleId,
    /// Human-readable name.
    pub display_name: String,
}

/// A fixed site that vehicles may approach (warehouse, depot, yard).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    /// Facility identifier.
    pub id: FacilityId,
    /// Human-readable name.
    pub name: String,
    /// Fixed location.
    pub location: Coordinate,
}

/// One geolocation report from a vehicle, as committed to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationObservation {
    /// Store-assigned identifier; defines feed order.
    pub id: ObservationId,
    /// Reporting vehicle.
    pub vehicle_id: VehicleId,
    /// Reported position.
    pub location: Coordinate,
    /// Caller-supplied observation time; not necessarily monotonic.
    pub observed_at: DateTime<Utc>,
}

/// Identity of a proximity event: one per vehicle, facility, and observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ProximityKey {
    /// Vehicle that was observed.
    pub vehicle_id: VehicleId,
    /// Facility the vehicle was near.
    pub facility_id: FacilityId,
    /// Observation that triggered the event.
    pub observation_id: ObservationId,
}

/// A proximity event ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProximityEvent {
    /// Deduplication identity.
    pub key: ProximityKey,
    /// Great-circle distance in metres.
    pub distance_meters: f64,
    /// When the evaluator recorded the event.
    pub recorded_at: DateTime<Utc>,
}

/// A persisted proximity notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityEvent {
    /// Store-assigned identifier.
    pub id: ProximityEventId,
    /// Deduplication identity.
    pub key: ProximityKey,
    /// Great-circle distance in metres.
    pub distance_meters: f64,
    /// When the evaluator recorded the event.
    pub recorded_at: DateTime<Utc>,
}

impl ProximityEvent {
    /// Attach a store identifier to a pending event.
    pub fn from_new(id: ProximityEventId, event: &NewProximityEvent) -> Self {
        Self {
            id,
            key: event.key,
            distance_meters: event.distance_meters,
            recorded_at: event.recorded_at,
        }
    }
}
