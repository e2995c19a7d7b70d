//! Internal Diesel row structs.
//!
//! Rows never leave the persistence layer; adapters convert them into domain
//! types before returning.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{
    Coordinate, Facility, FacilityId, LocationObservation, NewProximityEvent, ObservationId,
    ProximityEvent, ProximityEventId, ProximityKey, VehicleId,
};

use super::schema::{facilities, location_observations, proximity_events};

/// Row read from `facilities`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = facilities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FacilityRow {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<FacilityRow> for Facility {
    fn from(row: FacilityRow) -> Self {
        Self {
            id: FacilityId::new(row.id),
            name: row.name,
            location: Coordinate {
                latitude: row.latitude,
                longitude: row.longitude,
            },
        }
    }
}

/// Row read from `location_observations`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = location_observations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ObservationRow {
    pub id: i64,
    pub vehicle_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub observed_at: DateTime<Utc>,
}

impl From<ObservationRow> for LocationObservation {
    fn from(row: ObservationRow) -> Self {
        Self {
            id: ObservationId::new(row.id),
            vehicle_id: VehicleId::new(row.vehicle_id),
            location: Coordinate {
                latitude: row.latitude,
                longitude: row.longitude,
            },
            observed_at: row.observed_at,
        }
    }
}

/// Row read from `proximity_events`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = proximity_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProximityEventRow {
    pub id: i64,
    pub vehicle_id: i64,
    pub facility_id: i64,
    pub observation_id: i64,
    pub distance_meters: f64,
    pub recorded_at: DateTime<Utc>,
}

impl From<ProximityEventRow> for ProximityEvent {
    fn from(row: ProximityEventRow) -> Self {
        Self {
            id: ProximityEventId::new(row.id),
            key: ProximityKey {
                vehicle_id: VehicleId::new(row.vehicle_id),
                facility_id: FacilityId::new(row.facility_id),
                observation_id: ObservationId::new(row.observation_id),
            },
            distance_meters: row.distance_meters,
            recorded_at: row.recorded_at,
        }
    }
}

/// Insertable proximity event; `id` is assigned by the sequence.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = proximity_events)]
pub(crate) struct NewProximityEventRow {
    pub vehicle_id: i64,
    pub facility_id: i64,
    pub observation_id: i64,
    pub distance_meters: f64,
    pub recorded_at: DateTime<Utc>,
}

impl From<&NewProximityEvent> for NewProximityEventRow {
    fn from(event: &NewProximityEvent) -> Self {
        Self {
            vehicle_id: event.key.vehicle_id.get(),
            facility_id: event.key.facility_id.get(),
            observation_id: event.key.observation_id.get(),
            distance_meters: event.distance_meters,
            recorded_at: event.recorded_at,
        }
    }
}
