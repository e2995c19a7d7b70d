//! In-process store implementing every pipeline store port.
//!
//! Used by tests and local dry runs. All state sits behind one mutex, so the
//! check-and-insert in `record_if_new` and the conditional watermark write
//! are atomic within the process, matching the guarantees PostgreSQL gives
//! the Diesel adapters through its constraints.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    FacilityRepository, FacilityRepositoryError, ObservationFeed, ObservationFeedError,
    ProximityEventRepository, ProximityEventRepositoryError, RecordOutcome, WatermarkAdvance,
    WatermarkStore, WatermarkStoreError,
};
use crate::domain::{
    BatchSize, Coordinate, Facility, FacilityId, LocationObservation, NewProximityEvent,
    ObservationId, PipelineName, ProximityEvent, ProximityEventId, ProximityKey, Vehicle,
    VehicleId, Watermark,
};

/// Errors raised by the seeding helpers of [`InMemoryFleetStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InMemoryStoreError {
    /// Observation referenced a vehicle that was never added.
    #[error("unknown vehicle {vehicle_id}")]
    UnknownVehicle {
        /// Missing vehicle.
        vehicle_id: VehicleId,
    },
    /// A previous holder of the state lock panicked.
    #[error("in-memory store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Default)]
struct FleetState {
    vehicles: BTreeMap<VehicleId, Vehicle>,
    facilities: BTreeMap<FacilityId, Facility>,
    observations: BTreeMap<ObservationId, LocationObservation>,
    events: BTreeMap<ProximityEventId, ProximityEvent>,
    event_keys: BTreeMap<ProximityKey, ProximityEventId>,
    watermarks: BTreeMap<PipelineName, ObservationId>,
    last_observation_id: i64,
    last_event_id: i64,
}

/// Store holding vehicles, facilities, observations, events, and watermarks
/// in memory.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use fleet_proximity::domain::{Coordinate, Vehicle, VehicleId};
/// use fleet_proximity::outbound::memory::InMemoryFleetStore;
///
/// let store = InMemoryFleetStore::new();
/// store
///     .add_vehicle(Vehicle { id: VehicleId::new(1), display_name: "T1".to_owned() })
///     .expect("vehicle added");
/// let observation = store
///     .append_observation(
///         VehicleId::new(1),
///         Coordinate::new(53.8085097, -1.5528634).expect("valid"),
///         Utc::now(),
///     )
///     .expect("observation appended");
/// assert_eq!(observation.id.get(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryFleetStore {
    state: Mutex<FleetState>,
}

impl InMemoryFleetStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, FleetState>, InMemoryStoreError> {
        self.state.lock().map_err(|_| InMemoryStoreError::Poisoned)
    }

    /// Insert or replace a vehicle.
    ///
    /// # Errors
    ///
    /// Returns [`InMemoryStoreError::Poisoned`] when the state lock is poisoned.
    pub fn add_vehicle(&self, vehicle: Vehicle) -> Result<(), InMemoryStoreError> {
        self.lock()?.vehicles.insert(vehicle.id, vehicle);
        Ok(())
    }

    /// Insert or replace a facility.
    ///
    /// Coordinates are stored as given; the pipeline excludes invalid ones.
    ///
    /// # Errors
    ///
    /// Returns [`InMemoryStoreError::Poisoned`] when the state lock is poisoned.
    pub fn add_facility(&self, facility: Facility) -> Result<(), InMemoryStoreError> {
        self.lock()?.facilities.insert(facility.id, facility);
        Ok(())
    }

    /// Remove a facility; later runs no longer consider it.
    ///
    /// # Errors
    ///
    /// Returns [`InMemoryStoreError::Poisoned`] when the state lock is poisoned.
    pub fn remove_facility(&self, id: FacilityId) -> Result<Option<Facility>, InMemoryStoreError> {
        Ok(self.lock()?.facilities.remove(&id))
    }

    /// Append an observation, assigning the next identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InMemoryStoreError::UnknownVehicle`] when `vehicle_id` was
    /// never added.
    pub fn append_observation(
        &self,
        vehicle_id: VehicleId,
        location: Coordinate,
        observed_at: DateTime<Utc>,
    ) -> Result<LocationObservation, InMemoryStoreError> {
        let mut state = self.lock()?;
        if !state.vehicles.contains_key(&vehicle_id) {
            return Err(InMemoryStoreError::UnknownVehicle { vehicle_id });
        }
        state.last_observation_id += 1;
        let observation = LocationObservation {
            id: ObservationId::new(state.last_observation_id),
            vehicle_id,
            location,
            observed_at,
        };
        state
            .observations
            .insert(observation.id, observation.clone());
        Ok(observation)
    }

    /// Snapshot of every persisted event in identifier order.
    ///
    /// # Errors
    ///
    /// Returns [`InMemoryStoreError::Poisoned`] when the state lock is poisoned.
    pub fn events(&self) -> Result<Vec<ProximityEvent>, InMemoryStoreError> {
        Ok(self.lock()?.events.values().cloned().collect())
    }
}

#[async_trait]
impl ObservationFeed for InMemoryFleetStore {
    async fn poll_new_observations(
        &self,
        since: Watermark,
        limit: BatchSize,
    ) -> Result<Vec<LocationObservation>, ObservationFeedError> {
        let state = self
            .lock()
            .map_err(|err| ObservationFeedError::connection(err.to_string()))?;
        Ok(state
            .observations
            .values()
            .filter(|observation| since.admits(observation.id))
            .take(limit.get())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FacilityRepository for InMemoryFleetStore {
    async fn list_facilities(&self) -> Result<Vec<Facility>, FacilityRepositoryError> {
        let state = self
            .lock()
            .map_err(|err| FacilityRepositoryError::connection(err.to_string()))?;
        Ok(state.facilities.values().cloned().collect())
    }
}

#[async_trait]
impl ProximityEventRepository for InMemoryFleetStore {
    async fn record_if_new(
        &self,
        event: &NewProximityEvent,
    ) -> Result<RecordOutcome, ProximityEventRepositoryError> {
        let mut state = self
            .lock()
            .map_err(|err| ProximityEventRepositoryError::connection(err.to_string()))?;
        if state.event_keys.contains_key(&event.key) {
            return Ok(RecordOutcome::AlreadyExists);
        }
        state.last_event_id += 1;
        let id = ProximityEventId::new(state.last_event_id);
        let stored = ProximityEvent::from_new(id, event);
        state.event_keys.insert(event.key, id);
        state.events.insert(id, stored.clone());
        Ok(RecordOutcome::Written(stored))
    }

    async fn list_after(
        &self,
        after: Option<ProximityEventId>,
        limit: usize,
    ) -> Result<Vec<ProximityEvent>, ProximityEventRepositoryError> {
        let state = self
            .lock()
            .map_err(|err| ProximityEventRepositoryError::connection(err.to_string()))?;
        Ok(state
            .events
            .values()
            .filter(|event| after.is_none_or(|cursor| event.id > cursor))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WatermarkStore for InMemoryFleetStore {
    async fn load(&self, pipeline: &PipelineName) -> Result<Watermark, WatermarkStoreError> {
        let state = self
            .lock()
            .map_err(|err| WatermarkStoreError::connection(err.to_string()))?;
        Ok(Watermark::from_last_processed(
            state.watermarks.get(pipeline).copied(),
        ))
    }

    async fn advance(
        &self,
        pipeline: &PipelineName,
        processed: ObservationId,
    ) -> Result<WatermarkAdvance, WatermarkStoreError> {
        let mut state = self
            .lock()
            .map_err(|err| WatermarkStoreError::connection(err.to_string()))?;
        match state.watermarks.get(pipeline) {
            Some(current) if *current >= processed => Ok(WatermarkAdvance::AlreadyAhead),
            _ => {
                state.watermarks.insert(pipeline.clone(), processed);
                Ok(WatermarkAdvance::Advanced)
            }
        }
    }
}
