//! Threshold classification of observations against the facility set.
//!
//! The evaluator scans every facility for each observation. This suits fleets
//! with tens to low thousands of facilities; larger sets should move to a
//! spatial index (grid or R-tree) behind the same interface.

use serde::Serialize;

use super::fleet::{Facility, FacilityId, LocationObservation};
use super::geo::{GeoError, Haversine};

/// Default proximity cutoff in metres.
pub const DEFAULT_PROXIMITY_THRESHOLD_METERS: f64 = 500.0;

/// Errors raised when building a [`ProximityThreshold`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("proximity threshold must be finite and non-negative, got {meters}")]
pub struct ProximityThresholdError {
    /// Rejected value in metres.
    pub meters: f64,
}

/// Inclusive distance cutoff for a qualifying pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProximityThreshold(f64);

impl ProximityThreshold {
    /// Build a threshold in metres.
    ///
    /// # Errors
    ///
    /// Returns [`ProximityThresholdError`] for negative or non-finite values.
    pub fn new(meters: f64) -> Result<Self, ProximityThresholdError> {
        if meters.is_finite() && meters >= 0.0 {
            Ok(Self(meters))
        } else {
            Err(ProximityThresholdError { meters })
        }
    }

    /// Threshold in metres.
    pub fn meters(self) -> f64 {
        self.0
    }

    /// True when `distance_meters` falls within the threshold.
    pub fn admits(self, distance_meters: f64) -> bool {
        distance_meters <= self.0
    }
}

impl Default for ProximityThreshold {
    fn default() -> Self {
        Self(DEFAULT_PROXIMITY_THRESHOLD_METERS)
    }
}

/// A facility within the threshold of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProximityMatch {
    /// Facility that qualified.
    pub facility_id: FacilityId,
    /// Distance from the observation in metres.
    pub distance_meters: f64,
}

/// Pure, deterministic proximity classifier.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use fleet_proximity::domain::{
///     Coordinate, Facility, FacilityId, LocationObservation, ObservationId,
///     ProximityEvaluator, VehicleId,
/// };
///
/// let observation = LocationObservation {
///     id: ObservationId::new(1),
///     vehicle_id: VehicleId::new(1),
///     location: Coordinate::new(53.8085097, -1.5528634).expect("valid"),
///     observed_at: Utc::now(),
/// };
/// let warehouse = Facility {
///     id: FacilityId::new(7),
///     name: "A".to_owned(),
///     location: Coordinate::new(53.8086000, -1.5529000).expect("valid"),
/// };
///
/// let matches = ProximityEvaluator::default()
///     .evaluate(&observation, &[warehouse])
///     .expect("valid coordinates");
/// assert_eq!(matches.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProximityEvaluator {
    haversine: Haversine,
    threshold: ProximityThreshold,
}

impl ProximityEvaluator {
    /// Build an evaluator from a distance model and cutoff.
    pub fn new(haversine: Haversine, threshold: ProximityThreshold) -> Self {
        Self {
            haversine,
            threshold,
        }
    }

    /// Configured cutoff.
    pub fn threshold(&self) -> ProximityThreshold {
        self.threshold
    }

    /// Configured distance model.
    pub fn haversine(&self) -> Haversine {
        self.haversine
    }

    /// Score `observation` against every facility, keeping qualifying pairs.
    ///
    /// Matches are ordered by facility identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidCoordinate`] when the observation (or a
    /// facility) carries an out-of-range coordinate.
    pub fn evaluate(
        &self,
        observation: &LocationObservation,
        facilities: &[Facility],
    ) -> Result<Vec<ProximityMatch>, GeoError> {
        let origin = observation.location.validate()?;
        let mut matches = Vec::new();
        for facility in facilities {
            let distance_meters = self.haversine.distance_meters(origin, facility.location)?;
            if self.threshold.admits(distance_meters) {
                matches.push(ProximityMatch {
                    facility_id: facility.id,
                    distance_meters,
                });
            }
        }
        matches.sort_by_key(|candidate| candidate.facility_id);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    //! Classification behaviour for the proximity evaluator.

    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::fleet::{ObservationId, VehicleId};
    use crate::domain::geo::Coordinate;

    fn facility(id: i64, latitude: f64, longitude: f64) -> Facility {
        Facility {
            id: FacilityId::new(id),
            name: format!("facility-{id}"),
            location: Coordinate {
                latitude,
                longitude,
            },
        }
    }

    fn observation_at(latitude: f64, longitude: f64) -> LocationObservation {
        LocationObservation {
            id: ObservationId::new(1),
            vehicle_id: VehicleId::new(1),
            location: Coordinate {
                latitude,
                longitude,
            },
            observed_at: Utc
                .with_ymd_and_hms(2026, 10, 1, 9, 0, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    #[fixture]
    fn leeds_facilities() -> Vec<Facility> {
        vec![
            facility(30, 53.8, -1.55),
            facility(10, 53.808_6, -1.552_9),
            facility(20, 51.5074, -0.1278),
            facility(5, 53.808_509_7, -1.552_863_4),
        ]
    }

    #[rstest]
    fn matches_are_sorted_and_filtered(leeds_facilities: Vec<Facility>) {
        let matches = ProximityEvaluator::default()
            .evaluate(&observation_at(53.808_509_7, -1.552_863_4), &leeds_facilities)
            .expect("valid coordinates");

        let ids: Vec<i64> = matches.iter().map(|m| m.facility_id.get()).collect();
        assert_eq!(ids, vec![5, 10]);
        assert!(matches.iter().all(|m| m.distance_meters <= 500.0));
    }

    #[rstest]
    fn evaluation_is_deterministic_regardless_of_input_order(leeds_facilities: Vec<Facility>) {
        let evaluator = ProximityEvaluator::default();
        let observation = observation_at(53.808_509_7, -1.552_863_4);
        let mut reversed = leeds_facilities.clone();
        reversed.reverse();

        let first = evaluator
            .evaluate(&observation, &leeds_facilities)
            .expect("first");
        let second = evaluator.evaluate(&observation, &reversed).expect("second");
        assert_eq!(first, second);
    }

    #[rstest]
    #[case(0.001)]
    #[case(1.0)]
    #[case(500.0)]
    fn exact_position_qualifies_for_any_positive_threshold(#[case] meters: f64) {
        let threshold = ProximityThreshold::new(meters).expect("valid threshold");
        let evaluator = ProximityEvaluator::new(Haversine::default(), threshold);
        let matches = evaluator
            .evaluate(&observation_at(53.808_6, -1.552_9), &[facility(1, 53.808_6, -1.552_9)])
            .expect("valid coordinates");

        assert_eq!(matches.len(), 1);
        assert_eq!(matches.first().map(|m| m.distance_meters), Some(0.0));
    }

    #[rstest]
    fn threshold_is_inclusive() {
        let threshold = ProximityThreshold::new(10.0).expect("valid threshold");
        assert!(threshold.admits(10.0));
        assert!(!threshold.admits(10.000_001));
    }

    #[rstest]
    fn no_facilities_yields_no_matches() {
        let matches = ProximityEvaluator::default()
            .evaluate(&observation_at(0.0, 0.0), &[])
            .expect("valid coordinates");
        assert!(matches.is_empty());
    }

    #[rstest]
    fn invalid_observation_is_reported() {
        let result = ProximityEvaluator::default()
            .evaluate(&observation_at(120.0, 0.0), &[facility(1, 0.0, 0.0)]);
        assert!(matches!(result, Err(GeoError::InvalidCoordinate { .. })));
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn invalid_thresholds_are_rejected(#[case] meters: f64) {
        assert!(ProximityThreshold::new(meters).is_err());
    }

    #[rstest]
    fn default_threshold_is_five_hundred_metres() {
        assert_eq!(
            ProximityEvaluator::default().threshold().meters(),
            DEFAULT_PROXIMITY_THRESHOLD_METERS
        );
    }
}
