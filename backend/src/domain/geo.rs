//! Great-circle distance between WGS84 coordinates.
//!
//! Distances use the haversine formula on a sphere. The default sphere is the
//! Earth's mean radius; callers may configure another radius through
//! [`Haversine::with_radius`].

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres.
pub const EARTH_MEAN_RADIUS_METERS: f64 = 6_371_000.0;

const MAX_LATITUDE: f64 = 90.0;
const MAX_LONGITUDE: f64 = 180.0;
const METERS_PER_KILOMETRE: f64 = 1_000.0;

/// Errors raised by distance computation.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeoError {
    /// Latitude or longitude is out of range or not finite.
    #[error("invalid coordinate (latitude {latitude}, longitude {longitude})")]
    InvalidCoordinate {
        /// Offending latitude in degrees.
        latitude: f64,
        /// Offending longitude in degrees.
        longitude: f64,
    },
    /// Sphere radius is not a finite positive number.
    #[error("sphere radius must be finite and positive, got {radius_meters}")]
    InvalidRadius {
        /// Offending radius in metres.
        radius_meters: f64,
    },
}

/// A point on the globe in signed decimal degrees.
///
/// Values read back from storage are carried as-is; call
/// [`Coordinate::validate`] (or let [`Haversine`] do it) before relying on the
/// ranges.
///
/// # Examples
/// ```
/// use fleet_proximity::domain::Coordinate;
///
/// let leeds = Coordinate::new(53.8085097, -1.5528634).expect("valid coordinate");
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// # let _ = leeds;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting out-of-range or non-finite values.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidCoordinate`] when either component is
    /// outside its range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        Self {
            latitude,
            longitude,
        }
        .validate()
    }

    /// Re-check the coordinate ranges, returning the coordinate on success.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidCoordinate`] when either component is
    /// outside its range or not finite.
    pub fn validate(self) -> Result<Self, GeoError> {
        let latitude_ok = self.latitude.is_finite() && self.latitude.abs() <= MAX_LATITUDE;
        let longitude_ok = self.longitude.is_finite() && self.longitude.abs() <= MAX_LONGITUDE;
        if latitude_ok && longitude_ok {
            Ok(self)
        } else {
            Err(GeoError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// Haversine distance on a sphere of fixed radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Haversine {
    radius_meters: f64,
}

impl Default for Haversine {
    fn default() -> Self {
        Self {
            radius_meters: EARTH_MEAN_RADIUS_METERS,
        }
    }
}

impl Haversine {
    /// Use a custom sphere radius.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidRadius`] when the radius is not finite or
    /// not strictly positive.
    pub fn with_radius(radius_meters: f64) -> Result<Self, GeoError> {
        if radius_meters.is_finite() && radius_meters > 0.0 {
            Ok(Self { radius_meters })
        } else {
            Err(GeoError::InvalidRadius { radius_meters })
        }
    }

    /// Sphere radius in metres.
    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// Great-circle distance between `from` and `to` in metres.
    ///
    /// The result is symmetric in its arguments and exactly zero for equal
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidCoordinate`] when either coordinate is
    /// outside the valid ranges.
    ///
    /// # Examples
    /// ```
    /// use fleet_proximity::domain::{Coordinate, Haversine};
    ///
    /// let a = Coordinate::new(53.8085097, -1.5528634).expect("valid");
    /// let b = Coordinate::new(53.8080000, -1.5530000).expect("valid");
    /// let distance = Haversine::default().distance_meters(a, b).expect("distance");
    /// assert!(distance > 0.0 && distance < 100.0);
    /// ```
    pub fn distance_meters(&self, from: Coordinate, to: Coordinate) -> Result<f64, GeoError> {
        let from = from.validate()?;
        let to = to.validate()?;

        let from_lat = from.latitude.to_radians();
        let to_lat = to.latitude.to_radians();
        let half_delta_lat = (to.latitude - from.latitude).to_radians() / 2.0;
        let half_delta_lon = (to.longitude - from.longitude).to_radians() / 2.0;

        let haversine = half_delta_lat.sin().powi(2)
            + from_lat.cos() * to_lat.cos() * half_delta_lon.sin().powi(2);
        // Rounding can push the term just past 1 near antipodes.
        let central_angle = 2.0 * haversine.clamp(0.0, 1.0).sqrt().asin();

        Ok(self.radius_meters * central_angle)
    }
}

/// Convert metres to kilometres for operator-facing output.
pub fn meters_to_kilometres(meters: f64) -> f64 {
    meters / METERS_PER_KILOMETRE
}

#[cfg(test)]
mod tests {
    //! Distance maths regression coverage.

    use std::f64::consts::PI;

    use rstest::rstest;

    use super::*;

    fn coordinate(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate::new(latitude, longitude).expect("test coordinate should be valid")
    }

    #[rstest]
    #[case::leeds(53.808_509_7, -1.552_863_4, 53.808, -1.553)]
    #[case::equator(0.0, 0.0, 0.0, 1.0)]
    #[case::poles(90.0, 0.0, -90.0, 0.0)]
    #[case::antimeridian(10.0, 179.5, -10.0, -179.5)]
    #[case::near_antipodal(45.0, 30.0, -45.0, -150.0)]
    fn distance_is_symmetric(
        #[case] lat_a: f64,
        #[case] lon_a: f64,
        #[case] lat_b: f64,
        #[case] lon_b: f64,
    ) {
        let haversine = Haversine::default();
        let a = coordinate(lat_a, lon_a);
        let b = coordinate(lat_b, lon_b);

        let forward = haversine.distance_meters(a, b).expect("forward distance");
        let backward = haversine.distance_meters(b, a).expect("backward distance");

        assert_eq!(forward.to_bits(), backward.to_bits());
    }

    #[rstest]
    #[case(53.808_509_7, -1.552_863_4)]
    #[case(90.0, 180.0)]
    #[case(-90.0, -180.0)]
    #[case(0.0, 0.0)]
    fn distance_to_self_is_zero(#[case] latitude: f64, #[case] longitude: f64) {
        let point = coordinate(latitude, longitude);
        let distance = Haversine::default()
            .distance_meters(point, point)
            .expect("distance");
        assert_eq!(distance, 0.0);
    }

    #[rstest]
    fn nearby_leeds_points_are_tens_of_metres_apart() {
        let distance = Haversine::default()
            .distance_meters(
                coordinate(53.808_509_7, -1.552_863_4),
                coordinate(53.808, -1.553),
            )
            .expect("distance");
        assert!(distance > 0.0, "expected a positive distance, got {distance}");
        assert!(distance < 100.0, "expected under 100 m, got {distance}");
    }

    #[rstest]
    fn pole_to_pole_is_half_the_circumference() {
        let distance = Haversine::default()
            .distance_meters(coordinate(90.0, 0.0), coordinate(-90.0, 0.0))
            .expect("distance");
        let expected = PI * EARTH_MEAN_RADIUS_METERS;
        assert!((distance - expected).abs() < 1e-3, "got {distance}");
    }

    #[rstest]
    fn exact_antipodes_do_not_produce_nan() {
        let distance = Haversine::default()
            .distance_meters(coordinate(0.0, 0.0), coordinate(0.0, 180.0))
            .expect("distance");
        assert!(distance.is_finite());
        assert!((distance - PI * EARTH_MEAN_RADIUS_METERS).abs() < 1e-3);
    }

    #[rstest]
    fn one_degree_of_latitude_is_about_111_km() {
        let distance = Haversine::default()
            .distance_meters(coordinate(0.0, 0.0), coordinate(1.0, 0.0))
            .expect("distance");
        assert!((distance - 111_194.9).abs() < 1.0, "got {distance}");
    }

    #[rstest]
    fn radius_scales_distance_linearly() {
        let unit = Haversine::with_radius(1.0).expect("unit sphere");
        let angle = unit
            .distance_meters(coordinate(0.0, 0.0), coordinate(0.0, 90.0))
            .expect("distance");
        assert!((angle - PI / 2.0).abs() < 1e-12);
        assert_eq!(unit.radius_meters(), 1.0);
    }

    #[rstest]
    #[case::latitude_too_high(90.000_1, 0.0)]
    #[case::latitude_too_low(-91.0, 0.0)]
    #[case::longitude_too_high(0.0, 180.5)]
    #[case::longitude_too_low(0.0, -200.0)]
    #[case::nan_latitude(f64::NAN, 0.0)]
    #[case::infinite_longitude(0.0, f64::INFINITY)]
    fn invalid_coordinates_are_rejected(#[case] latitude: f64, #[case] longitude: f64) {
        assert!(matches!(
            Coordinate::new(latitude, longitude),
            Err(GeoError::InvalidCoordinate { .. })
        ));

        let unchecked = Coordinate {
            latitude,
            longitude,
        };
        let result = Haversine::default().distance_meters(unchecked, coordinate(0.0, 0.0));
        assert!(matches!(result, Err(GeoError::InvalidCoordinate { .. })));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn invalid_radius_is_rejected(#[case] radius: f64) {
        assert!(matches!(
            Haversine::with_radius(radius),
            Err(GeoError::InvalidRadius { .. })
        ));
    }

    #[rstest]
    fn kilometre_conversion() {
        assert_eq!(meters_to_kilometres(1_500.0), 1.5);
    }
}
