//! Test utilities shared by unit tests (in `src/`) and behaviour tests (in
//! `tests/`). Only compiled for tests or with the `test-support` feature.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{Coordinate, Facility, FacilityId, Vehicle, VehicleId};

/// Clock whose current instant is set by the test.
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Clock frozen at `now` until advanced.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward by `seconds`; negative values move it back.
    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Fixed instant used as "now" across the suites.
///
/// # Panics
///
/// Never in practice; the literal instant is unambiguous in UTC.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).single() {
        Some(now) => now,
        None => panic!("fixed test instant is unambiguous"),
    }
}

/// Vehicle with a generated display name.
pub fn vehicle(id: i64) -> Vehicle {
    Vehicle {
        id: VehicleId::new(id),
        display_name: format!("truck-{id}"),
    }
}

/// Facility at an unchecked coordinate, so tests can seed bad reference data.
pub fn facility(id: i64, name: &str, latitude: f64, longitude: f64) -> Facility {
    Facility {
        id: FacilityId::new(id),
        name: name.to_owned(),
        location: Coordinate {
            latitude,
            longitude,
        },
    }
}

/// Unchecked coordinate.
pub fn point(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate {
        latitude,
        longitude,
    }
}
