//! Reference-data and observation seeding over a plain `postgres` client.
//!
//! Observations are inserted without an `id`; the insert trigger assigns it,
//! exactly as for the ingestion service.

use postgres::{Client, GenericClient, NoTls};

use super::format_postgres_error;

/// Connect a synchronous client to `url`.
pub fn connect(url: &str) -> Result<Client, String> {
    Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))
}

/// Insert a vehicle row.
pub fn seed_vehicle(client: &mut Client, id: i64) -> Result<(), String> {
    let display_name = format!("truck-{id}");
    client
        .execute(
            "INSERT INTO vehicles (id, display_name) VALUES ($1, $2)",
            &[&id, &display_name],
        )
        .map(drop)
        .map_err(|err| format_postgres_error(&err))
}

/// Insert a facility row.
pub fn seed_facility(
    client: &mut Client,
    id: i64,
    name: &str,
    latitude: f64,
    longitude: f64,
) -> Result<(), String> {
    client
        .execute(
            "INSERT INTO facilities (id, name, latitude, longitude) VALUES ($1, $2, $3, $4)",
            &[&id, &name, &latitude, &longitude],
        )
        .map(drop)
        .map_err(|err| format_postgres_error(&err))
}

const INSERT_OBSERVATION_SQL: &str = concat!(
    "INSERT INTO location_observations (vehicle_id, latitude, longitude, observed_at) ",
    "VALUES ($1, $2, $3, now()) RETURNING id"
);

/// Append an observation and return the id the database assigned.
///
/// Works on a client or on an open transaction, which then holds the id
/// lock until it commits or rolls back.
pub fn insert_observation(
    client: &mut impl GenericClient,
    vehicle_id: i64,
    latitude: f64,
    longitude: f64,
) -> Result<i64, String> {
    client
        .query_one(INSERT_OBSERVATION_SQL, &[&vehicle_id, &latitude, &longitude])
        .map(|row| row.get::<_, i64>(0))
        .map_err(|err| format_postgres_error(&err))
}
