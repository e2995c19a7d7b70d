//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Tracked vehicles (reference data).
    vehicles (id) {
        id -> Int8,
        display_name -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Fixed facilities (reference data).
    ///
    /// Coordinate ranges are enforced by check constraints.
    facilities (id) {
        id -> Int8,
        name -> Varchar,
        latitude -> Float8,
        longitude -> Float8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only vehicle location log.
    ///
    /// `id` is assigned by an insert trigger in commit order; its order
    /// defines the change feed.
    location_observations (id) {
        id -> Int8,
        vehicle_id -> Int8,
        latitude -> Float8,
        longitude -> Float8,
        observed_at -> Timestamptz,
        inserted_at -> Timestamptz,
    }
}

diesel::table! {
    /// Deduplicated proximity notifications.
    ///
    /// `(vehicle_id, facility_id, observation_id)` is unique.
    proximity_events (id) {
        id -> Int8,
        vehicle_id -> Int8,
        facility_id -> Int8,
        observation_id -> Int8,
        distance_meters -> Float8,
        recorded_at -> Timestamptz,
    }
}

diesel::table! {
    /// One feed cursor per pipeline.
    pipeline_watermarks (pipeline_name) {
        pipeline_name -> Varchar,
        last_observation_id -> Int8,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(location_observations -> vehicles (vehicle_id));
diesel::joinable!(proximity_events -> facilities (facility_id));
diesel::joinable!(proximity_events -> location_observations (observation_id));
diesel::joinable!(proximity_events -> vehicles (vehicle_id));

diesel::allow_tables_to_appear_in_same_query!(
    vehicles,
    facilities,
    location_observations,
    proximity_events,
    pipeline_watermarks,
);
