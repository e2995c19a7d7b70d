//! PostgreSQL deduplicating writer for proximity events.
//!
//! `record_if_new` is a single `INSERT .. ON CONFLICT (vehicle_id,
//! facility_id, observation_id) DO NOTHING RETURNING ..`. The unique index
//! arbitrates concurrent writers across processes: exactly one insert returns
//! a row, every other one returns nothing and reports
//! [`RecordOutcome::AlreadyExists`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    ProximityEventRepository, ProximityEventRepositoryError, RecordOutcome,
};
use crate::domain::{NewProximityEvent, ProximityEvent, ProximityEventId};

use super::diesel_helpers::{map_diesel_error, map_pool_error, sql_limit};
use super::models::{NewProximityEventRow, ProximityEventRow};
use super::pool::DbPool;
use super::schema::proximity_events;

/// Diesel-backed [`ProximityEventRepository`].
#[derive(Clone)]
pub struct DieselProximityEventRepository {
    pool: DbPool,
}

impl DieselProximityEventRepository {
    /// Repository writing through `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_error(
    error: diesel::result::Error,
    operation: &'static str,
) -> ProximityEventRepositoryError {
    map_diesel_error(
        error,
        operation,
        ProximityEventRepositoryError::query,
        ProximityEventRepositoryError::connection,
    )
}

#[async_trait]
impl ProximityEventRepository for DieselProximityEventRepository {
    async fn record_if_new(
        &self,
        event: &NewProximityEvent,
    ) -> Result<RecordOutcome, ProximityEventRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ProximityEventRepositoryError::connection))?;

        let inserted: Option<ProximityEventRow> = diesel::insert_into(proximity_events::table)
            .values(NewProximityEventRow::from(event))
            .on_conflict((
                proximity_events::vehicle_id,
                proximity_events::facility_id,
                proximity_events::observation_id,
            ))
            .do_nothing()
            .returning(ProximityEventRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_error(err, "record proximity event"))?;

        Ok(inserted.map_or(RecordOutcome::AlreadyExists, |row| {
            RecordOutcome::Written(ProximityEvent::from(row))
        }))
    }

    async fn list_after(
        &self,
        after: Option<ProximityEventId>,
        limit: usize,
    ) -> Result<Vec<ProximityEvent>, ProximityEventRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ProximityEventRepositoryError::connection))?;

        let mut query = proximity_events::table
            .select(ProximityEventRow::as_select())
            .order_by(proximity_events::id.asc())
            .limit(sql_limit(limit))
            .into_boxed();
        if let Some(cursor) = after {
            query = query.filter(proximity_events::id.gt(cursor.get()));
        }

        let rows: Vec<ProximityEventRow> = query
            .load(&mut conn)
            .await
            .map_err(|err| map_error(err, "list proximity events"))?;
        Ok(rows.into_iter().map(ProximityEvent::from).collect())
    }
}
