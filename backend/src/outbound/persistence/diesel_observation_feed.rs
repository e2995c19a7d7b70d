//! PostgreSQL change feed over `location_observations`.
//!
//! Reads by `id > watermark ORDER BY id LIMIT batch`. An insert trigger
//! draws each id under a transaction-scoped advisory lock, so ids become
//! visible in commit order and a lower id can never appear after a higher one
//! was read. Rolled-back inserts leave gaps, which the feed simply skips.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ObservationFeed, ObservationFeedError};
use crate::domain::{BatchSize, LocationObservation, Watermark};

use super::diesel_helpers::{map_diesel_error, map_pool_error};
use super::models::ObservationRow;
use super::pool::DbPool;
use super::schema::location_observations;

/// Diesel-backed [`ObservationFeed`].
#[derive(Clone)]
pub struct DieselObservationFeed {
    pool: DbPool,
}

impl DieselObservationFeed {
    /// Feed reading through `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_error(error: diesel::result::Error) -> ObservationFeedError {
    map_diesel_error(
        error,
        "poll observations",
        ObservationFeedError::query,
        ObservationFeedError::connection,
    )
}

#[async_trait]
impl ObservationFeed for DieselObservationFeed {
    async fn poll_new_observations(
        &self,
        since: Watermark,
        limit: BatchSize,
    ) -> Result<Vec<LocationObservation>, ObservationFeedError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ObservationFeedError::connection))?;

        let mut query = location_observations::table
            .select(ObservationRow::as_select())
            .order_by(location_observations::id.asc())
            .limit(limit.as_i64())
            .into_boxed();
        if let Some(last) = since.last_processed() {
            query = query.filter(location_observations::id.gt(last.get()));
        }

        let rows: Vec<ObservationRow> = query.load(&mut conn).await.map_err(map_error)?;
        Ok(rows.into_iter().map(LocationObservation::from).collect())
    }
}
