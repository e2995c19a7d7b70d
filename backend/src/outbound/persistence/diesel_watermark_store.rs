//! PostgreSQL pipeline watermarks.
//!
//! `advance` is one conditional upsert: the row is created on first commit
//! and only ever updated to a larger observation id. Zero affected rows means
//! an overlapping run already committed an equal or later position.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel_async::RunQueryDsl;

use crate::domain::ports::{WatermarkAdvance, WatermarkStore, WatermarkStoreError};
use crate::domain::{ObservationId, PipelineName, Watermark};

use super::diesel_helpers::{map_diesel_error, map_pool_error};
use super::pool::DbPool;
use super::schema::pipeline_watermarks;

const ADVANCE_SQL: &str = "INSERT INTO pipeline_watermarks \
    (pipeline_name, last_observation_id, updated_at) \
    VALUES ($1, $2, now()) \
    ON CONFLICT (pipeline_name) DO UPDATE SET \
    last_observation_id = EXCLUDED.last_observation_id, \
    updated_at = EXCLUDED.updated_at \
    WHERE pipeline_watermarks.last_observation_id < EXCLUDED.last_observation_id";

/// Diesel-backed [`WatermarkStore`].
#[derive(Clone)]
pub struct DieselWatermarkStore {
    pool: DbPool,
}

impl DieselWatermarkStore {
    /// Store committing through `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_error(error: diesel::result::Error, operation: &'static str) -> WatermarkStoreError {
    map_diesel_error(
        error,
        operation,
        WatermarkStoreError::query,
        WatermarkStoreError::connection,
    )
}

fn advance_outcome(affected_rows: usize) -> WatermarkAdvance {
    if affected_rows == 0 {
        WatermarkAdvance::AlreadyAhead
    } else {
        WatermarkAdvance::Advanced
    }
}

#[async_trait]
impl WatermarkStore for DieselWatermarkStore {
    async fn load(&self, pipeline: &PipelineName) -> Result<Watermark, WatermarkStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, WatermarkStoreError::connection))?;

        let last: Option<i64> = pipeline_watermarks::table
            .filter(pipeline_watermarks::pipeline_name.eq(pipeline.as_str()))
            .select(pipeline_watermarks::last_observation_id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_error(err, "load watermark"))?;

        Ok(Watermark::from_last_processed(last.map(ObservationId::new)))
    }

    async fn advance(
        &self,
        pipeline: &PipelineName,
        processed: ObservationId,
    ) -> Result<WatermarkAdvance, WatermarkStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, WatermarkStoreError::connection))?;

        let affected = sql_query(ADVANCE_SQL)
            .bind::<Text, _>(pipeline.as_str())
            .bind::<BigInt, _>(processed.get())
            .execute(&mut conn)
            .await
            .map_err(|err| map_error(err, "advance watermark"))?;

        Ok(advance_outcome(affected))
    }
}
