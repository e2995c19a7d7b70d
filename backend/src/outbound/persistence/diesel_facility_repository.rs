//! PostgreSQL facility reference data.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::Facility;
use crate::domain::ports::{FacilityRepository, FacilityRepositoryError};

use super::diesel_helpers::{map_diesel_error, map_pool_error};
use super::models::FacilityRow;
use super::pool::DbPool;
use super::schema::facilities;

/// Diesel-backed [`FacilityRepository`].
#[derive(Clone)]
pub struct DieselFacilityRepository {
    pool: DbPool,
}

impl DieselFacilityRepository {
    /// Repository reading through `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FacilityRepository for DieselFacilityRepository {
    async fn list_facilities(&self) -> Result<Vec<Facility>, FacilityRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, FacilityRepositoryError::connection))?;

        let rows: Vec<FacilityRow> = facilities::table
            .select(FacilityRow::as_select())
            .order_by(facilities::id.asc())
            .load(&mut conn)
            .await
            .map_err(|err| {
                map_diesel_error(
                    err,
                    "list facilities",
                    FacilityRepositoryError::query,
                    FacilityRepositoryError::connection,
                )
            })?;
        Ok(rows.into_iter().map(Facility::from).collect())
    }
}
