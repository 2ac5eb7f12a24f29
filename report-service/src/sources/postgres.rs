use facility_client::{
    db,
    domain::{Facility, Meter, MeterType, Reading},
};
use sqlx::postgres::PgPool;

use super::{DataSource, SourceError};

/// Reads straight from the facility-management database.
pub struct PostgresDataSource {
    pool: PgPool,
}

impl PostgresDataSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(e: anyhow::Error) -> SourceError {
    SourceError::Database(e.to_string())
}

#[async_trait::async_trait]
impl DataSource for PostgresDataSource {
    async fn facilities(&self) -> Result<Vec<Facility>, SourceError> {
        db::facilities(&self.pool).await.map_err(db_error)
    }

    async fn meters(&self, facility: &str) -> Result<Vec<Meter>, SourceError> {
        db::meters_for_facility(&self.pool, facility)
            .await
            .map_err(db_error)
    }

    async fn readings(
        &self,
        facility: &str,
        meter_types: &[MeterType],
    ) -> Result<Vec<Reading>, SourceError> {
        db::readings_for_facility(&self.pool, facility, meter_types)
            .await
            .map_err(db_error)
    }
}
