pub mod file;
pub mod postgres;

pub use file::FileDataSource;
pub use postgres::PostgresDataSource;

use facility_client::domain::{Facility, Meter, MeterType, Reading};
use sqlx::postgres::PgPoolOptions;

use crate::config::{AppConfig, SourceKind};

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("database error: {0}")]
    Database(String),
    #[error("file error: {0}")]
    File(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// Where facilities, meters and readings come from.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    async fn facilities(&self) -> Result<Vec<Facility>, SourceError>;

    async fn meters(&self, facility: &str) -> Result<Vec<Meter>, SourceError>;

    /// Readings for the facility's meters. An empty `meter_types` means all types.
    async fn readings(
        &self,
        facility: &str,
        meter_types: &[MeterType],
    ) -> Result<Vec<Reading>, SourceError>;
}

/// The source selected by `[source].kind`.
pub enum ConfiguredSource {
    Postgres(PostgresDataSource),
    Files(FileDataSource),
}

impl ConfiguredSource {
    pub async fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        match cfg.source.kind {
            SourceKind::Postgres => {
                let Some(db) = &cfg.database else {
                    anyhow::bail!("source.kind = \"postgres\" requires a [database] section");
                };
                let pool = PgPoolOptions::new()
                    .max_connections(db.max_connections)
                    .connect(&db.uri)
                    .await?;
                tracing::info!("reading facilities from postgres");
                Ok(Self::Postgres(PostgresDataSource::new(pool)))
            }
            SourceKind::Files => {
                let Some(dir) = &cfg.source.dir else {
                    anyhow::bail!("source.kind = \"files\" requires source.dir");
                };
                tracing::info!(dir = %dir.display(), "reading facilities from export files");
                Ok(Self::Files(FileDataSource::new(dir.clone())))
            }
        }
    }
}

#[async_trait::async_trait]
impl DataSource for ConfiguredSource {
    async fn facilities(&self) -> Result<Vec<Facility>, SourceError> {
        match self {
            Self::Postgres(s) => s.facilities().await,
            Self::Files(s) => s.facilities().await,
        }
    }

    async fn meters(&self, facility: &str) -> Result<Vec<Meter>, SourceError> {
        match self {
            Self::Postgres(s) => s.meters(facility).await,
            Self::Files(s) => s.meters(facility).await,
        }
    }

    async fn readings(
        &self,
        facility: &str,
        meter_types: &[MeterType],
    ) -> Result<Vec<Reading>, SourceError> {
        match self {
            Self::Postgres(s) => s.readings(facility, meter_types).await,
            Self::Files(s) => s.readings(facility, meter_types).await,
        }
    }
}
