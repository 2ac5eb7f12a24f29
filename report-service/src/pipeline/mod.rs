use std::time::Instant;

use facility_client::domain::MeterType;
use futures::StreamExt;

use crate::{
    report::{
        self, build_rows, compute_totals, report_filename, Category, FacilityBatch, ReportPeriod,
        ReportRow, ReportSummary, Taxonomy, TotalsRow, CONTENT_TYPE,
    },
    sources::{DataSource, SourceError},
};

const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Which facilities a report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacilityScope {
    All,
    Single(String),
}

impl FacilityScope {
    pub fn facility_name(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Single(name) => Some(name),
        }
    }
}

impl From<Option<String>> for FacilityScope {
    fn from(facility: Option<String>) -> Self {
        match facility {
            Some(name) if !name.trim().is_empty() => Self::Single(name.trim().to_string()),
            _ => Self::All,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("failed to list facilities: {0}")]
    FacilityList(#[source] SourceError),
    #[error("failed to encode report: {0}")]
    Encode(#[from] csv::Error),
}

/// A facility whose data could not be fetched completely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityFailure {
    pub facility: String,
    pub error: String,
}

/// Encoded report ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub category: Category,
    pub scope: FacilityScope,
    pub period: ReportPeriod,
    pub artifact: ReportArtifact,
    pub rows: Vec<ReportRow>,
    pub totals: TotalsRow,
    pub failures: Vec<FacilityFailure>,
}

impl ReportOutcome {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary::new(
            self.category,
            self.scope.facility_name(),
            &self.period,
            &self.rows,
            &self.totals,
            self.failures.iter().map(|f| f.facility.clone()).collect(),
        )
    }
}

/// Fetches data for a facility scope and runs it through the report engine.
pub struct ReportPipeline<D> {
    source: D,
    taxonomy: Taxonomy,
    period: ReportPeriod,
    fetch_concurrency: usize,
}

impl<D> ReportPipeline<D>
where
    D: DataSource,
{
    pub fn new(source: D, taxonomy: Taxonomy) -> Self {
        Self {
            source,
            taxonomy,
            period: ReportPeriod::CURRENT,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    pub fn with_fetch_concurrency(mut self, fetch_concurrency: usize) -> Self {
        self.fetch_concurrency = fetch_concurrency.max(1);
        self
    }

    pub async fn run(
        &self,
        category: Category,
        scope: &FacilityScope,
    ) -> Result<ReportOutcome, ReportError> {
        let started = Instant::now();
        let facilities = self.facility_names(scope).await?;
        let meter_types = category.meter_types();

        let fetched: Vec<(FacilityBatch, Option<FacilityFailure>)> =
            futures::stream::iter(facilities)
                .map(|name| self.fetch_facility(name, &meter_types))
                .buffered(self.fetch_concurrency)
                .collect()
                .await;

        let mut batches = Vec::with_capacity(fetched.len());
        let mut failures = Vec::new();
        for (batch, failure) in fetched {
            batches.push(batch);
            failures.extend(failure);
        }

        let rows = build_rows(category, &self.taxonomy, &self.period, &batches);
        let totals = compute_totals(&rows);
        let bytes = report::encode(category, &self.period, &rows, &totals)?;

        let artifact = ReportArtifact {
            filename: report_filename(category, scope.facility_name()),
            content_type: CONTENT_TYPE,
            bytes,
        };

        metrics::counter!("report_generated_total", "category" => category.slug()).increment(1);
        tracing::info!(
            %category,
            facilities = batches.len(),
            rows = rows.len(),
            failed_facilities = failures.len(),
            filename = %artifact.filename,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "report generated"
        );

        Ok(ReportOutcome {
            category,
            scope: scope.clone(),
            period: self.period,
            artifact,
            rows,
            totals,
            failures,
        })
    }

    async fn facility_names(&self, scope: &FacilityScope) -> Result<Vec<String>, ReportError> {
        match scope {
            FacilityScope::Single(name) => Ok(vec![name.clone()]),
            FacilityScope::All => {
                let facilities = self.source.facilities().await.map_err(|e| {
                    tracing::error!(error = %e, "failed to list facilities");
                    ReportError::FacilityList(e)
                })?;
                Ok(facilities.into_iter().map(|f| f.name).collect())
            }
        }
    }

    /// A failed meter fetch leaves the facility without rows; a failed
    /// readings fetch still yields its meters with every month absent.
    async fn fetch_facility(
        &self,
        facility: String,
        meter_types: &[MeterType],
    ) -> (FacilityBatch, Option<FacilityFailure>) {
        let mut batch = FacilityBatch {
            facility_name: facility,
            ..FacilityBatch::default()
        };

        match self.source.meters(&batch.facility_name).await {
            Ok(meters) => batch.meters = meters,
            Err(e) => {
                let failure = record_failure(&batch.facility_name, "meters", e);
                return (batch, Some(failure));
            }
        }

        match self.source.readings(&batch.facility_name, meter_types).await {
            Ok(readings) => {
                batch.readings = readings;
                (batch, None)
            }
            Err(e) => {
                let failure = record_failure(&batch.facility_name, "readings", e);
                (batch, Some(failure))
            }
        }
    }
}

fn record_failure(facility: &str, what: &'static str, error: SourceError) -> FacilityFailure {
    metrics::counter!("report_facility_fetch_failures_total", "kind" => what).increment(1);
    tracing::error!(facility, error = %error, "failed to fetch {what}; continuing without them");
    FacilityFailure {
        facility: facility.to_string(),
        error: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facility_client::domain::{Facility, Meter, Reading};
    use std::collections::{HashMap, HashSet};
    use time::macros::date;

    #[derive(Default)]
    struct MemorySource {
        facilities: Vec<String>,
        meters: HashMap<String, Vec<Meter>>,
        readings: HashMap<String, Vec<Reading>>,
        broken_meters: HashSet<String>,
        broken_readings: HashSet<String>,
        broken_list: bool,
    }

    #[async_trait::async_trait]
    impl DataSource for MemorySource {
        async fn facilities(&self) -> Result<Vec<Facility>, SourceError> {
            if self.broken_list {
                return Err(SourceError::Database("connection refused".to_string()));
            }
            Ok(self
                .facilities
                .iter()
                .map(|name| Facility {
                    name: name.clone(),
                    address: String::new(),
                    email: String::new(),
                })
                .collect())
        }

        async fn meters(&self, facility: &str) -> Result<Vec<Meter>, SourceError> {
            if self.broken_meters.contains(facility) {
                return Err(SourceError::Database("timeout".to_string()));
            }
            Ok(self.meters.get(facility).cloned().unwrap_or_default())
        }

        async fn readings(
            &self,
            facility: &str,
            _meter_types: &[MeterType],
        ) -> Result<Vec<Reading>, SourceError> {
            if self.broken_readings.contains(facility) {
                return Err(SourceError::Database("timeout".to_string()));
            }
            Ok(self.readings.get(facility).cloned().unwrap_or_default())
        }
    }

    fn meter(facility: &str, serial: &str) -> Meter {
        Meter {
            serial_number: serial.to_string(),
            meter_type: MeterType::Electricity,
            facility_name: facility.to_string(),
            ppe: None,
            unit: None,
            multiply_factor: None,
        }
    }

    fn source() -> MemorySource {
        let mut s = MemorySource {
            facilities: vec!["Blok A".to_string(), "Blok B".to_string()],
            ..MemorySource::default()
        };
        s.meters.insert("Blok A".to_string(), vec![meter("Blok A", "E-1")]);
        s.meters.insert("Blok B".to_string(), vec![meter("Blok B", "E-2")]);
        s.readings.insert(
            "Blok A".to_string(),
            vec![Reading {
                reading_id: Some(1),
                meter_serial_number: "E-1".to_string(),
                value: Some(10.0),
                reading_date: date!(2025 - 01 - 05),
                recorded_by: String::new(),
                unit: None,
            }],
        );
        s
    }

    #[test]
    fn scope_from_optional_name() {
        assert_eq!(FacilityScope::from(None), FacilityScope::All);
        assert_eq!(FacilityScope::from(Some("  ".to_string())), FacilityScope::All);
        assert_eq!(
            FacilityScope::from(Some("Blok A".to_string())),
            FacilityScope::Single("Blok A".to_string())
        );
    }

    #[tokio::test]
    async fn all_scope_covers_every_facility_in_order() {
        let pipeline = ReportPipeline::new(source(), Taxonomy::default());
        let outcome = pipeline
            .run(Category::Electricity, &FacilityScope::All)
            .await
            .unwrap();

        let serials: Vec<&str> = outcome.rows.iter().map(|r| r.serial_number.as_str()).collect();
        assert_eq!(serials, vec!["E-1", "E-2"]);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.artifact.filename, "Raport_Energia_elektryczna_Wszystkie_obiekty.csv");
        assert_eq!(outcome.artifact.content_type, "text/csv;charset=utf-8");
    }

    #[tokio::test]
    async fn meter_failure_drops_only_that_facility() {
        let mut s = source();
        s.broken_meters.insert("Blok A".to_string());
        let pipeline = ReportPipeline::new(s, Taxonomy::default()).with_fetch_concurrency(1);

        let outcome = pipeline
            .run(Category::Electricity, &FacilityScope::All)
            .await
            .unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].facility_name, "Blok B");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].facility, "Blok A");
    }

    #[tokio::test]
    async fn readings_failure_keeps_meters_with_absent_months() {
        let mut s = source();
        s.broken_readings.insert("Blok A".to_string());
        let pipeline = ReportPipeline::new(s, Taxonomy::default());

        let outcome = pipeline
            .run(Category::Electricity, &FacilityScope::Single("Blok A".to_string()))
            .await
            .unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert!(outcome.rows[0].cells.iter().all(|c| c.displayed_value.is_none()));
        assert_eq!(outcome.summary().failed_facilities, vec!["Blok A".to_string()]);
        assert_eq!(outcome.artifact.filename, "Raport_Energia_elektryczna_Blok_A.csv");
    }

    #[tokio::test]
    async fn facility_list_failure_aborts_all_scope() {
        let s = MemorySource {
            broken_list: true,
            ..MemorySource::default()
        };
        let pipeline = ReportPipeline::new(s, Taxonomy::default());

        let res = pipeline.run(Category::Heat, &FacilityScope::All).await;
        assert!(matches!(res, Err(ReportError::FacilityList(_))));
    }
}
