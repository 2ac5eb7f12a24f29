use std::{collections::HashSet, path::PathBuf};

use csv::StringRecord;
use facility_client::domain::{
    parse_reading_date, parse_reading_value, Facility, Meter, MeterType, Reading,
};

use super::{DataSource, SourceError};

/// Offline source backed by exports in a single directory.
///
/// Expected files (CSV with a header row, columns matched by name):
/// - `facilities.csv`: name, address, email
/// - `meters.csv`: serial_number, meter_type, facility_name, ppe (optional),
///   unit (optional), multiply_factor (optional)
/// - `readings.csv`: reading_id (optional), meter_serial_number, value,
///   reading_date, email, unit (optional)
///
/// `readings.ndjson` with the same keys, one JSON object per line, is used
/// when `readings.csv` does not exist.
pub struct FileDataSource {
    dir: PathBuf,
}

impl FileDataSource {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let path = self.dir.join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SourceError::File(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn read_required(&self, name: &str) -> Result<Vec<u8>, SourceError> {
        self.read(name)
            .await?
            .ok_or_else(|| SourceError::File(format!("{name} not found in {}", self.dir.display())))
    }

    async fn all_meters(&self) -> Result<Vec<Meter>, SourceError> {
        let bytes = self.read_required("meters.csv").await?;
        parse_csv(&bytes, "meters.csv", record_to_meter)
    }

    async fn all_readings(&self) -> Result<Vec<Reading>, SourceError> {
        if let Some(bytes) = self.read("readings.csv").await? {
            let parsed = parse_csv(&bytes, "readings.csv", record_to_reading)?;
            return Ok(keep_dated(parsed));
        }

        let bytes = self.read_required("readings.ndjson").await?;
        parse_ndjson(&bytes).map(keep_dated)
    }
}

fn parse_optional_string(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_csv<T>(
    bytes: &[u8],
    file: &str,
    convert: fn(&StringRecord, &StringRecord) -> Result<T, SourceError>,
) -> Result<Vec<T>, SourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let headers = rdr
        .headers()
        .map_err(|e| SourceError::Parse(format!("failed to read {file} headers: {e}")))?
        .clone();

    let mut out = Vec::new();
    for result in rdr.records() {
        let record =
            result.map_err(|e| SourceError::Parse(format!("failed to read {file} record: {e}")))?;
        out.push(convert(&record, &headers)?);
    }
    Ok(out)
}

fn column<'r>(record: &'r StringRecord, headers: &StringRecord, name: &str) -> Result<&'r str, SourceError> {
    headers
        .iter()
        .position(|h| h == name)
        .and_then(|idx| record.get(idx))
        .ok_or_else(|| SourceError::Parse(format!("missing column '{name}' in CSV record")))
}

fn optional_column(record: &StringRecord, headers: &StringRecord, name: &str) -> Option<String> {
    column(record, headers, name).ok().and_then(parse_optional_string)
}

fn record_to_facility(record: &StringRecord, headers: &StringRecord) -> Result<Facility, SourceError> {
    Ok(Facility {
        name: column(record, headers, "name")?.to_string(),
        address: optional_column(record, headers, "address").unwrap_or_default(),
        email: optional_column(record, headers, "email").unwrap_or_default(),
    })
}

fn record_to_meter(record: &StringRecord, headers: &StringRecord) -> Result<Meter, SourceError> {
    Ok(Meter {
        serial_number: column(record, headers, "serial_number")?.to_string(),
        meter_type: MeterType::from(column(record, headers, "meter_type")?.to_string()),
        facility_name: column(record, headers, "facility_name")?.to_string(),
        ppe: optional_column(record, headers, "ppe"),
        unit: optional_column(record, headers, "unit"),
        multiply_factor: column(record, headers, "multiply_factor")
            .ok()
            .and_then(parse_reading_value),
    })
}

/// `Ok(None)` for rows whose date cannot be placed in a month.
fn record_to_reading(record: &StringRecord, headers: &StringRecord) -> Result<Option<Reading>, SourceError> {
    let date_str = column(record, headers, "reading_date")?;
    let Some(reading_date) = parse_reading_date(date_str) else {
        tracing::debug!(reading_date = date_str, "skipping reading with unparseable date");
        return Ok(None);
    };

    Ok(Some(Reading {
        reading_id: column(record, headers, "reading_id")
            .ok()
            .and_then(|s| s.trim().parse().ok()),
        meter_serial_number: column(record, headers, "meter_serial_number")?.to_string(),
        value: parse_reading_value(column(record, headers, "value")?),
        reading_date,
        recorded_by: optional_column(record, headers, "email")
            .or_else(|| optional_column(record, headers, "recorded_by"))
            .unwrap_or_default(),
        unit: optional_column(record, headers, "unit"),
    }))
}

#[derive(serde::Deserialize)]
struct IncomingReading {
    reading_id: Option<i64>,
    meter_serial_number: String,
    #[serde(default)]
    value: serde_json::Value,
    reading_date: String,
    #[serde(alias = "email")]
    recorded_by: Option<String>,
    unit: Option<String>,
}

impl IncomingReading {
    fn into_reading(self) -> Option<Reading> {
        let Some(reading_date) = parse_reading_date(&self.reading_date) else {
            tracing::debug!(reading_date = %self.reading_date, "skipping reading with unparseable date");
            return None;
        };

        let value = match &self.value {
            serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            serde_json::Value::String(s) => parse_reading_value(s),
            _ => None,
        };

        Some(Reading {
            reading_id: self.reading_id,
            meter_serial_number: self.meter_serial_number,
            value,
            reading_date,
            recorded_by: self.recorded_by.unwrap_or_default(),
            unit: self.unit.and_then(|u| parse_optional_string(&u)),
        })
    }
}

fn parse_ndjson(bytes: &[u8]) -> Result<Vec<Option<Reading>>, SourceError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| SourceError::Parse(format!("readings.ndjson is not UTF-8: {e}")))?;

    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str::<IncomingReading>(line)
                .map(IncomingReading::into_reading)
                .map_err(|e| SourceError::Parse(format!("failed to parse reading json line: {e}")))
        })
        .collect()
}

fn keep_dated(readings: Vec<Option<Reading>>) -> Vec<Reading> {
    let total = readings.len();
    let kept: Vec<Reading> = readings.into_iter().flatten().collect();
    let skipped = total - kept.len();
    if skipped > 0 {
        metrics::counter!("report_undated_readings_total").increment(skipped as u64);
    }
    kept
}

#[async_trait::async_trait]
impl DataSource for FileDataSource {
    async fn facilities(&self) -> Result<Vec<Facility>, SourceError> {
        let bytes = self.read_required("facilities.csv").await?;
        parse_csv(&bytes, "facilities.csv", record_to_facility)
    }

    async fn meters(&self, facility: &str) -> Result<Vec<Meter>, SourceError> {
        let meters = self.all_meters().await?;
        Ok(meters
            .into_iter()
            .filter(|m| m.facility_name == facility)
            .collect())
    }

    async fn readings(
        &self,
        facility: &str,
        meter_types: &[MeterType],
    ) -> Result<Vec<Reading>, SourceError> {
        let meters = self.meters(facility).await?;
        let serials: HashSet<String> = meters
            .into_iter()
            .filter(|m| meter_types.is_empty() || meter_types.contains(&m.meter_type))
            .map(|m| m.serial_number)
            .collect();

        let readings = self.all_readings().await?;
        Ok(readings
            .into_iter()
            .filter(|r| serials.contains(&r.meter_serial_number))
            .collect())
    }
}
