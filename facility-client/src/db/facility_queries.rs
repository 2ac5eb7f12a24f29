use anyhow::Result;
use sqlx::PgPool;

use crate::domain::{parse_reading_date, parse_reading_value, Facility, Meter, MeterType, Reading};

#[derive(Debug, Clone, sqlx::FromRow)]
struct FacilityRow {
    name: String,
    address: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct MeterRow {
    serial_number: String,
    meter_type: String,
    facility_name: String,
    ppe: Option<String>,
    unit: Option<String>,
    multiply_factor: Option<f64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ReadingRow {
    reading_id: Option<i64>,
    meter_serial_number: String,
    value: Option<String>,
    reading_date: Option<String>,
    email: Option<String>,
    unit: Option<String>,
}

impl From<FacilityRow> for Facility {
    fn from(r: FacilityRow) -> Self {
        Facility {
            name: r.name,
            address: r.address.unwrap_or_default(),
            email: r.email.unwrap_or_default(),
        }
    }
}

impl From<MeterRow> for Meter {
    fn from(r: MeterRow) -> Self {
        Meter {
            serial_number: r.serial_number,
            meter_type: MeterType::from(r.meter_type),
            facility_name: r.facility_name,
            ppe: r.ppe.filter(|s| !s.trim().is_empty()),
            unit: r.unit.filter(|s| !s.trim().is_empty()),
            multiply_factor: r.multiply_factor,
        }
    }
}

impl ReadingRow {
    /// Rows without a usable date cannot be placed in any month and are dropped.
    fn into_reading(self) -> Option<Reading> {
        let reading_date = self.reading_date.as_deref().and_then(parse_reading_date)?;
        Some(Reading {
            reading_id: self.reading_id,
            meter_serial_number: self.meter_serial_number,
            value: self.value.as_deref().and_then(parse_reading_value),
            reading_date,
            recorded_by: self.email.unwrap_or_default(),
            unit: self.unit.filter(|s| !s.trim().is_empty()),
        })
    }
}

/// List every facility known to the backend, ordered by name.
pub async fn facilities(pool: &PgPool) -> Result<Vec<Facility>> {
    let rows = sqlx::query_as::<_, FacilityRow>(
        r#"
        SELECT name, address, email
        FROM facilities
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Facility::from).collect())
}

/// Fetch the meters installed in one facility, in the order the database returns them.
pub async fn meters_for_facility(pool: &PgPool, facility_name: &str) -> Result<Vec<Meter>> {
    let rows = sqlx::query_as::<_, MeterRow>(
        r#"
        SELECT
            serial_number,
            meter_type,
            facility_name,
            ppe,
            unit,
            multiply_factor::float8 AS multiply_factor
        FROM meters
        WHERE facility_name = $1
        "#,
    )
    .bind(facility_name)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Meter::from).collect())
}

/// Fetch readings for the meters of one facility.
///
/// When `meter_types` is non-empty only meters of those types are included.
/// Values and dates are read as text so a malformed row degrades to an
/// absent value instead of failing the whole query.
pub async fn readings_for_facility(
    pool: &PgPool,
    facility_name: &str,
    meter_types: &[MeterType],
) -> Result<Vec<Reading>> {
    // The dashboard stores the Polish labels; match on those.
    let labels: Vec<String> = meter_types.iter().map(|t| t.label().to_string()).collect();

    let rows = sqlx::query_as::<_, ReadingRow>(
        r#"
        SELECT
            r.reading_id::int8     AS reading_id,
            r.meter_serial_number,
            r.value::text          AS value,
            r.reading_date::text   AS reading_date,
            r.email,
            r.unit
        FROM readings r
        JOIN meters m ON m.serial_number = r.meter_serial_number
        WHERE m.facility_name = $1
          AND (cardinality($2::text[]) = 0 OR m.meter_type = ANY($2))
        ORDER BY r.reading_date, r.reading_id
        "#,
    )
    .bind(facility_name)
    .bind(&labels)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(ReadingRow::into_reading).collect())
}
