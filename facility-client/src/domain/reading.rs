use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    pub reading_id: Option<i64>,
    pub meter_serial_number: String,
    /// `None` when the stored value was missing or not a number.
    pub value: Option<f64>,
    pub reading_date: Date,
    pub recorded_by: String,
    pub unit: Option<String>,
}

/// Parse a stored meter value.
///
/// Accepts either `.` or `,` as the decimal separator. Empty, non-numeric and
/// non-finite input yields `None`.
pub fn parse_reading_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = trimmed.replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

/// Parse a reading date given either as `YYYY-MM-DD` or as a timestamp.
///
/// For RFC3339 timestamps the calendar date in the timestamp's own offset is
/// used. Other timestamp shapes (`2025-01-31 23:10:00+00`) fall back to their
/// leading date part.
pub fn parse_reading_date(raw: &str) -> Option<Date> {
    let trimmed = raw.trim();

    if let Ok(ts) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(ts.date());
    }

    let date_part = trimmed.get(..10)?;
    Date::parse(date_part, format_description!("[year]-[month]-[day]")).ok()
}
