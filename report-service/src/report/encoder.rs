use time::Month;

use super::{
    format::{format_optional, format_reading, format_usage, ABSENT},
    rows::ReportRow,
    series::ReportPeriod,
    taxonomy::Category,
    totals::TotalsRow,
};

pub const CONTENT_TYPE: &str = "text/csv;charset=utf-8";

/// Filename suffix used when a report spans every facility.
pub const ALL_FACILITIES: &str = "Wszystkie_obiekty";

const IDENTITY_COLUMNS: [&str; 5] = ["Lokal", "nr licznika", "PPE", "jednostka", "mnozna"];
const USAGE_COLUMN: &str = "zuzycie";

/// Columns in every line: identity, anchor, then value/usage per month.
pub const COLUMN_COUNT: usize = IDENTITY_COLUMNS.len() + 1 + 2 * 12;

fn month_label(month: Month) -> &'static str {
    match month {
        Month::January => "styczen",
        Month::February => "luty",
        Month::March => "marzec",
        Month::April => "kwiecien",
        Month::May => "maj",
        Month::June => "czerwiec",
        Month::July => "lipiec",
        Month::August => "sierpien",
        Month::September => "wrzesien",
        Month::October => "pazdziernik",
        Month::November => "listopad",
        Month::December => "grudzien",
    }
}

pub fn header(period: &ReportPeriod) -> Vec<String> {
    let anchor = period.anchor();
    let mut out: Vec<String> = IDENTITY_COLUMNS.iter().map(|s| s.to_string()).collect();
    out.push(format!("{} {}", month_label(anchor.month), anchor.year));
    for bucket in &period.buckets()[1..] {
        out.push(month_label(bucket.month).to_string());
        out.push(USAGE_COLUMN.to_string());
    }
    out
}

fn identity_or_absent(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => ABSENT.to_string(),
    }
}

fn row_record(row: &ReportRow) -> Vec<String> {
    let mut out = Vec::with_capacity(COLUMN_COUNT);
    out.push(row.facility_name.clone());
    out.push(row.serial_number.clone());
    out.push(identity_or_absent(row.ppe.as_deref()));
    out.push(identity_or_absent(row.unit.as_deref()));
    out.push(format_optional(row.multiply_factor, format_reading));
    out.push(format_optional(row.anchor_cell.displayed_value, format_reading));
    for cell in &row.cells {
        out.push(format_optional(cell.displayed_value, format_reading));
        out.push(format_optional(cell.usage, format_usage));
    }
    out
}

/// `SUMA`, five blanks (identity and anchor), then a blank value cell and the
/// month's sum, so the totals line is [`COLUMN_COUNT`] wide like every data row.
fn totals_record(totals: &TotalsRow) -> Vec<String> {
    let mut out = Vec::with_capacity(COLUMN_COUNT);
    out.push(totals.label().to_string());
    out.extend(std::iter::repeat(String::new()).take(IDENTITY_COLUMNS.len()));
    for i in 0..12 {
        out.push(String::new());
        out.push(format_optional(totals.display_sum(i), format_usage));
    }
    out
}

/// Render the report as `;`-separated, CRLF-terminated UTF-8.
///
/// Every line, the totals line included, has [`COLUMN_COUNT`] fields.
pub fn encode(
    category: Category,
    period: &ReportPeriod,
    rows: &[ReportRow],
    totals: &TotalsRow,
) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::with_capacity((rows.len() + 2) * 256));

    wtr.write_record(header(period))?;
    for row in rows {
        wtr.write_record(row_record(row))?;
    }
    wtr.write_record(totals_record(totals))?;

    let bytes = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;

    tracing::debug!(%category, rows = rows.len(), bytes = bytes.len(), "encoded report");
    Ok(bytes)
}

/// `Raport_<category>_<facility or Wszystkie_obiekty>.csv`
pub fn report_filename(category: Category, facility: Option<&str>) -> String {
    let scope = match facility {
        Some(name) => sanitize_filename_part(name),
        None => ALL_FACILITIES.to_string(),
    };
    format!("Raport_{}_{}.csv", category.label(), scope)
}

fn sanitize_filename_part(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            c if c.is_whitespace() => '_',
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}
