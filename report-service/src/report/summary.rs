use serde::Serialize;

use super::{rows::ReportRow, series::ReportPeriod, taxonomy::Category, totals::TotalsRow};

/// JSON view of one report run, used by the dashboard's aggregate chart.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportSummary {
    pub category: Category,
    pub facility: Option<String>,
    pub year: i32,
    pub rows: usize,
    /// Per-month totals, January first; `null` where nothing was consumed.
    pub monthly_totals: Vec<Option<f64>>,
    pub negative_usages: usize,
    pub failed_facilities: Vec<String>,
}

impl ReportSummary {
    pub fn new(
        category: Category,
        facility: Option<&str>,
        period: &ReportPeriod,
        rows: &[ReportRow],
        totals: &TotalsRow,
        failed_facilities: Vec<String>,
    ) -> Self {
        Self {
            category,
            facility: facility.map(str::to_string),
            year: period.year(),
            rows: rows.len(),
            monthly_totals: (0..12).map(|i| totals.display_sum(i)).collect(),
            negative_usages: rows.iter().map(ReportRow::negative_usages).sum(),
            failed_facilities,
        }
    }
}
