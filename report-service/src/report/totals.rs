use super::rows::ReportRow;

pub const TOTALS_LABEL: &str = "SUMA";

/// Sum of usages per report month across all rows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TotalsRow {
    pub sums: [f64; 12],
}

impl TotalsRow {
    pub fn label(&self) -> &'static str {
        TOTALS_LABEL
    }

    /// Sum for month `i` (0 = January), or `None` when it is exactly zero.
    pub fn display_sum(&self, i: usize) -> Option<f64> {
        self.sums.get(i).copied().filter(|s| *s != 0.0)
    }
}

/// Absent usages contribute nothing. The anchor month is never summed.
pub fn compute_totals(rows: &[ReportRow]) -> TotalsRow {
    let mut totals = TotalsRow::default();
    for row in rows {
        for (sum, cell) in totals.sums.iter_mut().zip(row.cells.iter()) {
            if let Some(usage) = cell.usage {
                *sum += usage;
            }
        }
    }
    totals
}
