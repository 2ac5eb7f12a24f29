use facility_client::domain::{Meter, Reading};

use super::{
    consumption::{compute_cells, MonthlyCell},
    index::ReadingIndex,
    series::{reconstruct, ReportPeriod},
    taxonomy::{Category, Taxonomy},
};

/// One report line: meter identity followed by its monthly cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub facility_name: String,
    pub serial_number: String,
    pub ppe: Option<String>,
    pub unit: Option<String>,
    pub multiply_factor: Option<f64>,
    pub anchor_cell: MonthlyCell,
    pub cells: [MonthlyCell; 12],
}

impl ReportRow {
    pub fn negative_usages(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.usage.is_some_and(|u| u < 0.0))
            .count()
    }
}

/// Meters and readings already fetched for one facility.
#[derive(Debug, Clone, Default)]
pub struct FacilityBatch {
    pub facility_name: String,
    pub meters: Vec<Meter>,
    pub readings: Vec<Reading>,
}

/// Build rows for every facility, in the order given, for meters of `category`.
pub fn build_rows(
    category: Category,
    taxonomy: &Taxonomy,
    period: &ReportPeriod,
    facilities: &[FacilityBatch],
) -> Vec<ReportRow> {
    facilities
        .iter()
        .flat_map(|batch| build_facility_rows(category, taxonomy, period, batch))
        .collect()
}

/// Rows for one facility. Meters keep the order the source returned them in.
pub fn build_facility_rows(
    category: Category,
    taxonomy: &Taxonomy,
    period: &ReportPeriod,
    batch: &FacilityBatch,
) -> Vec<ReportRow> {
    let unparseable = batch.readings.iter().filter(|r| r.value.is_none()).count();
    if unparseable > 0 {
        metrics::counter!("report_unparseable_values_total").increment(unparseable as u64);
        tracing::debug!(
            facility = %batch.facility_name,
            unparseable,
            "readings without a numeric value are shown as absent"
        );
    }

    let index = ReadingIndex::build(&batch.readings);
    if index.duplicates() > 0 {
        metrics::counter!("report_duplicate_readings_total").increment(index.duplicates() as u64);
    }

    let rows: Vec<ReportRow> = batch
        .meters
        .iter()
        .filter(|m| category.includes(&m.meter_type))
        .map(|meter| {
            let series = reconstruct(meter, &index, period);
            let cells = compute_cells(&series);
            let row = ReportRow {
                facility_name: batch.facility_name.clone(),
                serial_number: meter.serial_number.clone(),
                ppe: meter.ppe.clone(),
                unit: resolve_unit(meter, category, taxonomy),
                multiply_factor: meter.multiply_factor,
                anchor_cell: cells.anchor,
                cells: cells.months,
            };

            let negatives = row.negative_usages();
            if negatives > 0 {
                metrics::counter!("report_negative_usage_total").increment(negatives as u64);
                tracing::warn!(
                    facility = %row.facility_name,
                    meter = %row.serial_number,
                    months = negatives,
                    "meter reading went backwards"
                );
            }

            row
        })
        .collect();

    tracing::debug!(
        facility = %batch.facility_name,
        %category,
        meters = batch.meters.len(),
        readings = batch.readings.len(),
        rows = rows.len(),
        "built facility rows"
    );

    rows
}

fn resolve_unit(meter: &Meter, category: Category, taxonomy: &Taxonomy) -> Option<String> {
    if let Some(unit) = &meter.unit {
        return Some(unit.clone());
    }

    [taxonomy.unit_for(&meter.meter_type), taxonomy.default_unit(category)]
        .into_iter()
        .find(|u| !u.is_empty())
        .map(str::to_string)
}
