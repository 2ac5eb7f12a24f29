//! Consumption reconstruction and report aggregation.
//!
//! readings -> [`index`] -> [`series`] -> [`consumption`] -> [`rows`] ->
//! [`totals`] -> [`encoder`]. Everything here is synchronous and pure apart
//! from logging and metrics.

pub mod consumption;
pub mod encoder;
pub mod format;
pub mod index;
pub mod rows;
pub mod series;
pub mod summary;
pub mod taxonomy;
pub mod totals;

pub use consumption::{compute_cells, MeterCells, MonthlyCell};
pub use encoder::{encode, report_filename, CONTENT_TYPE};
pub use index::{build_index, ReadingIndex};
pub use rows::{build_rows, FacilityBatch, ReportRow};
pub use series::{reconstruct, Bucket, ReportPeriod};
pub use summary::ReportSummary;
pub use taxonomy::{unit_for, Category, Taxonomy, UnknownCategory};
pub use totals::{compute_totals, TotalsRow};
