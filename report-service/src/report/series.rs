use facility_client::domain::{Meter, Reading};
use time::Month;

use super::index::ReadingIndex;

/// Anchor month plus twelve report months.
pub const SERIES_LEN: usize = 13;

/// One calendar month of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub year: i32,
    pub month: Month,
}

/// December of the previous year followed by January..December of the
/// report year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    year: i32,
}

impl ReportPeriod {
    /// The period all reports are currently generated for.
    pub const CURRENT: ReportPeriod = ReportPeriod { year: 2025 };

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn anchor(&self) -> Bucket {
        Bucket {
            year: self.year - 1,
            month: Month::December,
        }
    }

    /// All buckets in chronological order, anchor first.
    pub fn buckets(&self) -> [Bucket; SERIES_LEN] {
        let mut out = [self.anchor(); SERIES_LEN];
        let mut month = Month::January;
        for slot in out.iter_mut().skip(1) {
            *slot = Bucket {
                year: self.year,
                month,
            };
            month = month.next();
        }
        out
    }
}

impl Default for ReportPeriod {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// Raw readings (or their absence) for one meter, bucket by bucket.
pub type Series<'a> = [(Bucket, Option<&'a Reading>); SERIES_LEN];

/// Place the meter's readings into the period's buckets. Nothing is
/// interpolated; a missing reading stays missing.
pub fn reconstruct<'a>(meter: &Meter, index: &ReadingIndex<'a>, period: &ReportPeriod) -> Series<'a> {
    period.buckets().map(|bucket| {
        let reading = index.lookup(&meter.serial_number, bucket.month, bucket.year);
        (bucket, reading)
    })
}
