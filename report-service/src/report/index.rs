use std::{
    cmp::Ordering,
    collections::{hash_map::Entry, HashMap},
};

use facility_client::domain::Reading;
use time::Month;

/// Readings bucketed by meter serial number and calendar month.
///
/// At most one reading is kept per (meter, month, year). When several
/// readings land in the same bucket a numeric reading always beats one
/// whose value could not be parsed. After that the highest `reading_id`
/// wins, readings with an id beat readings without one, and among readings
/// without an id the latest `reading_date` wins. Remaining ties keep the
/// reading seen first.
#[derive(Debug, Default)]
pub struct ReadingIndex<'a> {
    by_meter: HashMap<&'a str, HashMap<(i32, Month), &'a Reading>>,
    duplicates: usize,
}

/// `Greater` when `candidate` should replace `current` in a bucket.
fn precedence(candidate: &Reading, current: &Reading) -> Ordering {
    let numeric = candidate.value.is_some().cmp(&current.value.is_some());
    if numeric != Ordering::Equal {
        return numeric;
    }

    match (candidate.reading_id, current.reading_id) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => candidate.reading_date.cmp(&current.reading_date),
    }
}

impl<'a> ReadingIndex<'a> {
    pub fn build<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        let mut index = ReadingIndex::default();

        for reading in readings {
            let key = (reading.reading_date.year(), reading.reading_date.month());
            let buckets = index
                .by_meter
                .entry(reading.meter_serial_number.as_str())
                .or_default();

            match buckets.entry(key) {
                Entry::Occupied(mut slot) => {
                    index.duplicates += 1;
                    if precedence(reading, slot.get()) == Ordering::Greater {
                        slot.insert(reading);
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(reading);
                }
            }
        }

        if index.duplicates > 0 {
            tracing::debug!(
                duplicates = index.duplicates,
                "multiple readings share a meter month; kept one per bucket"
            );
        }

        index
    }

    pub fn lookup(&self, meter_serial: &str, month: Month, year: i32) -> Option<&'a Reading> {
        self.by_meter
            .get(meter_serial)
            .and_then(|buckets| buckets.get(&(year, month)))
            .copied()
    }

    /// Number of readings that collided with an already occupied bucket.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// Build a [`ReadingIndex`] over a slice of readings.
pub fn build_index(readings: &[Reading]) -> ReadingIndex<'_> {
    ReadingIndex::build(readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{macros::date, Date};

    fn reading(id: Option<i64>, serial: &str, value: f64, date: Date) -> Reading {
        Reading {
            reading_id: id,
            meter_serial_number: serial.to_string(),
            value: Some(value),
            reading_date: date,
            recorded_by: "tech@example.com".to_string(),
            unit: None,
        }
    }

    #[test]
    fn lookup_matches_month_and_year() {
        let readings = vec![
            reading(Some(1), "E-1", 1000.0, date!(2024 - 12 - 30)),
            reading(Some(2), "E-1", 1050.0, date!(2025 - 01 - 31)),
            reading(Some(3), "E-2", 7.0, date!(2025 - 01 - 02)),
        ];
        let index = build_index(&readings);

        assert_eq!(index.lookup("E-1", Month::December, 2024).map(|r| r.reading_id), Some(Some(1)));
        assert_eq!(index.lookup("E-1", Month::January, 2025).map(|r| r.reading_id), Some(Some(2)));
        assert_eq!(index.lookup("E-2", Month::January, 2025).map(|r| r.reading_id), Some(Some(3)));
        assert!(index.lookup("E-1", Month::December, 2025).is_none());
        assert!(index.lookup("E-1", Month::January, 2024).is_none());
        assert!(index.lookup("missing", Month::January, 2025).is_none());
        assert_eq!(index.duplicates(), 0);
    }

    #[test]
    fn highest_reading_id_wins_regardless_of_order() {
        let readings = vec![
            reading(Some(9), "E-1", 1090.0, date!(2025 - 03 - 01)),
            reading(Some(4), "E-1", 1040.0, date!(2025 - 03 - 28)),
            reading(None, "E-1", 1100.0, date!(2025 - 03 - 30)),
        ];
        let index = build_index(&readings);

        let picked = index.lookup("E-1", Month::March, 2025).unwrap();
        assert_eq!(picked.reading_id, Some(9));
        assert_eq!(index.duplicates(), 2);
    }

    #[test]
    fn latest_date_wins_without_ids() {
        let readings = vec![
            reading(None, "W-1", 10.0, date!(2025 - 02 - 20)),
            reading(None, "W-1", 12.0, date!(2025 - 02 - 27)),
            reading(None, "W-1", 11.0, date!(2025 - 02 - 27)),
        ];
        let index = build_index(&readings);

        let picked = index.lookup("W-1", Month::February, 2025).unwrap();
        assert_eq!(picked.value, Some(12.0));
    }

    #[test]
    fn numeric_reading_beats_unparseable_one_with_higher_id() {
        let mut broken = reading(Some(3), "E-1", 0.0, date!(2025 - 01 - 31));
        broken.value = None;
        let readings = vec![
            reading(Some(1), "E-1", 1000.0, date!(2024 - 12 - 31)),
            reading(Some(2), "E-1", 1050.0, date!(2025 - 01 - 15)),
            broken,
        ];
        let index = build_index(&readings);

        let picked = index.lookup("E-1", Month::January, 2025).unwrap();
        assert_eq!(picked.reading_id, Some(2));
        assert_eq!(picked.value, Some(1050.0));
        assert_eq!(index.duplicates(), 1);
    }

    #[test]
    fn unparseable_reading_still_fills_an_otherwise_empty_bucket() {
        let mut broken = reading(Some(5), "E-1", 0.0, date!(2025 - 04 - 02));
        broken.value = None;
        let readings = vec![broken];
        let index = build_index(&readings);

        let picked = index.lookup("E-1", Month::April, 2025).unwrap();
        assert_eq!(picked.value, None);
    }
}
