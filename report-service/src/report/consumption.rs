use super::series::Series;

/// Reading shown for a month and the consumption since the previous
/// present reading. `None` means absent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonthlyCell {
    pub displayed_value: Option<f64>,
    pub usage: Option<f64>,
}

/// Cells computed for one meter: the anchor (never carries usage) and the
/// twelve report months.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterCells {
    pub anchor: MonthlyCell,
    pub months: [MonthlyCell; 12],
}

/// Turn a raw series into displayed values and usages.
///
/// Usage is the difference against the last present value, which may be
/// several months back. Absent months leave that baseline untouched.
pub fn compute_cells(series: &Series<'_>) -> MeterCells {
    let value_at = |i: usize| series[i].1.and_then(|r| r.value);

    let anchor_value = value_at(0);
    let mut carry = anchor_value;
    let mut cells = MeterCells {
        anchor: MonthlyCell {
            displayed_value: anchor_value,
            usage: None,
        },
        ..MeterCells::default()
    };

    for (i, cell) in cells.months.iter_mut().enumerate() {
        let displayed_value = value_at(i + 1);
        let usage = match (displayed_value, carry) {
            (Some(current), Some(previous)) => Some(current - previous),
            _ => None,
        };

        *cell = MonthlyCell {
            displayed_value,
            usage,
        };

        if displayed_value.is_some() {
            carry = displayed_value;
        }
    }

    cells
}
