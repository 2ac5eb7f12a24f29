//! Polish number formatting for report cells.
//!
//! Decimal comma, digits grouped in threes with a no-break space, but only
//! once the integer part reaches five digits (`1050`, `12 500`).

/// Placeholder for an absent value.
pub const ABSENT: &str = "-";

const GROUP_SEPARATOR: char = '\u{a0}';
const MIN_GROUPING_DIGITS: usize = 5;
const MAX_READING_FRACTION_DIGITS: usize = 3;
const USAGE_FRACTION_DIGITS: usize = 2;

/// Raw meter value: up to three fraction digits, trailing zeros dropped.
pub fn format_reading(value: f64) -> String {
    format_decimal(value, MAX_READING_FRACTION_DIGITS, true)
}

/// Consumption or total: always two fraction digits.
pub fn format_usage(value: f64) -> String {
    format_decimal(value, USAGE_FRACTION_DIGITS, false)
}

pub fn format_optional(value: Option<f64>, f: fn(f64) -> String) -> String {
    match value {
        Some(v) => f(v),
        None => ABSENT.to_string(),
    }
}

fn format_decimal(value: f64, fraction_digits: usize, trim_zeros: bool) -> String {
    let rendered = format!("{:.*}", fraction_digits, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, f),
        None => (rendered.as_str(), ""),
    };

    let frac_part = if trim_zeros {
        frac_part.trim_end_matches('0')
    } else {
        frac_part
    };

    let rounds_to_zero = int_part.bytes().all(|b| b == b'0') && frac_part.bytes().all(|b| b == b'0');

    let mut out = String::with_capacity(rendered.len() + 4);
    if value.is_sign_negative() && !rounds_to_zero {
        out.push('-');
    }
    push_grouped(int_part, &mut out);
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    }
    out
}

fn push_grouped(digits: &str, out: &mut String) {
    if digits.len() < MIN_GROUPING_DIGITS {
        out.push_str(digits);
        return;
    }

    let lead = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_drop_trailing_zeros() {
        assert_eq!(format_reading(1000.0), "1000");
        assert_eq!(format_reading(1050.5), "1050,5");
        assert_eq!(format_reading(3.14159), "3,142");
        assert_eq!(format_reading(0.0), "0");
    }

    #[test]
    fn usage_always_has_two_fraction_digits() {
        assert_eq!(format_usage(50.0), "50,00");
        assert_eq!(format_usage(80.456), "80,46");
        assert_eq!(format_usage(-12.5), "-12,50");
        assert_eq!(format_usage(-0.001), "0,00");
    }

    #[test]
    fn grouping_starts_at_five_digits() {
        assert_eq!(format_reading(9999.0), "9999");
        assert_eq!(format_reading(12500.0), "12\u{a0}500");
        assert_eq!(format_reading(1234567.25), "1\u{a0}234\u{a0}567,25");
        assert_eq!(format_usage(-100000.0), "-100\u{a0}000,00");
    }

    #[test]
    fn absent_renders_as_dash() {
        assert_eq!(format_optional(None, format_usage), "-");
        assert_eq!(format_optional(Some(1.0), format_usage), "1,00");
    }
}
