//! Brazilian decimal notation: `.` groups thousands, `,` separates decimals.

use rust_decimal::{Decimal, RoundingStrategy};

/// Parse an amount such as `1.234,56`.
///
/// Empty or non-numeric text is treated as zero, a single bad cell never
/// fails the load. A well-formed number beyond the [`Decimal`] range is an
/// error instead of a silent zero.
pub fn parse(text: &str) -> Result<Decimal, rust_decimal::Error> {
    let normalized = text.trim().replace('.', "").replace(',', ".");

    match normalized.parse() {
        Ok(amount) => Ok(amount),
        Err(err) if is_number(&normalized) => Err(err),
        Err(_) => Ok(Decimal::ZERO),
    }
}

fn is_number(text: &str) -> bool {
    let unsigned = text
        .strip_prefix(|c: char| c == '-' || c == '+')
        .unwrap_or(text);
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    !(integer.is_empty() && fraction.is_empty())
        && integer.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit())
}

/// Render an amount with two decimals and a decimal comma, without
/// thousands separators (`1234,56`).
///
/// Midpoints round away from zero on the exact value, so `2.675` renders
/// `2,68` where float formatting of the same text would give `2,67`.
pub fn format(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // -0.004 rounds to a negative zero
    let rounded = if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    };

    format!("{rounded:.2}").replace('.', ",")
}
