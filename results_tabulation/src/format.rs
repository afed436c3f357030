//! Percentages and number formatting.
//!
//! Percentages of two counts are rounded with exact integer arithmetic (round half to
//! even), so the same counts always print the same way.

use std::cmp::Ordering;

use crate::model::Count;

/// Displayed in place of a percentage whose denominator is zero.
pub const UNDEFINED_PERCENT: &str = "—";

/// Number of decimals used when displaying a percentage.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum Precision {
    Whole,
    One,
    #[default]
    Two,
}

impl Precision {
    pub fn decimals(&self) -> u32 {
        match self {
            Precision::Whole => 0,
            Precision::One => 1,
            Precision::Two => 2,
        }
    }

    pub fn from_decimals(decimals: u32) -> Option<Precision> {
        match decimals {
            0 => Some(Precision::Whole),
            1 => Some(Precision::One),
            2 => Some(Precision::Two),
            _ => None,
        }
    }
}

/// The ratio `numer / denom` as a percentage, or None when the denominator is zero.
///
/// Not clamped: the votes of a choice may exceed the ballots of a contest where one can
/// vote for several choices, and the percentage is then above 100.
pub fn percent(numer: Count, denom: Count) -> Option<f64> {
    if denom == 0 {
        return None;
    }
    if numer == denom {
        return Some(100.0);
    }
    Some(numer as f64 * 100.0 / denom as f64)
}

// The percentage multiplied by 10^decimals, rounded half to even.
fn scaled_percent(numer: Count, denom: Count, decimals: u32) -> u128 {
    let n = numer as u128 * 100 * 10u128.pow(decimals);
    let d = denom as u128;
    let (q, r) = (n / d, n % d);
    match (2 * r).cmp(&d) {
        Ordering::Less => q,
        Ordering::Greater => q + 1,
        Ordering::Equal if q % 2 == 0 => q,
        Ordering::Equal => q + 1,
    }
}

/// The percentage rounded at the given precision.
pub fn rounded_percent(numer: Count, denom: Count, precision: Precision) -> Option<f64> {
    if denom == 0 {
        return None;
    }
    let decimals = precision.decimals();
    Some(scaled_percent(numer, denom, decimals) as f64 / 10f64.powi(decimals as i32))
}

/// Formats `numer / denom` as a percentage, e.g. `"40.00%"`.
pub fn format_percent(numer: Count, denom: Count, precision: Precision) -> String {
    if denom == 0 {
        return UNDEFINED_PERCENT.to_string();
    }
    let decimals = precision.decimals();
    let scaled = scaled_percent(numer, denom, decimals);
    if decimals == 0 {
        return format!("{}%", scaled);
    }
    let unit = 10u128.pow(decimals);
    format!(
        "{}.{:0width$}%",
        scaled / unit,
        scaled % unit,
        width = decimals as usize
    )
}

/// Formats a percentage that was already computed (for example the RCV scale).
pub fn format_percent_value(value: Option<f64>, precision: Precision) -> String {
    match value {
        Some(v) => format!("{:.*}%", precision.decimals() as usize, v),
        None => UNDEFINED_PERCENT.to_string(),
    }
}

/// Formats a count with thousands separators: `9999` becomes `"9,999"`.
pub fn format_count(count: Count) -> String {
    let digits = count.to_string();
    let mut res = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            res.push(',');
        }
        res.push(ch);
    }
    res
}
