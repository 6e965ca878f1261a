//! Per-parameter urgency: distance of a reading from the middle of its
//! normal range, normalized by the range width and saturated at 2.0.

use vitalroute_core::NormalRange;

/// Upper bound of every urgency value.
pub const MAX_URGENCY: f64 = 2.0;

/// `|(ub - v)^2 - (lb - v)^2| / (ub - lb)^2`, capped at [`MAX_URGENCY`].
///
/// Zero exactly at the midpoint of `[lower, upper]`, symmetric about it.
///
/// # Panics
/// Panics if `lower >= upper`. Ranges come from validated configuration.
pub fn urgency(value: f64, lower: f64, upper: f64) -> f64 {
    assert!(
        lower < upper,
        "urgency: lower bound {} must be below upper bound {}",
        lower,
        upper
    );
    let width = upper - lower;
    let raw = ((upper - value).powi(2) - (lower - value).powi(2)).abs() / (width * width);
    raw.min(MAX_URGENCY)
}

/// [`urgency`] against a validated range.
pub fn range_urgency(value: f64, range: &NormalRange) -> f64 {
    urgency(value, range.lower(), range.upper())
}
