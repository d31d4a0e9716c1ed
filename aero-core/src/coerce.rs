//! Lenient numeric coercion and alias lookup over provider records.
//!
//! Providers disagree on field names and on whether numbers arrive as JSON
//! numbers or strings. Everything here returns `None` instead of failing.

use serde_json::Value;

use crate::types::RawReport;

/// Best-effort float from a JSON value.
///
/// Numbers convert directly, strings are trimmed and parsed. Anything else,
/// including NaN/inf results, is `None`.
pub fn to_float(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

/// Integer via [`to_float`], truncated toward zero (`"12.0"` → 12).
pub fn to_int(value: &Value) -> Option<i64> {
    to_float(value).map(|f| f.trunc() as i64)
}

/// Value of the first key in `keys` present in `record` with a non-null value.
///
/// Key order is priority order when several aliases coexist.
pub fn first_present<'a>(record: &'a RawReport, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| !v.is_null())
}

/// [`to_float`] over the first present alias.
pub fn float_field(record: &RawReport, keys: &[&str]) -> Option<f64> {
    first_present(record, keys).and_then(to_float)
}

/// [`to_int`] over the first present alias.
pub fn int_field(record: &RawReport, keys: &[&str]) -> Option<i64> {
    first_present(record, keys).and_then(to_int)
}

/// Round to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
