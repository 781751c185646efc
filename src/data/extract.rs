//! Snapshot → observations.

use std::borrow::Cow;

use crate::domain::{Observation, Snapshot};
use crate::error::RatesError;

/// Replace the first comma with a period.
///
/// Textual only: `"1,234,5"` becomes `"1.234,5"` and is left for the float
/// parser to reject.
pub fn normalize_decimal(raw: &str) -> Cow<'_, str> {
    match raw.find(',') {
        Some(idx) => Cow::Owned(format!("{}.{}", &raw[..idx], &raw[idx + 1..])),
        None => Cow::Borrowed(raw),
    }
}

/// Rates are finite and non-negative; `NaN`, `inf` and negatives are rejected.
pub fn parse_value(code: &str, raw: &str) -> Result<f64, RatesError> {
    normalize_decimal(raw)
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| RatesError::ValueParse {
            code: code.to_string(),
            raw: raw.to_string(),
        })
}

/// One observation per record, dated with the snapshot date.
pub fn extract(snapshot: &Snapshot) -> Result<Vec<Observation>, RatesError> {
    snapshot
        .entries
        .iter()
        .map(|record| {
            let value = parse_value(&record.char_code, &record.value)?;
            Ok(Observation::new(record.char_code.clone(), value, snapshot.date))
        })
        .collect()
}
