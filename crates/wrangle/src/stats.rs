//! Statistical helpers over columns with missing values.
//!
//! Columns are slices of `Option<f64>` where `None` marks a missing cell.
//! These are the building blocks for [`crate::stock::StockSummary`].

use crate::error::{AnalysisError, Result};

/// Round `value` to `places` decimal places (half away from zero).
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Iterate over the present values of a column.
fn present(values: &[Option<f64>]) -> impl Iterator<Item = f64> + '_ {
    values.iter().flatten().copied()
}

/// Average of the present values, rounded to the hundredths place.
///
/// Missing values are skipped and do not count towards the divisor.
pub fn average(values: &[Option<f64>]) -> Result<f64> {
    let (total, count) = present(values).fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 {
        return Err(AnalysisError::NoValidValues("list".to_string()));
    }
    Ok(round_to(total / count as f64, 2))
}

/// Replace every missing value with [`average`] of the present ones.
pub fn fill_missing(values: &[Option<f64>]) -> Result<Vec<f64>> {
    let avg = average(values)?;
    Ok(values.iter().map(|v| v.unwrap_or(avg)).collect())
}

/// Absolute difference of each pair across two columns.
///
/// Only the zipped prefix is used, so the result is as long as the shorter
/// input. A pair with a missing side gives a missing result.
pub fn subtract_value_pairs(first: &[Option<f64>], second: &[Option<f64>]) -> Vec<Option<f64>> {
    first
        .iter()
        .zip(second)
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => Some((a - b).abs()),
            _ => None,
        })
        .collect()
}

/// Absolute change between each value and the one before it.
///
/// The result has one element fewer than the input; a change touching a
/// missing value is missing.
pub fn consecutive_changes(values: &[Option<f64>]) -> Vec<Option<f64>> {
    values
        .windows(2)
        .map(|pair| match (pair[0], pair[1]) {
            (Some(prev), Some(next)) => Some((next - prev).abs()),
            _ => None,
        })
        .collect()
}

/// Median of the present values.
///
/// Odd counts return the middle element, even counts the mean of the two
/// middle elements.
pub fn median(values: &[Option<f64>]) -> Result<f64> {
    let mut sorted: Vec<f64> = present(values).collect();
    if sorted.is_empty() {
        return Err(AnalysisError::NoValidValues("list".to_string()));
    }
    sorted.sort_by(f64::total_cmp);

    let len = sorted.len();
    let index = (len - 1) / 2;
    if len % 2 == 1 {
        Ok(sorted[index])
    } else {
        Ok((sorted[index] + sorted[index + 1]) / 2.0)
    }
}

/// Largest present value.
pub fn max_value(values: &[Option<f64>]) -> Result<f64> {
    present(values)
        .reduce(f64::max)
        .ok_or_else(|| AnalysisError::NoValidValues("list".to_string()))
}

/// Smallest present value.
pub fn min_value(values: &[Option<f64>]) -> Result<f64> {
    present(values)
        .reduce(f64::min)
        .ok_or_else(|| AnalysisError::NoValidValues("list".to_string()))
}

/// Wrap a dense column so it can go through the optional-value helpers.
pub fn as_present(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}
