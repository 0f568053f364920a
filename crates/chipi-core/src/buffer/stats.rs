//! Numeric and comparison reductions over a series.
//!
//! These back both the [`Buffer`](super::Buffer) convenience methods and the
//! built-in derived accessors.

use std::cmp::Ordering;

use chipi_common::types::Value;
use chipi_common::utils::error::{Error, Result};

use super::accessor::Series;

/// Arithmetic mean as `Float64`.
pub fn mean(series: &Series<'_>) -> Result<Value> {
    series.require_non_empty()?;
    let mut sum = 0.0;
    for value in series.iter() {
        sum += value.to_f64()?;
    }
    Ok(Value::Float64(sum / series.len() as f64))
}

/// Smallest value.
pub fn min_value(series: &Series<'_>) -> Result<Value> {
    extreme(series, Ordering::Less)
}

/// Largest value.
pub fn max_value(series: &Series<'_>) -> Result<Value> {
    extreme(series, Ordering::Greater)
}

fn extreme(series: &Series<'_>, wanted: Ordering) -> Result<Value> {
    let (first, rest) = series.split_first().ok_or_else(|| Error::EmptyBuffer {
        label: series.label().to_string(),
    })?;

    let mut best = first;
    for value in rest {
        if compare(value, best)? == wanted {
            best = value;
        }
    }
    Ok(best.clone())
}

/// Current value minus previous value.
pub fn delta(series: &Series<'_>) -> Result<Value> {
    let current = series.current()?;
    let previous = series.previous()?;
    current.checked_sub(previous)
}

/// Distinct values in first-seen order.
///
/// `Value` is not hashable (floats), so this is quadratic in the number of
/// distinct values.
pub fn unique(series: &Series<'_>) -> Vec<Value> {
    let mut seen: Vec<Value> = Vec::new();
    for value in series.iter() {
        if !seen.contains(value) {
            seen.push(value.clone());
        }
    }
    seen
}

/// Compares two values, failing on incomparable variants.
pub(crate) fn compare(a: &Value, b: &Value) -> Result<Ordering> {
    a.partial_compare(b).ok_or_else(|| {
        Error::type_mismatch(
            format!("a value comparable with {}", b.type_name()),
            a.type_name(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_of(values: &[Value]) -> Series<'_> {
        Series::new("s", values)
    }

    #[test]
    fn test_mean() {
        let data = vec![Value::from(3), Value::from(2), Value::from(1)];
        assert_eq!(mean(&series_of(&data)).unwrap(), Value::Float64(2.0));

        let mixed = vec![Value::from(1), Value::from(2.0)];
        assert_eq!(mean(&series_of(&mixed)).unwrap(), Value::Float64(1.5));
    }

    #[test]
    fn test_mean_errors() {
        assert!(matches!(
            mean(&series_of(&[])),
            Err(Error::EmptyBuffer { .. })
        ));
        let strings = vec![Value::from("a")];
        assert!(matches!(
            mean(&series_of(&strings)),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_min_max() {
        let data = vec![Value::from(3), Value::from(2.5), Value::from(1)];
        assert_eq!(min_value(&series_of(&data)).unwrap(), Value::from(1));
        assert_eq!(max_value(&series_of(&data)).unwrap(), Value::from(3));

        let words = vec![Value::from("pear"), Value::from("apple")];
        assert_eq!(min_value(&series_of(&words)).unwrap(), Value::from("apple"));

        let mixed = vec![Value::from("pear"), Value::from(1)];
        assert!(matches!(
            max_value(&series_of(&mixed)),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_min_keeps_first_of_equals() {
        let data = vec![Value::from(1), Value::from(1.0)];
        assert_eq!(min_value(&series_of(&data)).unwrap(), Value::from(1));
    }

    #[test]
    fn test_delta() {
        let data = vec![Value::from(1), Value::from(3)];
        assert_eq!(delta(&series_of(&data)).unwrap(), Value::from(2));

        let one = vec![Value::from(1)];
        assert!(matches!(
            delta(&series_of(&one)),
            Err(Error::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn test_unique() {
        let data: Vec<Value> = [1, 1, 2, 2, 3, 3, 3].into_iter().map(Value::from).collect();
        assert_eq!(
            unique(&series_of(&data)),
            vec![Value::from(1), Value::from(2), Value::from(3)]
        );
    }
}
