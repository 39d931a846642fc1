//! Descriptive statistics and error metrics

use crate::{MathError, Result};
use std::fmt;

/// Arithmetic mean of a non-empty slice
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the mean of an empty slice".to_string(),
        ));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample quantile of sorted data, linearly interpolated between order
/// statistics (Hyndman & Fan type 7)
pub fn quantile(sorted: &[f64], p: f64) -> Result<f64> {
    if sorted.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take a quantile of an empty slice".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(MathError::InvalidInput(format!(
            "Quantile probability must be in [0, 1], got {}",
            p
        )));
    }

    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Ok(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Mean absolute error between actual and predicted values
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_pairs(actual, predicted)?;
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(total / actual.len() as f64)
}

/// Root mean squared error between actual and predicted values
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_pairs(actual, predicted)?;
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok((total / actual.len() as f64).sqrt())
}

fn check_pairs(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(MathError::InvalidInput(
            "Actual and predicted values must have the same non-zero length".to_string(),
        ));
    }
    Ok(())
}

/// Five-number summary plus the mean
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub mean: f64,
    pub q3: f64,
    pub max: f64,
}

impl Summary {
    /// Display labels, in the order of [`Summary::as_array`]
    pub const LABELS: [&str; 6] = ["Min.", "1st Qu.", "Median", "Mean", "3rd Qu.", "Max."];

    /// Summarise a slice of finite values
    pub fn from_values(values: &[f64]) -> Result<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Summary input contains non-finite values".to_string(),
            ));
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Ok(Self {
            min: quantile(&sorted, 0.0)?,
            q1: quantile(&sorted, 0.25)?,
            median: quantile(&sorted, 0.5)?,
            mean: mean(&sorted)?,
            q3: quantile(&sorted, 0.75)?,
            max: quantile(&sorted, 1.0)?,
        })
    }

    /// Values in display order: min, Q1, median, mean, Q3, max
    pub fn as_array(&self) -> [f64; 6] {
        [self.min, self.q1, self.median, self.mean, self.q3, self.max]
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in Self::LABELS {
            write!(f, "{:>12}", label)?;
        }
        writeln!(f)?;
        for value in self.as_array() {
            write!(f, "{:>12.1}", value)?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(quantile(&sorted, 0.0).unwrap(), 1.0);
        assert_relative_eq!(quantile(&sorted, 0.25).unwrap(), 1.75);
        assert_relative_eq!(quantile(&sorted, 0.5).unwrap(), 2.5);
        assert_relative_eq!(quantile(&sorted, 1.0).unwrap(), 4.0);
        assert!(quantile(&sorted, 1.5).is_err());
        assert!(quantile(&[], 0.5).is_err());
    }

    #[test]
    fn test_summary_of_unsorted_values() {
        let summary = Summary::from_values(&[9.0, 1.0, 5.0, 3.0, 7.0]).unwrap();

        assert_relative_eq!(summary.min, 1.0);
        assert_relative_eq!(summary.q1, 3.0);
        assert_relative_eq!(summary.median, 5.0);
        assert_relative_eq!(summary.mean, 5.0);
        assert_relative_eq!(summary.q3, 7.0);
        assert_relative_eq!(summary.max, 9.0);

        let rendered = summary.to_string();
        assert!(rendered.contains("1st Qu."));
        assert!(rendered.contains("9.0"));
    }

    #[test]
    fn test_summary_rejects_bad_input() {
        assert!(Summary::from_values(&[]).is_err());
        assert!(Summary::from_values(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_error_metrics() {
        let actual = [10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = [12.0, 18.0, 33.0, 37.0, 52.0];

        assert_relative_eq!(mean_absolute_error(&actual, &predicted).unwrap(), 2.4);
        assert_relative_eq!(
            root_mean_squared_error(&actual, &predicted).unwrap(),
            (30.0f64 / 5.0).sqrt()
        );
        assert_relative_eq!(mean_absolute_error(&actual, &actual).unwrap(), 0.0);

        assert!(mean_absolute_error(&actual, &predicted[..3]).is_err());
        assert!(mean_absolute_error(&[], &[]).is_err());
    }
}
