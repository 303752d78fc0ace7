//! Goodness-of-fit and spread statistics shared by the regressors and the
//! forecast engine.

use crate::error::{ForecastError, Result};

const VARIANCE_EPSILON: f64 = 1e-10;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// A constant target has `SS_tot == 0`; that scores 1 when the predictions
/// reproduce it exactly and 0 otherwise. The result is not clamped and can be
/// negative for fits worse than the mean.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            x: predicted.len(),
            y: actual.len(),
        });
    }
    if actual.is_empty() {
        return Err(ForecastError::DegenerateInput(
            "cannot score an empty series".to_string(),
        ));
    }

    let mean_actual = mean(actual);
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    if ss_tot.abs() < VARIANCE_EPSILON {
        Ok(if ss_res.abs() < VARIANCE_EPSILON { 1.0 } else { 0.0 })
    } else {
        Ok(1.0 - ss_res / ss_tot)
    }
}
