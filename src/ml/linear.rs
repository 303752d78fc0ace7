//! Ordinary least squares fit of a target against a single feature.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{metrics, Regressor};
use crate::domain::ModelKind;
use crate::error::{ForecastError, Result};

/// Fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// R² over the training set.
    pub r2: f64,
}

/// Closed-form simple linear regression.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimpleLinearRegressor {
    fit: Option<LinearFit>,
}

impl SimpleLinearRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fitted(&self) -> Option<&LinearFit> {
        self.fit.as_ref()
    }

    pub fn slope(&self) -> Result<f64> {
        self.params().map(|p| p.slope)
    }

    pub fn intercept(&self) -> Result<f64> {
        self.params().map(|p| p.intercept)
    }

    fn params(&self) -> Result<&LinearFit> {
        self.fit.as_ref().ok_or(ForecastError::ModelNotFitted)
    }

    /// Slope and intercept from the sums of x, y, xy and x².
    pub(crate) fn solve(x: &[f64], y: &[f64]) -> Result<(f64, f64)> {
        check_training_shape(x, y)?;

        let n = x.len() as f64;
        let sum_x: f64 = x.iter().sum();
        let sum_y: f64 = y.iter().sum();
        let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
        let sum_xx: f64 = x.iter().map(|a| a * a).sum();

        let denominator = n * sum_xx - sum_x * sum_x;
        if denominator.abs() <= f64::EPSILON * (n * sum_xx).abs().max(1.0) {
            return Err(ForecastError::DegenerateInput(
                "all x values are identical".to_string(),
            ));
        }

        let slope = (n * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n;
        Ok((slope, intercept))
    }
}

pub(crate) fn check_training_shape(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(ForecastError::DimensionMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(ForecastError::DegenerateInput(format!(
            "need at least 2 points, got {}",
            x.len()
        )));
    }
    Ok(())
}

impl Regressor for SimpleLinearRegressor {
    fn fit(&mut self, x: &[f64], y: &[f64]) -> Result<()> {
        let (slope, intercept) = Self::solve(x, y)?;
        let predictions: Vec<f64> = x.iter().map(|v| slope * v + intercept).collect();
        let r2 = metrics::r_squared(y, &predictions)?;

        debug!(slope, intercept, r2, samples = x.len(), "linear fit");
        self.fit = Some(LinearFit {
            slope,
            intercept,
            r2,
        });
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> Result<Vec<f64>> {
        let p = self.params()?;
        Ok(x.iter().map(|v| p.slope * v + p.intercept).collect())
    }

    fn r2(&self) -> Result<f64> {
        self.params().map(|p| p.r2)
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Linear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_line() {
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 3.0).collect();

        let mut model = SimpleLinearRegressor::new();
        model.fit(&x, &y).unwrap();

        assert!((model.slope().unwrap() - 2.0).abs() < 1e-9);
        assert!((model.intercept().unwrap() - 3.0).abs() < 1e-9);
        assert!((model.r2().unwrap() - 1.0).abs() < 1e-9);

        let predicted = model.predict(&[4.0, 10.0]).unwrap();
        assert!((predicted[0] - 11.0).abs() < 1e-9);
        assert!((predicted[1] - 23.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_target() {
        let mut model = SimpleLinearRegressor::new();
        model.fit(&[0.0, 1.0, 2.0, 3.0], &[5.0, 5.0, 5.0, 5.0]).unwrap();

        assert!(model.slope().unwrap().abs() < 1e-12);
        assert!((model.intercept().unwrap() - 5.0).abs() < 1e-12);
        assert_eq!(model.r2().unwrap(), 1.0);
    }

    #[test]
    fn test_noisy_fit_scores_below_one() {
        let mut model = SimpleLinearRegressor::new();
        model
            .fit(&[0.0, 1.0, 2.0, 3.0, 4.0], &[1.0, 3.2, 4.8, 7.1, 9.0])
            .unwrap();
        let r2 = model.r2().unwrap();
        assert!(r2 > 0.95 && r2 < 1.0);
        assert!((model.slope().unwrap() - 1.99).abs() < 0.05);
    }

    #[test]
    fn test_identical_x_is_degenerate() {
        let mut model = SimpleLinearRegressor::new();
        let result = model.fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(ForecastError::DegenerateInput(_))));
        assert!(model.fitted().is_none());
    }

    #[test]
    fn test_shape_errors() {
        let mut model = SimpleLinearRegressor::new();
        assert!(matches!(
            model.fit(&[0.0, 1.0], &[1.0]),
            Err(ForecastError::DimensionMismatch { x: 2, y: 1 })
        ));
        assert!(matches!(
            model.fit(&[0.0], &[1.0]),
            Err(ForecastError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_predict_before_fit() {
        let model = SimpleLinearRegressor::new();
        assert_eq!(model.predict(&[1.0]), Err(ForecastError::ModelNotFitted));
        assert_eq!(model.r2(), Err(ForecastError::ModelNotFitted));
    }
}
