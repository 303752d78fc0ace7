//! Bootstrap ensemble of linear fits.
//!
//! Each member is an ordinary least squares line trained on a resample of the
//! training set drawn with replacement; predictions are the unweighted mean
//! of the members. Randomness comes from an owned, seedable generator so that
//! tests and repeated runs can pin the draws.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::linear::{check_training_shape, SimpleLinearRegressor};
use super::{metrics, Regressor};
use crate::domain::ModelKind;
use crate::error::{ForecastError, Result};

/// Default ensemble size.
pub const DEFAULT_TREE_COUNT: usize = 5;

/// Resamples that happen to contain a single distinct x value are redrawn up
/// to this many times per member.
const MAX_RESAMPLE_ATTEMPTS: usize = 64;

#[derive(Debug, Clone)]
pub struct BootstrapEnsembleRegressor {
    tree_count: usize,
    rng: StdRng,
    members: Vec<SimpleLinearRegressor>,
    r2: Option<f64>,
}

impl BootstrapEnsembleRegressor {
    /// Ensemble seeded from the operating system.
    pub fn new(tree_count: usize) -> Self {
        Self::with_rng(tree_count, StdRng::from_entropy())
    }

    /// Ensemble whose draws are fully determined by `seed`.
    pub fn with_seed(tree_count: usize, seed: u64) -> Self {
        Self::with_rng(tree_count, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(tree_count: usize, rng: StdRng) -> Self {
        Self {
            tree_count,
            rng,
            members: Vec::new(),
            r2: None,
        }
    }

    pub fn tree_count(&self) -> usize {
        self.tree_count
    }

    pub fn members(&self) -> &[SimpleLinearRegressor] {
        &self.members
    }

    fn fit_member(&mut self, x: &[f64], y: &[f64]) -> Result<SimpleLinearRegressor> {
        let n = x.len();
        for attempt in 0..MAX_RESAMPLE_ATTEMPTS {
            let indices: Vec<usize> = (0..n).map(|_| self.rng.gen_range(0..n)).collect();
            let boot_x: Vec<f64> = indices.iter().map(|&i| x[i]).collect();
            let boot_y: Vec<f64> = indices.iter().map(|&i| y[i]).collect();

            let mut member = SimpleLinearRegressor::new();
            match member.fit(&boot_x, &boot_y) {
                Ok(()) => return Ok(member),
                Err(ForecastError::DegenerateInput(_)) => {
                    debug!(attempt, "degenerate bootstrap resample, redrawing");
                }
                Err(e) => return Err(e),
            }
        }
        Err(ForecastError::DegenerateInput(format!(
            "no usable bootstrap resample after {} attempts",
            MAX_RESAMPLE_ATTEMPTS
        )))
    }

    fn averaged(members: &[SimpleLinearRegressor], x: &[f64]) -> Result<Vec<f64>> {
        let mut sums = vec![0.0; x.len()];
        for member in members {
            for (sum, p) in sums.iter_mut().zip(member.predict(x)?) {
                *sum += p;
            }
        }
        let count = members.len() as f64;
        Ok(sums.into_iter().map(|s| s / count).collect())
    }
}

impl Regressor for BootstrapEnsembleRegressor {
    fn fit(&mut self, x: &[f64], y: &[f64]) -> Result<()> {
        check_training_shape(x, y)?;
        if self.tree_count == 0 {
            return Err(ForecastError::DegenerateInput(
                "ensemble needs at least one member".to_string(),
            ));
        }
        if x.iter().all(|v| *v == x[0]) {
            return Err(ForecastError::DegenerateInput(
                "all x values are identical".to_string(),
            ));
        }

        let mut members = Vec::with_capacity(self.tree_count);
        for _ in 0..self.tree_count {
            members.push(self.fit_member(x, y)?);
        }

        let predictions = Self::averaged(&members, x)?;
        let r2 = metrics::r_squared(y, &predictions)?.max(0.0);

        debug!(members = members.len(), r2, samples = x.len(), "bootstrap ensemble fit");
        self.members = members;
        self.r2 = Some(r2);
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> Result<Vec<f64>> {
        if self.members.is_empty() {
            return Err(ForecastError::ModelNotFitted);
        }
        Self::averaged(&self.members, x)
    }

    fn r2(&self) -> Result<f64> {
        self.r2.ok_or(ForecastError::ModelNotFitted)
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Ensemble
    }
}
