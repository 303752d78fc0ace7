//! Regression models used by the forecast engine.
//!
//! Both model families regress a target series against a single feature (the
//! ordinal time index) and share the [`Regressor`] interface so the engine can
//! pick one at request time.

use rand::rngs::StdRng;

use crate::domain::ModelKind;
use crate::error::Result;

pub mod ensemble;
pub mod linear;
pub mod metrics;

pub use ensemble::BootstrapEnsembleRegressor;
pub use linear::{LinearFit, SimpleLinearRegressor};

/// Single-feature regression model.
///
/// A model is fitted once and then queried; calling `predict` or `r2` before
/// a successful `fit` yields [`crate::ForecastError::ModelNotFitted`].
pub trait Regressor: Send + Sync {
    fn fit(&mut self, x: &[f64], y: &[f64]) -> Result<()>;

    fn predict(&self, x: &[f64]) -> Result<Vec<f64>>;

    /// Goodness of fit over the training set.
    fn r2(&self) -> Result<f64>;

    fn kind(&self) -> ModelKind;
}

/// Fresh, unfitted model of the requested family. `rng` is only consumed by
/// the ensemble.
pub fn new_regressor(kind: ModelKind, tree_count: usize, rng: StdRng) -> Box<dyn Regressor> {
    match kind {
        ModelKind::Linear => Box::new(SimpleLinearRegressor::new()),
        ModelKind::Ensemble => Box::new(BootstrapEnsembleRegressor::with_rng(tree_count, rng)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_new_regressor_kind() {
        for kind in [ModelKind::Linear, ModelKind::Ensemble] {
            let model = new_regressor(kind, 5, StdRng::seed_from_u64(0));
            assert_eq!(model.kind(), kind);
        }
    }
}
