use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};
use validator::Validate;

use crate::config::ForecastConfig;
use crate::domain::tariff::round2;
use crate::domain::{chronological, Forecast, HistoricalRecord, ModelKind};
use crate::error::{ForecastError, Result};
use crate::ml::{metrics, new_regressor, Regressor};

/// Fewest records a forecast can be built from, whatever the configuration says.
pub const MIN_HISTORY: usize = 3;

/// Turns a billing history into a next-month [`Forecast`].
///
/// The engine holds configuration only; every call fits fresh models on the
/// history it is given and keeps nothing afterwards.
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    config: ForecastConfig,
}

impl ForecastEngine {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn min_history(&self) -> usize {
        self.config.min_history.max(MIN_HISTORY)
    }

    /// Forecast the month after the last record.
    ///
    /// Records are ordered by period on a private copy when needed. Both the
    /// units and the amount series are regressed against the ordinal index
    /// `0..n` and extrapolated to `n`.
    pub fn forecast(&self, history: &[HistoricalRecord], kind: ModelKind) -> Result<Forecast> {
        let needed = self.min_history();
        if history.len() < needed {
            return Err(ForecastError::InsufficientHistory {
                needed,
                got: history.len(),
            });
        }
        for record in history {
            record.validate()?;
        }

        let ordered = chronological(history);
        let x: Vec<f64> = (0..ordered.len()).map(|i| i as f64).collect();
        let units: Vec<f64> = ordered.iter().map(|r| r.units_consumed).collect();
        let amounts: Vec<f64> = ordered.iter().map(|r| r.bill_amount).collect();

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let tree_count = self.config.ensemble_tree_count;
        let mut units_model = new_regressor(kind, tree_count, StdRng::seed_from_u64(rng.gen()));
        let mut amount_model = new_regressor(kind, tree_count, StdRng::seed_from_u64(rng.gen()));

        units_model.fit(&x, &units)?;
        amount_model.fit(&x, &amounts)?;

        let next = [ordered.len() as f64];
        let raw_units = first(units_model.predict(&next)?)?;
        let raw_amount = first(amount_model.predict(&next)?)?;

        let predicted_units = raw_units.round().max(0.0);
        let predicted_amount = round2(raw_amount).max(0.0);

        let spread = metrics::population_std_dev(&amounts);
        let min_amount = round2(predicted_amount - spread).max(0.0);
        let max_amount = round2(predicted_amount + spread);

        let accuracy_pct = accuracy_pct(units_model.as_ref(), amount_model.as_ref())?;

        debug!(
            raw_units,
            raw_amount,
            spread,
            units_r2 = units_model.r2()?,
            amount_r2 = amount_model.r2()?,
            "fitted forecast models"
        );
        info!(
            model = %kind,
            records = ordered.len(),
            predicted_units,
            predicted_amount,
            accuracy_pct,
            "forecast complete"
        );

        Ok(Forecast {
            predicted_units,
            predicted_amount,
            min_amount,
            max_amount,
            accuracy_pct,
            model_kind: kind,
        })
    }
}

fn first(values: Vec<f64>) -> Result<f64> {
    values.into_iter().next().ok_or(ForecastError::ModelNotFitted)
}

/// Best of the two fits as a whole percentage in 0-100.
fn accuracy_pct(units: &dyn Regressor, amount: &dyn Regressor) -> Result<u8> {
    let best = units.r2()?.max(amount.r2()?);
    if best.is_nan() {
        return Ok(0);
    }
    Ok((best * 100.0).round().clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BillingPeriod, History};
    use rstest::rstest;

    fn records(series: &[(f64, f64)]) -> Vec<HistoricalRecord> {
        let mut period: BillingPeriod = "2023-01".parse().unwrap();
        series
            .iter()
            .map(|&(units, amount)| {
                let r = HistoricalRecord::new(period, units, amount).unwrap();
                period = period.next();
                r
            })
            .collect()
    }

    fn seeded(seed: u64) -> ForecastEngine {
        ForecastEngine::new(ForecastConfig {
            seed: Some(seed),
            ..ForecastConfig::default()
        })
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    fn test_insufficient_history(#[case] n: usize) {
        let history = records(&[(100.0, 822.0); 3][..n]);
        let result = ForecastEngine::default().forecast(&history, ModelKind::Linear);
        assert_eq!(
            result,
            Err(ForecastError::InsufficientHistory { needed: 3, got: n })
        );
    }

    #[test]
    fn test_configured_min_history_is_respected() {
        let engine = ForecastEngine::new(ForecastConfig {
            min_history: 6,
            ..ForecastConfig::default()
        });
        let history = records(&[(100.0, 822.0); 4]);
        assert_eq!(
            engine.forecast(&history, ModelKind::Linear),
            Err(ForecastError::InsufficientHistory { needed: 6, got: 4 })
        );
    }

    #[rstest]
    #[case(ModelKind::Linear)]
    #[case(ModelKind::Ensemble)]
    fn test_constant_history_collapses_band(#[case] kind: ModelKind) {
        let history = records(&[(150.0, 1269.5); 3]);
        let forecast = seeded(3).forecast(&history, kind).unwrap();

        assert_eq!(forecast.predicted_units, 150.0);
        assert_eq!(forecast.predicted_amount, 1269.5);
        assert_eq!(forecast.min_amount, 1269.5);
        assert_eq!(forecast.max_amount, 1269.5);
        assert_eq!(forecast.accuracy_pct, 100);
        assert_eq!(forecast.model_kind, kind);
    }

    #[test]
    fn test_linear_extrapolates_trend() {
        let history = records(&[(100.0, 900.0), (110.0, 1000.0), (120.0, 1100.0), (130.0, 1200.0)]);
        let forecast = ForecastEngine::default()
            .forecast(&history, ModelKind::Linear)
            .unwrap();

        assert_eq!(forecast.predicted_units, 140.0);
        assert_eq!(forecast.predicted_amount, 1300.0);
        assert_eq!(forecast.accuracy_pct, 100);
        // population std of [900, 1000, 1100, 1200] is sqrt(12500)
        assert_eq!(forecast.min_amount, 1188.2);
        assert_eq!(forecast.max_amount, 1411.8);
    }

    #[test]
    fn test_negative_extrapolation_is_clamped() {
        let history = records(&[(300.0, 2500.0), (150.0, 1250.0), (10.0, 150.0)]);
        let forecast = ForecastEngine::default()
            .forecast(&history, ModelKind::Linear)
            .unwrap();

        assert_eq!(forecast.predicted_units, 0.0);
        assert_eq!(forecast.predicted_amount, 0.0);
        assert_eq!(forecast.min_amount, 0.0);
        assert!(forecast.max_amount > 0.0);
    }

    #[test]
    fn test_unordered_input_is_not_mutated() {
        let mut history = records(&[(100.0, 900.0), (110.0, 1000.0), (120.0, 1100.0), (130.0, 1200.0)]);
        history.reverse();
        let snapshot = history.clone();

        let forecast = ForecastEngine::default()
            .forecast(&history, ModelKind::Linear)
            .unwrap();

        assert_eq!(history, snapshot);
        assert_eq!(forecast.predicted_units, 140.0);
    }

    #[test]
    fn test_invalid_record_rejected() {
        let mut history = records(&[(100.0, 900.0); 3]);
        history[1].units_consumed = f64::NAN;
        assert!(matches!(
            ForecastEngine::default().forecast(&history, ModelKind::Linear),
            Err(ForecastError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_linear_is_deterministic() {
        let sample = History::reference_sample();
        let engine = ForecastEngine::default();
        let a = engine.forecast(sample.records(), ModelKind::Linear).unwrap();
        let b = engine.forecast(sample.records(), ModelKind::Linear).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_seeded_ensemble_is_reproducible() {
        let sample = History::reference_sample();
        let a = seeded(99).forecast(sample.records(), ModelKind::Ensemble).unwrap();
        let b = seeded(99).forecast(sample.records(), ModelKind::Ensemble).unwrap();
        assert_eq!(a, b);
    }
}
