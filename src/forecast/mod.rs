//! Forecasting and analytics over a household's billing history.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::domain::{chronological, Forecast, ForecastConfidence, HistoricalRecord, ModelKind, Trend};
use crate::error::Result;
use crate::ml::metrics::mean;

pub mod anomaly;
pub mod engine;
pub mod insights;
pub mod seasonal;
pub mod series;

pub use anomaly::*;
pub use engine::*;
pub use insights::*;
pub use seasonal::*;
pub use series::*;

/// Everything derived from one pass over the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub forecast: Forecast,
    pub trend: Trend,
    pub confidence: ForecastConfidence,
    pub anomalies: Vec<Anomaly>,
    pub insights: Vec<Insight>,
    /// Average units per calendar month, January first.
    pub seasonal_profile: [f64; 12],
    pub series: ForecastSeries,
}

/// Runs the forecast engine, anomaly detector and insight rules together.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    engine: ForecastEngine,
    detector: AnomalyDetector,
    insights: InsightGenerator,
}

impl Analyzer {
    pub fn new(engine: ForecastEngine, detector: AnomalyDetector, insights: InsightGenerator) -> Self {
        Self {
            engine,
            detector,
            insights,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            ForecastEngine::new(cfg.forecast.clone()),
            AnomalyDetector::new(cfg.anomaly.clone()),
            InsightGenerator::new(cfg.insights.clone()),
        )
    }

    pub fn engine(&self) -> &ForecastEngine {
        &self.engine
    }

    /// Forecast the next month and derive anomalies, insights and chart data.
    ///
    /// `current_month` (1-12) drives the seasonal insight. Fails only when the
    /// forecast itself fails.
    pub fn analyze(
        &self,
        history: &[HistoricalRecord],
        kind: ModelKind,
        current_month: u32,
    ) -> Result<Analysis> {
        let forecast = self.engine.forecast(history, kind)?;

        let ordered = chronological(history);
        let start = ordered.len().saturating_sub(self.insights.recent_window());
        let recent = &ordered[start..];
        let recent_amounts: Vec<f64> = recent.iter().map(|r| r.bill_amount).collect();

        let anomalies = self.detector.detect(&ordered);
        let insights = self.insights.generate(&forecast, recent, current_month);
        info!(
            anomalies = anomalies.len(),
            insights = insights.len(),
            "analysis complete"
        );

        Ok(Analysis {
            trend: Trend::classify(forecast.predicted_amount, mean(&recent_amounts)),
            confidence: forecast.confidence(),
            anomalies,
            insights,
            seasonal_profile: seasonal_profile(&ordered),
            series: ForecastSeries::build(&ordered, &forecast),
            forecast,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::History;

    #[test]
    fn test_analyze_reference_sample() {
        let sample = History::reference_sample();
        let analysis = Analyzer::default()
            .analyze(sample.records(), ModelKind::Linear, 1)
            .unwrap();

        assert_eq!(analysis.anomalies.len(), 1);
        assert_eq!(analysis.series.labels.len(), 13);
        assert_eq!(analysis.confidence, ForecastConfidence::Low);
        assert!(analysis
            .insights
            .iter()
            .any(|i| i.category == InsightCategory::LowConfidence));
    }

    #[test]
    fn test_analyze_propagates_forecast_errors() {
        let sample = History::reference_sample();
        let result = Analyzer::default().analyze(sample.recent(2), ModelKind::Linear, 1);
        assert!(result.is_err());
    }
}
