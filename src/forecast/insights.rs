use serde::{Deserialize, Serialize};
use strum::Display;

use crate::config::InsightConfig;
use crate::domain::{Forecast, HistoricalRecord};
use crate::ml::metrics::mean;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InsightCategory {
    Increase,
    Decrease,
    PeakSeason,
    AboveRegionalAverage,
    BelowRegionalAverage,
    LowConfidence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub category: InsightCategory,
    pub text: String,
}

impl Insight {
    fn new(category: InsightCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
        }
    }
}

/// Plain-language observations about a forecast and the latest months.
#[derive(Debug, Clone, Default)]
pub struct InsightGenerator {
    config: InsightConfig,
}

impl InsightGenerator {
    pub fn new(config: InsightConfig) -> Self {
        Self { config }
    }

    /// Number of trailing records the rules look at.
    pub fn recent_window(&self) -> usize {
        self.config.recent_window
    }

    /// Evaluate every rule independently against `forecast` and the `recent`
    /// window (normally the last three months). `current_month` is 1-12.
    ///
    /// Rules that need an average are skipped when `recent` is empty, and the
    /// trend rules are skipped when the average bill is zero.
    pub fn generate(
        &self,
        forecast: &Forecast,
        recent: &[HistoricalRecord],
        current_month: u32,
    ) -> Vec<Insight> {
        let cfg = &self.config;
        let mut insights = Vec::new();

        if !recent.is_empty() {
            let amounts: Vec<f64> = recent.iter().map(|r| r.bill_amount).collect();
            let avg_amount = mean(&amounts);
            let predicted = forecast.predicted_amount;

            if avg_amount > 0.0 {
                if predicted > avg_amount * cfg.increase_ratio {
                    let pct = ((predicted / avg_amount - 1.0) * 100.0).round();
                    insights.push(Insight::new(
                        InsightCategory::Increase,
                        format!(
                            "Your next bill is predicted to be {}% higher than recent average. Consider energy-saving measures.",
                            pct
                        ),
                    ));
                } else if predicted < avg_amount * cfg.decrease_ratio {
                    let pct = ((1.0 - predicted / avg_amount) * 100.0).round();
                    insights.push(Insight::new(
                        InsightCategory::Decrease,
                        format!(
                            "Great news! Your bill is expected to decrease by {}% compared to recent average.",
                            pct
                        ),
                    ));
                }
            }
        }

        if cfg.peak_months.contains(&current_month) {
            insights.push(Insight::new(
                InsightCategory::PeakSeason,
                "This is peak season (summer). AC usage typically increases bills by 40-60%.",
            ));
        }

        if !recent.is_empty() {
            let units: Vec<f64> = recent.iter().map(|r| r.units_consumed).collect();
            let avg_units = mean(&units);
            if avg_units > cfg.above_regional_units {
                insights.push(Insight::new(
                    InsightCategory::AboveRegionalAverage,
                    format!(
                        "Your consumption is above {} state average ({} kWh/month). Consider energy efficiency measures.",
                        cfg.regional_name, cfg.regional_average_units
                    ),
                ));
            } else if avg_units < cfg.below_regional_units {
                insights.push(Insight::new(
                    InsightCategory::BelowRegionalAverage,
                    format!(
                        "Excellent! Your consumption is below {} state average. Keep up the good work!",
                        cfg.regional_name
                    ),
                ));
            }
        }

        if forecast.accuracy_pct < cfg.low_confidence_pct {
            insights.push(Insight::new(
                InsightCategory::LowConfidence,
                "Prediction confidence is moderate. Adding more historical data will improve accuracy.",
            ));
        }

        insights
    }
}
