use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Regression family used for a forecast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ModelKind {
    /// Ordinary least squares over the time index.
    #[default]
    Linear,
    /// Bootstrap-averaged linear fits.
    Ensemble,
}

/// Next-month prediction derived from the billing history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Whole kWh, never negative.
    pub predicted_units: f64,
    /// Rounded to two decimals, never negative.
    pub predicted_amount: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    /// 0-100
    pub accuracy_pct: u8,
    pub model_kind: ModelKind,
}

impl Forecast {
    pub fn confidence(&self) -> ForecastConfidence {
        ForecastConfidence::from_accuracy_pct(self.accuracy_pct)
    }

    /// Width of the confidence band.
    pub fn band_width(&self) -> f64 {
        self.max_amount - self.min_amount
    }
}

/// Forecast confidence level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ForecastConfidence {
    High,   // >= 90% accuracy
    Medium, // 70-90% accuracy
    Low,    // < 70% accuracy
}

impl ForecastConfidence {
    pub fn from_accuracy_pct(accuracy_pct: u8) -> Self {
        if accuracy_pct >= 90 {
            Self::High
        } else if accuracy_pct >= 70 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Direction of the predicted bill against the recent average.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Trend {
    Increasing,
    Stable,
    Decreasing,
}

impl Trend {
    /// More than 10% above the recent average is increasing, more than 10%
    /// below is decreasing.
    pub fn classify(predicted_amount: f64, recent_average: f64) -> Self {
        if predicted_amount > recent_average * 1.1 {
            Self::Increasing
        } else if predicted_amount < recent_average * 0.9 {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }
}
