use serde::{Deserialize, Serialize};

use crate::domain::{chronological, Forecast, HistoricalRecord};

/// Chart-ready view of the billed amounts with the forecast appended.
///
/// `labels` has one more entry than `actual`; `predicted` is aligned with
/// `labels` and empty everywhere except the last slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub labels: Vec<String>,
    pub actual: Vec<f64>,
    pub predicted: Vec<Option<f64>>,
}

impl ForecastSeries {
    pub fn build(history: &[HistoricalRecord], forecast: &Forecast) -> Self {
        let ordered = chronological(history);
        let mut labels: Vec<String> = ordered.iter().map(|r| r.period.label()).collect();
        let actual: Vec<f64> = ordered.iter().map(|r| r.bill_amount).collect();
        let mut predicted = vec![None; actual.len()];

        if let Some(last) = ordered.last() {
            labels.push(last.period.next().label());
            predicted.push(Some(forecast.predicted_amount));
        }

        Self {
            labels,
            actual,
            predicted,
        }
    }
}
