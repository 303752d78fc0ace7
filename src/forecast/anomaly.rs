//! Month-over-month consumption swings.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::warn;

use crate::config::AnomalyConfig;
use crate::domain::{chronological, BillingPeriod, HistoricalRecord};

const SPIKE_NOTE: &str =
    "Consumption increased significantly. Check for new appliances or equipment issues.";
const DROP_NOTE: &str =
    "Consumption dropped significantly. Verify meter readings or check for appliance failures.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum AnomalyDirection {
    #[strum(serialize = "Sudden Spike")]
    Spike,
    #[strum(serialize = "Sudden Drop")]
    Drop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// The later month of the flagged pair.
    pub period: BillingPeriod,
    pub direction: AnomalyDirection,
    /// Signed change against the previous month in percent. `None` when the
    /// previous month had zero consumption, i.e. growth from nothing.
    pub pct_change: Option<f64>,
    pub note: String,
}

impl Anomaly {
    /// Absolute change rounded to a whole percent, for display.
    pub fn rounded_change(&self) -> Option<u32> {
        self.pct_change.map(|pct| pct.abs().round() as u32)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    /// Histories shorter than this produce no anomalies.
    pub const MIN_HISTORY: usize = 3;

    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Flag consecutive months whose consumption changed by more than the
    /// threshold, oldest first.
    ///
    /// A month following a zero-consumption month is a spike of unbounded
    /// size if it used anything, and unremarkable if it also used nothing.
    pub fn detect(&self, history: &[HistoricalRecord]) -> Vec<Anomaly> {
        if history.len() < Self::MIN_HISTORY {
            return Vec::new();
        }

        let ordered = chronological(history);
        ordered
            .iter()
            .tuple_windows()
            .filter_map(|(previous, current)| {
                self.compare(previous.units_consumed, current.units_consumed)
                    .map(|(direction, pct_change)| {
                        if pct_change.is_none() {
                            warn!(period = %current.period, "consumption rose from zero");
                        }
                        Anomaly {
                            period: current.period,
                            direction,
                            pct_change,
                            note: match direction {
                                AnomalyDirection::Spike => SPIKE_NOTE,
                                AnomalyDirection::Drop => DROP_NOTE,
                            }
                            .to_string(),
                        }
                    })
            })
            .collect()
    }

    fn compare(&self, previous: f64, current: f64) -> Option<(AnomalyDirection, Option<f64>)> {
        if previous == 0.0 {
            return (current > 0.0).then_some((AnomalyDirection::Spike, None));
        }

        let pct_change = (current - previous) / previous * 100.0;
        if pct_change.abs() <= self.config.threshold_pct {
            return None;
        }
        let direction = if pct_change > 0.0 {
            AnomalyDirection::Spike
        } else {
            AnomalyDirection::Drop
        };
        Some((direction, Some(pct_change)))
    }
}
