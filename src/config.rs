use std::path::Path;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::domain::{ModelKind, TariffSchedule};
use crate::ml::ensemble::DEFAULT_TREE_COUNT;

/// Default location of the shipped configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable prefix, e.g. `BILLCAST__FORECAST__SEED=42`.
pub const ENV_PREFIX: &str = "BILLCAST__";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub tariff: TariffSchedule,
    pub forecast: ForecastConfig,
    pub anomaly: AnomalyConfig,
    pub insights: InsightConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Records required before a forecast is attempted; never below 3.
    pub min_history: usize,
    pub ensemble_tree_count: usize,
    /// Pins the ensemble's bootstrap draws when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub default_model: ModelKind,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_history: 3,
            ensemble_tree_count: DEFAULT_TREE_COUNT,
            seed: None,
            default_model: ModelKind::Linear,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Month-over-month change (in percent) beyond which a month is flagged.
    pub threshold_pct: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self { threshold_pct: 50.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightConfig {
    pub recent_window: usize,
    pub increase_ratio: f64,
    pub decrease_ratio: f64,
    /// Calendar months (1-12) treated as peak season.
    pub peak_months: Vec<u32>,
    pub above_regional_units: f64,
    pub below_regional_units: f64,
    pub regional_average_units: f64,
    pub regional_name: String,
    pub low_confidence_pct: u8,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            recent_window: 3,
            increase_ratio: 1.15,
            decrease_ratio: 0.85,
            peak_months: vec![4, 5, 6, 7, 8],
            above_regional_units: 200.0,
            below_regional_units: 100.0,
            regional_average_units: 150.0,
            regional_name: "Bihar".to_string(),
            low_confidence_pct: 70,
        }
    }
}

impl Config {
    /// Layer built-in defaults, the TOML file and `BILLCAST__` environment
    /// variables, in that order.
    ///
    /// An explicit `path` must exist; without one, [`DEFAULT_CONFIG_PATH`] is
    /// read if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => {
                if !p.exists() {
                    anyhow::bail!("config file not found: {}", p.display());
                }
                p
            }
            None => Path::new(DEFAULT_CONFIG_PATH),
        };

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.forecast.min_history < 3 {
            anyhow::bail!(
                "forecast.min_history must be at least 3, got {}",
                self.forecast.min_history
            );
        }
        if self.forecast.ensemble_tree_count == 0 {
            anyhow::bail!("forecast.ensemble_tree_count must be at least 1");
        }
        if !self.anomaly.threshold_pct.is_finite() || self.anomaly.threshold_pct < 0.0 {
            anyhow::bail!(
                "anomaly.threshold_pct must be non-negative, got {}",
                self.anomaly.threshold_pct
            );
        }
        let insights = &self.insights;
        if insights.recent_window == 0 {
            anyhow::bail!("insights.recent_window must be at least 1");
        }
        if insights.decrease_ratio > insights.increase_ratio {
            anyhow::bail!("insights.decrease_ratio must not exceed insights.increase_ratio");
        }
        if insights.below_regional_units > insights.above_regional_units {
            anyhow::bail!(
                "insights.below_regional_units must not exceed insights.above_regional_units"
            );
        }
        if let Some(month) = insights.peak_months.iter().find(|m| !(1..=12).contains(*m)) {
            anyhow::bail!("insights.peak_months contains invalid month {}", month);
        }
        if insights.low_confidence_pct > 100 {
            anyhow::bail!("insights.low_confidence_pct must be 0-100");
        }
        Ok(())
    }
}
