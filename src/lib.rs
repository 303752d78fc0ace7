//! Next-month electricity consumption and bill forecasting for a household.
//!
//! The crate turns a short monthly billing history into a point forecast
//! with a confidence band, flags unusual month-over-month swings, derives
//! plain-language insights and prices consumption under a tiered tariff.

pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod import;
pub mod ml;
pub mod telemetry;

pub use config::Config;
pub use domain::{
    BillingPeriod, Forecast, ForecastConfidence, HistoricalRecord, History, ModelKind,
    TariffSchedule, TariffSlab, Trend,
};
pub use error::{ForecastError, Result};
pub use forecast::{
    Analysis, Analyzer, Anomaly, AnomalyDetector, AnomalyDirection, ForecastEngine, Insight,
    InsightCategory, InsightGenerator,
};
