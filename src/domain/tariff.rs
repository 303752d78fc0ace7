//! Tiered electricity tariffs and the bill arithmetic built on them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ForecastError, Result};

/// A consumption range billed at one per-unit rate.
///
/// The slab covers consumption from the previous slab's upper bound up to
/// `upper_bound`; `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TariffSlab {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<f64>,
    pub rate: f64,
}

impl TariffSlab {
    pub fn bounded(upper_bound: f64, rate: f64) -> Self {
        Self {
            upper_bound: Some(upper_bound),
            rate,
        }
    }

    pub fn unbounded(rate: f64) -> Self {
        Self {
            upper_bound: None,
            rate,
        }
    }
}

/// Ordered slabs plus a fixed monthly charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTariff", into = "RawTariff")]
pub struct TariffSchedule {
    slabs: Vec<TariffSlab>,
    fixed_charge: f64,
}

#[derive(Serialize, Deserialize)]
struct RawTariff {
    slabs: Vec<TariffSlab>,
    fixed_charge: f64,
}

impl TryFrom<RawTariff> for TariffSchedule {
    type Error = ForecastError;

    fn try_from(raw: RawTariff) -> Result<Self> {
        Self::new(raw.slabs, raw.fixed_charge)
    }
}

impl From<TariffSchedule> for RawTariff {
    fn from(schedule: TariffSchedule) -> Self {
        Self {
            slabs: schedule.slabs,
            fixed_charge: schedule.fixed_charge,
        }
    }
}

impl TariffSchedule {
    /// Build a schedule, checking that bounds strictly increase and only the
    /// last slab is unbounded.
    pub fn new(slabs: Vec<TariffSlab>, fixed_charge: f64) -> Result<Self> {
        if slabs.is_empty() {
            return Err(ForecastError::InvalidTariff("no slabs".to_string()));
        }
        if !fixed_charge.is_finite() || fixed_charge < 0.0 {
            return Err(ForecastError::InvalidTariff(format!(
                "fixed charge must be non-negative, got {}",
                fixed_charge
            )));
        }

        let last = slabs.len() - 1;
        let mut previous = 0.0;
        for (i, slab) in slabs.iter().enumerate() {
            if !slab.rate.is_finite() || slab.rate < 0.0 {
                return Err(ForecastError::InvalidTariff(format!(
                    "slab {} has invalid rate {}",
                    i, slab.rate
                )));
            }
            match (slab.upper_bound, i == last) {
                (None, true) => {}
                (None, false) => {
                    return Err(ForecastError::InvalidTariff(format!(
                        "slab {} is unbounded but is not the last slab",
                        i
                    )))
                }
                (Some(_), true) => {
                    return Err(ForecastError::InvalidTariff(
                        "last slab must be unbounded".to_string(),
                    ))
                }
                (Some(upper), false) => {
                    if !upper.is_finite() || upper <= previous {
                        return Err(ForecastError::InvalidTariff(format!(
                            "slab {} upper bound {} must exceed {}",
                            i, upper, previous
                        )));
                    }
                    previous = upper;
                }
            }
        }

        let schedule = Self {
            slabs,
            fixed_charge,
        };
        let redundant = schedule.redundant_slabs();
        if !redundant.is_empty() {
            debug!(?redundant, "tariff has adjacent slabs sharing one rate");
        }
        Ok(schedule)
    }

    /// Bihar DS-II domestic tariff: 0-100 kWh at 7.42, 100-200 and 200+ at
    /// 8.95, with a fixed charge of 80.
    pub fn bihar_domestic() -> Self {
        Self {
            slabs: vec![
                TariffSlab::bounded(100.0, 7.42),
                TariffSlab::bounded(200.0, 8.95),
                TariffSlab::unbounded(8.95),
            ],
            fixed_charge: 80.0,
        }
    }

    pub fn slabs(&self) -> &[TariffSlab] {
        &self.slabs
    }

    pub fn fixed_charge(&self) -> f64 {
        self.fixed_charge
    }

    /// Indices `i` where slab `i` and slab `i + 1` bill at the same rate.
    pub fn redundant_slabs(&self) -> Vec<usize> {
        self.slabs
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[0].rate == pair[1].rate)
            .map(|(i, _)| i)
            .collect()
    }

    /// Amount billed for `units` kWh, rounded to two decimals.
    ///
    /// `units` must be non-negative; validating it is the caller's job.
    pub fn bill(&self, units: f64) -> f64 {
        let mut amount = self.fixed_charge;
        let mut lower = 0.0;
        for slab in &self.slabs {
            if units <= lower {
                break;
            }
            let upper = slab.upper_bound.unwrap_or(f64::INFINITY);
            amount += (units.min(upper) - lower) * slab.rate;
            lower = upper;
        }
        round2(amount)
    }

    /// Bill after cutting consumption by `reduction_pct` percent.
    pub fn bill_after_reduction(&self, units: f64, reduction_pct: f64) -> f64 {
        let pct = reduction_pct.clamp(0.0, 100.0);
        self.bill(units * (1.0 - pct / 100.0))
    }
}

impl Default for TariffSchedule {
    fn default() -> Self {
        Self::bihar_domestic()
    }
}

/// Money saved by trimming a bill by a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingsEstimate {
    pub monthly: f64,
    pub yearly: f64,
}

/// Monthly saving is rounded to a whole currency unit; yearly is twelve of those.
pub fn estimate_savings(current_bill: f64, reduction_pct: f64) -> SavingsEstimate {
    let pct = reduction_pct.clamp(0.0, 100.0);
    let monthly = (current_bill.max(0.0) * pct / 100.0).round();
    SavingsEstimate {
        monthly,
        yearly: monthly * 12.0,
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
