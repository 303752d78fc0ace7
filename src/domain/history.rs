use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{ForecastError, Result};

/// Calendar month a bill belongs to, written `YYYY-MM`.
///
/// Ordering is chronological (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BillingPeriod {
    year: i32,
    month: u32,
}

impl BillingPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ForecastError::InvalidPeriod(format!(
                "month {} out of range 1-12",
                month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month number, 1 = January.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The calendar month following this one.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// Human readable label such as `January 2023`.
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(date) => date.format("%B %Y").to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingPeriod {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let date = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
            .map_err(|e| ForecastError::InvalidPeriod(format!("'{}': {}", trimmed, e)))?;
        Ok(Self {
            year: date.year(),
            month: date.month(),
        })
    }
}

impl TryFrom<String> for BillingPeriod {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BillingPeriod> for String {
    fn from(period: BillingPeriod) -> Self {
        period.to_string()
    }
}

/// One month of observed consumption and the amount billed for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    #[serde(rename = "month")]
    pub period: BillingPeriod,
    /// Consumption in kWh.
    pub units_consumed: f64,
    /// Billed amount in currency units.
    pub bill_amount: f64,
}

impl HistoricalRecord {
    /// Create a validated record.
    pub fn new(period: BillingPeriod, units_consumed: f64, bill_amount: f64) -> Result<Self> {
        let record = Self {
            period,
            units_consumed,
            bill_amount,
        };
        record.validate()?;
        Ok(record)
    }
}

fn non_negative_finite(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl Validate for HistoricalRecord {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !non_negative_finite(self.units_consumed) {
            errors.add("units_consumed", ValidationError::new("non_negative_finite"));
        }
        if !non_negative_finite(self.bill_amount) {
            errors.add("bill_amount", ValidationError::new("non_negative_finite"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Returns the records in chronological order without touching the caller's slice.
///
/// Already ordered input is borrowed as is; anything else is sorted on a copy.
pub fn chronological(records: &[HistoricalRecord]) -> Cow<'_, [HistoricalRecord]> {
    if records.windows(2).all(|w| w[0].period <= w[1].period) {
        Cow::Borrowed(records)
    } else {
        let mut sorted = records.to_vec();
        sorted.sort_by_key(|r| r.period);
        Cow::Owned(sorted)
    }
}

/// Validated, period-unique billing history kept in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<HistoricalRecord>", into = "Vec<HistoricalRecord>")]
pub struct History {
    records: Vec<HistoricalRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from arbitrary-order records, rejecting invalid values
    /// and repeated periods.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = HistoricalRecord>,
    {
        let mut history = Self::new();
        for record in records {
            history.insert(record)?;
        }
        Ok(history)
    }

    /// Insert a record at its chronological position.
    pub fn insert(&mut self, record: HistoricalRecord) -> Result<()> {
        record.validate()?;
        match self
            .records
            .binary_search_by_key(&record.period, |r| r.period)
        {
            Ok(_) => Err(ForecastError::DuplicatePeriod(record.period)),
            Err(idx) => {
                self.records.insert(idx, record);
                Ok(())
            }
        }
    }

    /// Remove the record for `period`, returning it if present.
    pub fn remove(&mut self, period: BillingPeriod) -> Option<HistoricalRecord> {
        let idx = self
            .records
            .binary_search_by_key(&period, |r| r.period)
            .ok()?;
        Some(self.records.remove(idx))
    }

    pub fn get(&self, period: BillingPeriod) -> Option<&HistoricalRecord> {
        self.records
            .binary_search_by_key(&period, |r| r.period)
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[HistoricalRecord] {
        &self.records
    }

    /// The last `n` records (fewer if the history is shorter).
    pub fn recent(&self, n: usize) -> &[HistoricalRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    pub fn latest(&self) -> Option<&HistoricalRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Twelve months of reference data for a Bihar DS-II household (2023).
    pub fn reference_sample() -> Self {
        const SAMPLE: [(u32, f64, f64); 12] = [
            (1, 177.0, 1511.15),
            (2, 161.0, 1367.95),
            (3, 148.0, 1251.60),
            (4, 257.0, 2227.15),
            (5, 202.0, 1734.90),
            (6, 202.0, 1734.90),
            (7, 259.0, 2245.05),
            (8, 234.0, 2021.30),
            (9, 195.0, 1672.25),
            (10, 145.0, 1224.75),
            (11, 167.0, 1426.15),
            (12, 134.0, 1133.30),
        ];
        let records = SAMPLE
            .iter()
            .map(|&(month, units_consumed, bill_amount)| HistoricalRecord {
                period: BillingPeriod { year: 2023, month },
                units_consumed,
                bill_amount,
            })
            .collect();
        Self { records }
    }
}

impl TryFrom<Vec<HistoricalRecord>> for History {
    type Error = ForecastError;

    fn try_from(records: Vec<HistoricalRecord>) -> Result<Self> {
        Self::from_records(records)
    }
}

impl From<History> for Vec<HistoricalRecord> {
    fn from(history: History) -> Self {
        history.records
    }
}

impl AsRef<[HistoricalRecord]> for History {
    fn as_ref(&self) -> &[HistoricalRecord] {
        &self.records
    }
}
