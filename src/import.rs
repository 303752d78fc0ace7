//! CSV ingestion of billing history.
//!
//! Expected header: `month,units_consumed,bill_amount`, with months written
//! `YYYY-MM`. Rows missing any of the three values are skipped; rows with
//! values that do not parse are rejected.

use std::io::Read;

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{BillingPeriod, HistoricalRecord, History};
use crate::error::{ForecastError, Result};

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    month: Option<String>,
    #[serde(default)]
    units_consumed: Option<String>,
    #[serde(default)]
    bill_amount: Option<String>,
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

fn parse_number(value: &str, column: &str, line: u64) -> Result<f64> {
    value.trim().parse::<f64>().map_err(|e| {
        ForecastError::Import(format!("line {}: {} '{}': {}", line, column, value, e))
    })
}

/// Read a history from CSV text.
pub fn read_history<R: Read>(reader: R) -> Result<History> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut history = History::new();
    let mut skipped = 0usize;
    for row in csv_reader.deserialize::<RawRow>() {
        let row = row?;
        // header is line 1
        let line = history.len() as u64 + skipped as u64 + 2;

        let (month, units, amount) = match (
            present(row.month),
            present(row.units_consumed),
            present(row.bill_amount),
        ) {
            (Some(m), Some(u), Some(a)) => (m, u, a),
            _ => {
                warn!(line, "skipping incomplete CSV row");
                skipped += 1;
                continue;
            }
        };

        let period: BillingPeriod = month
            .parse()
            .map_err(|e| ForecastError::Import(format!("line {}: {}", line, e)))?;
        let record = HistoricalRecord::new(
            period,
            parse_number(&units, "units_consumed", line)?,
            parse_number(&amount, "bill_amount", line)?,
        )
        .map_err(|e| ForecastError::Import(format!("line {}: {}", line, e)))?;
        history
            .insert(record)
            .map_err(|e| ForecastError::Import(format!("line {}: {}", line, e)))?;
    }

    debug!(records = history.len(), skipped, "imported CSV history");
    Ok(history)
}
