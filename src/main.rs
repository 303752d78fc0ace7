use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bill_forecast::{config::Config, domain, import, telemetry, Analyzer, History, ModelKind};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "bill-forecast", version, about = "Forecast next month's electricity bill")]
struct Cli {
    /// TOML configuration file (defaults to config/default.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Human readable logs instead of JSON
    #[arg(long, global = true)]
    plain_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Forecast, detect anomalies and derive insights from a billing history
    Analyze {
        /// linear or ensemble
        #[arg(long)]
        model: Option<ModelKind>,

        /// Seed for the ensemble's bootstrap draws
        #[arg(long)]
        seed: Option<u64>,

        /// Calendar month (1-12) used for seasonal insights; defaults to today
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,

        /// CSV with month,units_consumed,bill_amount; the 2023 sample when omitted
        csv: Option<PathBuf>,
    },
    /// Bill for a given consumption under the configured tariff
    Bill {
        /// Consumption in kWh
        units: f64,
    },
    /// Savings from cutting a bill by a percentage
    Savings {
        /// Current monthly bill
        bill: f64,
        /// Reduction in percent (0-100)
        pct: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(!cli.plain_logs);

    let mut cfg = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Analyze {
            model,
            seed,
            month,
            csv,
        } => {
            if seed.is_some() {
                cfg.forecast.seed = seed;
            }
            let history = match csv {
                Some(path) => {
                    let file = File::open(&path)
                        .with_context(|| format!("failed to open {}", path.display()))?;
                    import::read_history(file)
                        .with_context(|| format!("failed to import {}", path.display()))?
                }
                None => History::reference_sample(),
            };
            let kind = model.unwrap_or(cfg.forecast.default_model);
            let month = month.unwrap_or_else(|| chrono::Local::now().month());

            info!(records = history.len(), model = %kind, month, "analyzing history");
            let analysis = Analyzer::from_config(&cfg)
                .analyze(history.records(), kind, month)
                .context("analysis failed")?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Command::Bill { units } => {
            if !units.is_finite() || units < 0.0 {
                anyhow::bail!("units must be a non-negative number, got {}", units);
            }
            let amount = cfg.tariff.bill(units);
            println!("{}", serde_json::json!({ "units": units, "amount": amount }));
        }
        Command::Savings { bill, pct } => {
            if !bill.is_finite() || bill < 0.0 || !(0.0..=100.0).contains(&pct) {
                anyhow::bail!("bill must be non-negative and pct within 0-100");
            }
            let savings = domain::estimate_savings(bill, pct);
            println!("{}", serde_json::to_string_pretty(&savings)?);
        }
    }

    Ok(())
}
