//! Lagged sales-volume regression over the UK House Price Index
//!
//! Usage:
//! ```text
//! cargo run --bin hpi_analysis -- --data UK-HPI-full-file.csv --output-dir output
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use hpi_forecast::{run_analysis, AnalysisConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Regress monthly sales volume on its own lags")]
struct Args {
    /// House-price index CSV file
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Region to analyse
    #[arg(short, long)]
    region: Option<String>,

    /// Last date of the training period (YYYY-MM-DD)
    #[arg(long)]
    training_end: Option<NaiveDate>,

    /// Lag count of the primary model
    #[arg(short, long)]
    lags: Option<usize>,

    /// Lag count of the baseline model
    #[arg(long)]
    baseline_lags: Option<usize>,

    /// Directory for residual plots and prediction tables
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also score the training model on the test period
    #[arg(long)]
    holdout: bool,

    /// Print the report without writing plots or tables
    #[arg(long)]
    no_artifacts: bool,
}

impl Args {
    fn into_config(self) -> Result<(AnalysisConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => AnalysisConfig::default(),
        };

        if let Some(data) = self.data {
            config.data_path = data;
        }
        if let Some(region) = self.region {
            config.region = region;
        }
        if let Some(training_end) = self.training_end {
            config.training_end = training_end;
        }
        if let Some(lags) = self.lags {
            config.primary_lags = lags;
        }
        if let Some(lags) = self.baseline_lags {
            config.baseline_lags = lags;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        config.evaluate_holdout |= self.holdout;

        config.validate().context("invalid configuration")?;
        Ok((config, !self.no_artifacts))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hpi_forecast=info,hpi_analysis=info".into()),
        )
        .init();

    let (config, write_artifacts) = Args::parse().into_config()?;
    info!(data = %config.data_path.display(), region = %config.region, "starting analysis");

    let report = run_analysis(&config)
        .with_context(|| format!("analysis of {} failed", config.data_path.display()))?;
    println!("{}", report);

    if write_artifacts {
        let written = report
            .write_artifacts(&config.output_dir)
            .with_context(|| format!("writing artifacts to {}", config.output_dir.display()))?;
        for path in written {
            println!("wrote {}", path.display());
        }
    }

    Ok(())
}
