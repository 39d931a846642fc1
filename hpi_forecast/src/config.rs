//! Analysis configuration
//!
//! Every run is driven by an [`AnalysisConfig`]. The defaults reproduce the
//! standard UK analysis; a JSON file or command-line flags can override any
//! field.

use crate::error::{AnalysisError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Region kept by the filter stage
pub const DEFAULT_REGION: &str = "United Kingdom";
/// Lag count of the primary model
pub const PRIMARY_LAGS: usize = 12;
/// Lag count of the baseline model
pub const BASELINE_LAGS: usize = 1;

/// Last date of the training period
pub fn default_training_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 12, 31).unwrap_or_default()
}

/// Names of the columns read from the source CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceColumns {
    pub date: String,
    pub region: String,
    pub sales_volume: String,
}

impl Default for SourceColumns {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            region: "RegionName".to_string(),
            sales_volume: "SalesVolume".to_string(),
        }
    }
}

impl SourceColumns {
    /// All source column names, in load order
    pub fn names(&self) -> [&str; 3] {
        [&self.date, &self.region, &self.sales_volume]
    }
}

/// Configuration of a single analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Path of the house-price index CSV
    pub data_path: PathBuf,
    pub source_columns: SourceColumns,
    pub region: String,
    /// Last date included in the training subset; the test subset starts the day after
    pub training_end: NaiveDate,
    pub primary_lags: usize,
    pub baseline_lags: usize,
    /// Directory receiving plots and prediction tables
    pub output_dir: PathBuf,
    /// Width and height of the residual plots in pixels
    pub plot_size: (u32, u32),
    /// Also score the training model on the test subset
    pub evaluate_holdout: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/UK-HPI-full-file.csv"),
            source_columns: SourceColumns::default(),
            region: DEFAULT_REGION.to_string(),
            training_end: default_training_end(),
            primary_lags: PRIMARY_LAGS,
            baseline_lags: BASELINE_LAGS,
            output_dir: PathBuf::from("output"),
            plot_size: (800, 600),
            evaluate_holdout: false,
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(AnalysisError::ConfigError(
                "Region must not be empty".to_string(),
            ));
        }
        if self.primary_lags == 0 || self.baseline_lags == 0 {
            return Err(AnalysisError::ConfigError(format!(
                "Lag counts must be at least 1 (primary {}, baseline {})",
                self.primary_lags, self.baseline_lags
            )));
        }
        if self.primary_lags == self.baseline_lags {
            return Err(AnalysisError::ConfigError(format!(
                "Baseline lag count must differ from the primary lag count ({})",
                self.primary_lags
            )));
        }
        if self.source_columns.names().iter().any(|c| c.is_empty()) {
            return Err(AnalysisError::ConfigError(
                "Source column names must not be empty".to_string(),
            ));
        }
        if self.plot_size.0 == 0 || self.plot_size.1 == 0 {
            return Err(AnalysisError::ConfigError(
                "Plot dimensions must be positive".to_string(),
            ));
        }
        if self.training_end.succ_opt().is_none() {
            return Err(AnalysisError::ConfigError(format!(
                "Training end {} leaves no room for a test period",
                self.training_end
            )));
        }
        Ok(())
    }

    /// First date of the test subset
    pub fn test_start(&self) -> Option<NaiveDate> {
        self.training_end.succ_opt()
    }
}
