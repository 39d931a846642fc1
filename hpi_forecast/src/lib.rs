//! # HPI Forecast
//!
//! Lagged regression of monthly sales volume over the UK House Price Index.
//!
//! ## Features
//!
//! - CSV loading and single-region filtering (`data`)
//! - Chronological train/test split at a cutoff date (`split`)
//! - Positional lag features with identifier fields kept out of the predictors (`features`)
//! - Ordinary least squares with coefficient inference (`models`)
//! - MAE, RMSE, five-number summaries and residual plots (`metrics`, `plot`)
//! - Comparison of the primary lag count against a one-lag baseline (`comparison`)
//!
//! ## Quick Start
//!
//! ```no_run
//! use hpi_forecast::{run_analysis, AnalysisConfig};
//!
//! let config = AnalysisConfig {
//!     data_path: "UK-HPI-full-file-2023-01.csv".into(),
//!     ..AnalysisConfig::default()
//! };
//! let report = run_analysis(&config)?;
//! println!("{}", report);
//! report.write_artifacts(&config.output_dir)?;
//! # Ok::<(), hpi_forecast::AnalysisError>(())
//! ```

pub mod comparison;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod plot;
pub mod report;
pub mod split;

// Re-export commonly used types
pub use crate::comparison::{compare_lag_configs, BaselineComparator, ModelComparison, ModelRun};
pub use crate::config::{AnalysisConfig, SourceColumns};
pub use crate::data::{DataLoader, Observation, ObservationTable, RawTable};
pub use crate::error::{AnalysisError, Stage};
pub use crate::features::{FeatureRow, FeatureSet, LagFeatureBuilder, RowId};
pub use crate::metrics::{evaluate, Evaluation, Prediction};
pub use crate::models::{Coefficient, FittedModel, LagRegression};
pub use crate::pipeline::{run_analysis, run_on_table};
pub use crate::plot::ResidualPlot;
pub use crate::report::AnalysisReport;
pub use crate::split::{split_at, ChronologicalSplit, Subset};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
