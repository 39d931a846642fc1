//! Error types for the hpi_forecast crate

use crate::Subset;
use hpi_math::MathError;
use polars::prelude::PolarsError;
use std::fmt;
use thiserror::Error;

/// Pipeline stage an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Filter,
    Split,
    Features,
    Fit,
    Evaluate,
    Baseline,
    Artifacts,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Filter => "region filter",
            Stage::Split => "chronological split",
            Stage::Features => "feature building",
            Stage::Fit => "model fit",
            Stage::Evaluate => "evaluation",
            Stage::Baseline => "baseline comparison",
            Stage::Artifacts => "artifact output",
        };
        f.write_str(name)
    }
}

/// Custom error types for the hpi_forecast crate
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// The source file could not be read as a table
    #[error("Load error: {0}")]
    LoadError(String),

    /// A required source column is absent
    #[error("Missing column '{0}' in source data")]
    MissingColumn(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Filtering produced no rows
    #[error("Empty result: {0}")]
    EmptyResult(String),

    /// Too few complete feature rows to fit the requested lag model
    #[error("Insufficient history: {rows} complete rows for a {lags}-lag model (need {required})")]
    InsufficientHistory {
        rows: usize,
        lags: usize,
        required: usize,
    },

    /// Predictors are collinear
    #[error("Rank-deficient fit: predictor '{term}' is collinear with earlier terms")]
    RankDeficient { term: String },

    /// A model was applied to features built with a different lag count
    #[error("Lag mismatch: model expects {expected} lags, features have {found}")]
    LagMismatch { expected: usize, found: usize },

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from mathematical operations
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from chart rendering
    #[error("Plot error: {0}")]
    PlotError(String),

    /// Error in analysis configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// An error annotated with the stage and subset it occurred in
    #[error("{stage} failed{}: {source}", subset_suffix(.subset))]
    Stage {
        stage: Stage,
        subset: Option<Subset>,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// The innermost error, skipping stage annotations
    pub fn root_cause(&self) -> &AnalysisError {
        match self {
            AnalysisError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn subset_suffix(subset: &Option<Subset>) -> String {
    subset
        .map(|s| format!(" for {} subset", s))
        .unwrap_or_default()
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl From<PolarsError> for AnalysisError {
    fn from(err: PolarsError) -> Self {
        AnalysisError::PolarsError(err.to_string())
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::ConfigError(err.to_string())
    }
}

/// Attach stage context to a result
pub trait StageContext<T> {
    fn stage(self, stage: Stage, subset: Option<Subset>) -> Result<T>;
}

impl<T> StageContext<T> for Result<T> {
    fn stage(self, stage: Stage, subset: Option<Subset>) -> Result<T> {
        self.map_err(|source| AnalysisError::Stage {
            stage,
            subset,
            source: Box::new(source),
        })
    }
}
