//! # HPI Math
//!
//! Numerical building blocks for the house-price lag analysis.
//! This crate provides an ordinary-least-squares fit with the usual
//! inference statistics, plus the descriptive statistics and error
//! metrics used to evaluate a fitted model.

use thiserror::Error;

pub mod descriptive;
pub mod ols;

pub use descriptive::{mean_absolute_error, quantile, root_mean_squared_error, Summary};
pub use ols::{OlsFit, OrdinaryLeastSquares};

/// Errors that can occur in numerical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    /// A design-matrix column is a linear combination of earlier columns.
    #[error("Rank-deficient design matrix: column {column} is collinear with earlier columns")]
    RankDeficient { column: usize },
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, MathError>;
