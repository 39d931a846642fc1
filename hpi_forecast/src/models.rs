//! Least-squares regression of sales volume on its own lags

use crate::data::SALES_VOLUME_COLUMN;
use crate::error::{AnalysisError, Result};
use crate::features::{FeatureRow, FeatureSet};
use hpi_math::{MathError, OlsFit, OrdinaryLeastSquares};
use polars::prelude::*;
use std::fmt;
use tracing::{info, warn};

/// Term name of the intercept in coefficient tables
pub const INTERCEPT_TERM: &str = "(Intercept)";

/// One estimated parameter with its inference statistics
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    pub term: String,
    pub estimate: f64,
    /// `None` when the fit leaves no residual degrees of freedom
    pub std_error: Option<f64>,
    pub t_value: Option<f64>,
    pub p_value: Option<f64>,
}

/// Overall significance test of a fitted model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FStatistic {
    pub value: f64,
    pub numerator_df: usize,
    pub denominator_df: usize,
    pub p_value: f64,
}

/// Fits `sales_volume ~ sales_volume_lag_1 + ... + sales_volume_lag_k`
#[derive(Debug, Clone, Copy, Default)]
pub struct LagRegression {
    ols: OrdinaryLeastSquares,
}

impl LagRegression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the relative pivot tolerance used to detect collinearity
    pub fn with_tolerance(tolerance: f64) -> Result<Self> {
        Ok(Self {
            ols: OrdinaryLeastSquares::new().with_tolerance(tolerance)?,
        })
    }

    /// Fit the model on every complete row of a feature set
    pub fn fit(&self, features: &FeatureSet) -> Result<FittedModel> {
        let lags = features.lags();
        let (x, y): (Vec<Vec<f64>>, Vec<f64>) = features
            .rows()
            .iter()
            .filter(|r| r.sales_volume.is_finite() && r.lags.iter().all(|v| v.is_finite()))
            .map(|r| (r.lags.clone(), r.sales_volume))
            .unzip();

        let dropped = features.len() - y.len();
        if dropped > 0 {
            warn!(dropped, "dropped feature rows with missing values before fitting");
        }

        let required = lags + 1;
        if y.len() < required {
            return Err(AnalysisError::InsufficientHistory {
                rows: y.len(),
                lags,
                required,
            });
        }

        let names = features.predictor_names();
        let fit = self.ols.fit(&x, &y).map_err(|e| match e {
            MathError::RankDeficient { column } => AnalysisError::RankDeficient {
                term: term_name(column, &names),
            },
            other => AnalysisError::from(other),
        })?;

        let model = FittedModel::from_fit(lags, &names, fit)?;
        info!(
            lags,
            n_obs = model.n_obs(),
            r_squared = model.r_squared(),
            "fitted lag regression"
        );
        Ok(model)
    }
}

fn term_name(column: usize, predictors: &[String]) -> String {
    match column {
        0 => INTERCEPT_TERM.to_string(),
        c => predictors
            .get(c - 1)
            .cloned()
            .unwrap_or_else(|| format!("column {}", c)),
    }
}

/// An ordinary-least-squares model over lagged sales volumes
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    lags: usize,
    intercept: Coefficient,
    coefficients: Vec<Coefficient>,
    f_statistic: Option<FStatistic>,
    fit: OlsFit,
}

impl FittedModel {
    fn from_fit(lags: usize, predictors: &[String], fit: OlsFit) -> Result<Self> {
        let std_errors = fit.std_errors();
        let t_values = fit.t_values();
        let p_values = fit.p_values()?;

        let mut terms: Vec<Coefficient> = fit
            .coefficients()
            .iter()
            .enumerate()
            .map(|(i, &estimate)| Coefficient {
                term: term_name(i, predictors),
                estimate,
                std_error: std_errors.as_ref().map(|v| v[i]),
                t_value: t_values.as_ref().map(|v| v[i]),
                p_value: p_values.as_ref().map(|v| v[i]),
            })
            .collect();
        let intercept = terms.remove(0);

        let f_statistic = match (fit.f_statistic(), fit.f_p_value()?) {
            (Some((value, numerator_df, denominator_df)), Some(p_value)) => Some(FStatistic {
                value,
                numerator_df,
                denominator_df,
                p_value,
            }),
            _ => None,
        };

        Ok(Self {
            lags,
            intercept,
            coefficients: terms,
            f_statistic,
            fit,
        })
    }

    /// Lag count the model was fitted with
    pub fn lags(&self) -> usize {
        self.lags
    }

    pub fn intercept(&self) -> &Coefficient {
        &self.intercept
    }

    /// Predictor coefficients, `sales_volume_lag_1` first
    pub fn coefficients(&self) -> &[Coefficient] {
        &self.coefficients
    }

    /// Look up a term by name, including the intercept
    pub fn coefficient(&self, term: &str) -> Option<&Coefficient> {
        std::iter::once(&self.intercept)
            .chain(&self.coefficients)
            .find(|c| c.term == term)
    }

    pub fn r_squared(&self) -> f64 {
        self.fit.r_squared()
    }

    pub fn adj_r_squared(&self) -> Option<f64> {
        self.fit.adj_r_squared()
    }

    pub fn residual_std_error(&self) -> Option<f64> {
        self.fit.residual_std_error()
    }

    pub fn f_statistic(&self) -> Option<FStatistic> {
        self.f_statistic
    }

    pub fn n_obs(&self) -> usize {
        self.fit.n_obs()
    }

    pub fn df_residual(&self) -> usize {
        self.fit.df_residual()
    }

    /// In-sample fitted values, in the order of the rows used for fitting
    pub fn fitted_values(&self) -> &[f64] {
        self.fit.fitted_values()
    }

    /// Predict one feature row
    pub fn predict_row(&self, row: &FeatureRow) -> Result<f64> {
        if row.lags.len() != self.lags {
            return Err(AnalysisError::LagMismatch {
                expected: self.lags,
                found: row.lags.len(),
            });
        }
        Ok(self.fit.predict(&row.lags)?)
    }

    /// Predict every row of a feature set built with the same lag count
    pub fn predict(&self, features: &FeatureSet) -> Result<Vec<f64>> {
        if features.lags() != self.lags {
            return Err(AnalysisError::LagMismatch {
                expected: self.lags,
                found: features.lags(),
            });
        }
        features.rows().iter().map(|r| self.predict_row(r)).collect()
    }

    /// Coefficient table as a DataFrame
    pub fn summary_frame(&self) -> Result<DataFrame> {
        let terms: Vec<&Coefficient> = std::iter::once(&self.intercept)
            .chain(&self.coefficients)
            .collect();

        Ok(DataFrame::new(vec![
            Series::new(
                "term",
                terms.iter().map(|c| c.term.as_str()).collect::<Vec<_>>(),
            ),
            Series::new(
                "estimate",
                terms.iter().map(|c| c.estimate).collect::<Vec<_>>(),
            ),
            Series::new(
                "std_error",
                terms.iter().map(|c| c.std_error).collect::<Vec<_>>(),
            ),
            Series::new(
                "t_value",
                terms.iter().map(|c| c.t_value).collect::<Vec<_>>(),
            ),
            Series::new(
                "p_value",
                terms.iter().map(|c| c.p_value).collect::<Vec<_>>(),
            ),
        ])?)
    }
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "NA".to_string(), |v| format!("{:.*}", precision, v))
}

impl fmt::Display for FittedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formula = self
            .coefficients
            .iter()
            .map(|c| c.term.as_str())
            .collect::<Vec<_>>()
            .join(" + ");
        writeln!(f, "Formula: {} ~ {}", SALES_VOLUME_COLUMN, formula)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<22} {:>14} {:>14} {:>10} {:>10}",
            "Term", "Estimate", "Std. Error", "t value", "Pr(>|t|)"
        )?;
        for c in std::iter::once(&self.intercept).chain(&self.coefficients) {
            writeln!(
                f,
                "{:<22} {:>14.4} {:>14} {:>10} {:>10}",
                c.term,
                c.estimate,
                fmt_opt(c.std_error, 4),
                fmt_opt(c.t_value, 3),
                fmt_opt(c.p_value, 4)
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Residual standard error: {} on {} degrees of freedom",
            fmt_opt(self.residual_std_error(), 2),
            self.df_residual()
        )?;
        writeln!(
            f,
            "Multiple R-squared: {:.4}, Adjusted R-squared: {}",
            self.r_squared(),
            fmt_opt(self.adj_r_squared(), 4)
        )?;
        match self.f_statistic {
            Some(fs) => writeln!(
                f,
                "F-statistic: {:.2} on {} and {} DF, p-value: {:.4e}",
                fs.value, fs.numerator_df, fs.denominator_df, fs.p_value
            ),
            None => writeln!(f, "F-statistic: NA"),
        }
    }
}
