//! Evaluation of a fitted model against a feature set

use crate::data::DATE_COLUMN;
use crate::error::{AnalysisError, Result};
use crate::features::FeatureSet;
use crate::models::FittedModel;
use crate::plot::ResidualPlot;
use chrono::NaiveDate;
use hpi_math::{mean_absolute_error, root_mean_squared_error, Summary};
use polars::prelude::*;
use std::fmt;

/// Prediction for one feature row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub date: NaiveDate,
    pub actual: f64,
    pub predicted: f64,
    /// `actual - predicted`
    pub residual: f64,
}

/// Predictions, residuals and accuracy metrics of a model on one feature set
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    lags: usize,
    predictions: Vec<Prediction>,
    mae: f64,
    rmse: f64,
    predicted_summary: Summary,
    actual_summary: Summary,
}

/// Score a model on a feature set built with the model's lag count
pub fn evaluate(model: &FittedModel, features: &FeatureSet) -> Result<Evaluation> {
    if features.is_empty() {
        return Err(AnalysisError::InsufficientHistory {
            rows: 0,
            lags: features.lags(),
            required: 1,
        });
    }

    let predicted = model.predict(features)?;
    let actual = features.targets();

    let predictions = features
        .rows()
        .iter()
        .zip(&predicted)
        .map(|(row, &p)| Prediction {
            date: row.id.date,
            actual: row.sales_volume,
            predicted: p,
            residual: row.sales_volume - p,
        })
        .collect();

    Ok(Evaluation {
        lags: model.lags(),
        predictions,
        mae: mean_absolute_error(&actual, &predicted)?,
        rmse: root_mean_squared_error(&actual, &predicted)?,
        predicted_summary: Summary::from_values(&predicted)?,
        actual_summary: Summary::from_values(&actual)?,
    })
}

impl Evaluation {
    pub fn lags(&self) -> usize {
        self.lags
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Mean absolute error
    pub fn mae(&self) -> f64 {
        self.mae
    }

    /// Root mean squared error
    pub fn rmse(&self) -> f64 {
        self.rmse
    }

    pub fn predicted_summary(&self) -> &Summary {
        &self.predicted_summary
    }

    pub fn actual_summary(&self) -> &Summary {
        &self.actual_summary
    }

    pub fn residuals(&self) -> Vec<f64> {
        self.predictions.iter().map(|p| p.residual).collect()
    }

    /// Residual-vs-fitted scatter of this evaluation
    pub fn residual_plot(&self, title: impl Into<String>) -> ResidualPlot {
        ResidualPlot::new(
            title,
            self.predictions
                .iter()
                .map(|p| (p.predicted, p.residual))
                .collect(),
        )
    }

    /// Side-by-side summary of predicted and actual values
    pub fn summary_frame(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            Series::new("statistic", Summary::LABELS.to_vec()),
            Series::new("predicted", self.predicted_summary.as_array().to_vec()),
            Series::new("actual", self.actual_summary.as_array().to_vec()),
        ])?)
    }

    /// Per-row predictions table
    pub fn predictions_frame(&self) -> Result<DataFrame> {
        let p = &self.predictions;
        Ok(DataFrame::new(vec![
            Series::new(
                DATE_COLUMN,
                p.iter().map(|r| r.date.to_string()).collect::<Vec<_>>(),
            ),
            Series::new("actual", p.iter().map(|r| r.actual).collect::<Vec<_>>()),
            Series::new(
                "predicted",
                p.iter().map(|r| r.predicted).collect::<Vec<_>>(),
            ),
            Series::new("residual", p.iter().map(|r| r.residual).collect::<Vec<_>>()),
        ])?)
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows evaluated: {}", self.len())?;
        writeln!(f, "  MAE:  {:.2}", self.mae)?;
        writeln!(f, "  RMSE: {:.2}", self.rmse)?;
        writeln!(f, "Predicted:")?;
        write!(f, "{}", self.predicted_summary)?;
        writeln!(f, "Actual:")?;
        write!(f, "{}", self.actual_summary)
    }
}
