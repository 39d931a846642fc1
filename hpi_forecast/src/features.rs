//! Lagged feature construction
//!
//! Lags are positional: after sorting by date, `sales_volume_lag_i` of a
//! row is the target value `i` rows earlier. A gap in the monthly series
//! therefore shifts the window by one row, not by one calendar month.
//! Rows are only emitted when the target and every lag are present, which
//! always removes the first `lags` rows of a series.
//!
//! The identifier fields (`date`, `region`) live in [`RowId`] and never
//! reach the predictor vector, so a fitted model cannot pick them up.

use crate::data::{ObservationTable, DATE_COLUMN, REGION_COLUMN, SALES_VOLUME_COLUMN};
use crate::error::{AnalysisError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use tracing::debug;

/// Column name of the `lag`-th lagged target
pub fn lag_column_name(lag: usize) -> String {
    format!("{}_lag_{}", SALES_VOLUME_COLUMN, lag)
}

/// Identifier fields of a feature row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowId {
    pub date: NaiveDate,
    pub region: String,
}

/// A target value with its complete set of lagged predictors
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub id: RowId,
    /// Target value
    pub sales_volume: f64,
    /// `lags[i - 1]` is `sales_volume_lag_i`
    pub lags: Vec<f64>,
    /// Source date of each lag, same indexing as `lags`
    pub lag_dates: Vec<NaiveDate>,
}

impl FeatureRow {
    /// Value of `sales_volume_lag_{lag}`, 1-based
    pub fn lag(&self, lag: usize) -> Option<f64> {
        lag.checked_sub(1).and_then(|i| self.lags.get(i).copied())
    }
}

/// Feature rows produced by one builder configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    lags: usize,
    rows: Vec<FeatureRow>,
}

impl FeatureSet {
    /// Assemble a set from rows built elsewhere
    pub fn from_rows(lags: usize, rows: Vec<FeatureRow>) -> Result<Self> {
        if let Some(bad) = rows
            .iter()
            .find(|r| r.lags.len() != lags || r.lag_dates.len() != lags)
        {
            return Err(AnalysisError::LagMismatch {
                expected: lags,
                found: bad.lags.len(),
            });
        }
        Ok(Self { lags, rows })
    }

    /// Number of lags each row carries
    pub fn lags(&self) -> usize {
        self.lags
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Predictor names in column order
    pub fn predictor_names(&self) -> Vec<String> {
        (1..=self.lags).map(lag_column_name).collect()
    }

    pub fn targets(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.sales_volume).collect()
    }

    /// Predictor matrix, one row per feature row
    pub fn predictors(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.lags.clone()).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.id.date).collect()
    }

    /// Export to a DataFrame: identifiers, target, then one column per lag
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![
            Series::new(
                DATE_COLUMN,
                self.rows
                    .iter()
                    .map(|r| r.id.date.to_string())
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                REGION_COLUMN,
                self.rows
                    .iter()
                    .map(|r| r.id.region.as_str())
                    .collect::<Vec<_>>(),
            ),
            Series::new(SALES_VOLUME_COLUMN, self.targets()),
        ];
        for lag in 1..=self.lags {
            let values: Vec<f64> = self.rows.iter().map(|r| r.lags[lag - 1]).collect();
            columns.push(Series::new(&lag_column_name(lag), values));
        }

        Ok(DataFrame::new(columns)?)
    }
}

/// Builds lagged feature rows from an observation table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagFeatureBuilder {
    lags: usize,
}

impl LagFeatureBuilder {
    pub fn new(lags: usize) -> Result<Self> {
        if lags == 0 {
            return Err(AnalysisError::InvalidParameter(
                "lag count must be at least 1".to_string(),
            ));
        }
        Ok(Self { lags })
    }

    pub fn lags(&self) -> usize {
        self.lags
    }

    /// Sort the table by date and emit every row with a complete feature
    /// vector. Tables shorter than `lags + 1` rows give an empty set.
    pub fn build(&self, table: &ObservationTable) -> FeatureSet {
        let sorted = table.sorted_by_date();
        let obs = sorted.observations();

        let rows: Vec<FeatureRow> = obs
            .iter()
            .enumerate()
            .skip(self.lags)
            .filter_map(|(pos, current)| {
                let target = current.sales_volume?;
                let window = &obs[pos - self.lags..pos];
                let lags = window
                    .iter()
                    .rev()
                    .map(|o| o.sales_volume.map(|v| v as f64))
                    .collect::<Option<Vec<f64>>>()?;
                let lag_dates = window.iter().rev().map(|o| o.date).collect();

                Some(FeatureRow {
                    id: RowId {
                        date: current.date,
                        region: current.region.clone(),
                    },
                    sales_volume: target as f64,
                    lags,
                    lag_dates,
                })
            })
            .collect();

        debug!(
            lags = self.lags,
            input_rows = obs.len(),
            feature_rows = rows.len(),
            "built lag features"
        );

        FeatureSet {
            lags: self.lags,
            rows,
        }
    }
}
