//! Fit-and-evaluate runs and the lag-count baseline comparison
//!
//! Every run fits and evaluates on the same subset. The baseline therefore
//! measures in-sample fit of a one-lag model next to the primary model,
//! not out-of-sample accuracy.

use crate::data::ObservationTable;
use crate::error::{AnalysisError, Result, Stage, StageContext};
use crate::features::LagFeatureBuilder;
use crate::metrics::{evaluate, Evaluation};
use crate::models::{FittedModel, LagRegression};
use crate::split::{ChronologicalSplit, Subset};
use polars::prelude::*;
use std::fmt;
use tracing::info;

/// A model fitted on one subset together with its evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRun {
    pub subset: Subset,
    pub model: FittedModel,
    pub evaluation: Evaluation,
}

impl ModelRun {
    pub fn lags(&self) -> usize {
        self.model.lags()
    }
}

/// Build features, fit and evaluate one lag configuration on one subset
pub fn fit_and_evaluate(
    subset: Subset,
    table: &ObservationTable,
    lags: usize,
) -> Result<ModelRun> {
    let builder = LagFeatureBuilder::new(lags).stage(Stage::Features, Some(subset))?;
    let model = LagRegression::new()
        .fit(&builder.build(table))
        .stage(Stage::Fit, Some(subset))?;

    // evaluation inputs come from a fresh application of the same builder
    let evaluation = evaluate(&model, &builder.build(table)).stage(Stage::Evaluate, Some(subset))?;

    info!(
        %subset,
        lags,
        r_squared = model.r_squared(),
        mae = evaluation.mae(),
        "evaluated lag model"
    );
    Ok(ModelRun {
        subset,
        model,
        evaluation,
    })
}

/// Refits each subset with a smaller lag count for comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaselineComparator {
    lags: usize,
}

impl BaselineComparator {
    pub fn new(lags: usize) -> Result<Self> {
        if lags == 0 {
            return Err(AnalysisError::InvalidParameter(
                "baseline lag count must be at least 1".to_string(),
            ));
        }
        Ok(Self { lags })
    }

    pub fn lags(&self) -> usize {
        self.lags
    }

    /// Fit the baseline on both subsets and pair it with the primary runs
    pub fn compare(
        &self,
        split: &ChronologicalSplit,
        primary: Vec<ModelRun>,
    ) -> Result<ModelComparison> {
        let primary_lags = primary.first().map(ModelRun::lags).ok_or_else(|| {
            AnalysisError::InvalidParameter("no primary runs to compare".to_string())
        })?;
        if primary_lags == self.lags {
            return Err(AnalysisError::InvalidParameter(format!(
                "baseline lag count {} equals the primary lag count",
                self.lags
            )));
        }

        let baseline = Subset::ALL
            .iter()
            .map(|&subset| {
                fit_and_evaluate(subset, split.get(subset), self.lags)
                    .stage(Stage::Baseline, Some(subset))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ModelComparison {
            primary_lags,
            baseline_lags: self.lags,
            primary,
            baseline,
        })
    }
}

/// Fit both lag configurations on both subsets
pub fn compare_lag_configs(
    split: &ChronologicalSplit,
    primary_lags: usize,
    baseline_lags: usize,
) -> Result<ModelComparison> {
    let primary = Subset::ALL
        .iter()
        .map(|&subset| fit_and_evaluate(subset, split.get(subset), primary_lags))
        .collect::<Result<Vec<_>>>()?;
    BaselineComparator::new(baseline_lags)?.compare(split, primary)
}

/// Primary and baseline runs side by side
#[derive(Debug, Clone, PartialEq)]
pub struct ModelComparison {
    primary_lags: usize,
    baseline_lags: usize,
    primary: Vec<ModelRun>,
    baseline: Vec<ModelRun>,
}

impl ModelComparison {
    pub fn primary_lags(&self) -> usize {
        self.primary_lags
    }

    pub fn baseline_lags(&self) -> usize {
        self.baseline_lags
    }

    pub fn primary_runs(&self) -> &[ModelRun] {
        &self.primary
    }

    pub fn baseline_runs(&self) -> &[ModelRun] {
        &self.baseline
    }

    /// The run for a subset and lag count, if one was made
    pub fn run(&self, subset: Subset, lags: usize) -> Option<&ModelRun> {
        self.primary
            .iter()
            .chain(&self.baseline)
            .find(|r| r.subset == subset && r.lags() == lags)
    }

    /// Primary R-squared minus baseline R-squared on a subset
    pub fn r_squared_gain(&self, subset: Subset) -> Option<f64> {
        let primary = self.run(subset, self.primary_lags)?;
        let baseline = self.run(subset, self.baseline_lags)?;
        Some(primary.model.r_squared() - baseline.model.r_squared())
    }

    /// One row per (subset, lag count)
    pub fn summary_frame(&self) -> Result<DataFrame> {
        let runs: Vec<&ModelRun> = self.primary.iter().chain(&self.baseline).collect();

        Ok(DataFrame::new(vec![
            Series::new("subset", runs.iter().map(|r| r.subset.as_str()).collect::<Vec<_>>()),
            Series::new("lags", runs.iter().map(|r| r.lags() as u32).collect::<Vec<_>>()),
            Series::new(
                "n_obs",
                runs.iter().map(|r| r.model.n_obs() as u32).collect::<Vec<_>>(),
            ),
            Series::new(
                "r_squared",
                runs.iter().map(|r| r.model.r_squared()).collect::<Vec<_>>(),
            ),
            Series::new(
                "adj_r_squared",
                runs.iter().map(|r| r.model.adj_r_squared()).collect::<Vec<_>>(),
            ),
            Series::new(
                "residual_std_error",
                runs.iter()
                    .map(|r| r.model.residual_std_error())
                    .collect::<Vec<_>>(),
            ),
            Series::new("mae", runs.iter().map(|r| r.evaluation.mae()).collect::<Vec<_>>()),
        ])?)
    }
}

impl fmt::Display for ModelComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.summary_frame() {
            Ok(frame) => writeln!(f, "{}", frame)?,
            Err(e) => writeln!(f, "(comparison table unavailable: {})", e)?,
        }
        for subset in Subset::ALL {
            if let Some(gain) = self.r_squared_gain(subset) {
                writeln!(
                    f,
                    "R-squared gain of {} lags over {} on {}: {:+.4}",
                    self.primary_lags, self.baseline_lags, subset, gain
                )?;
            }
        }
        Ok(())
    }
}
