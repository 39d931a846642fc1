//! End-to-end analysis run
//!
//! Stages execute strictly in order: load, region filter, chronological
//! split, primary lag models on each subset, optional holdout scoring, and
//! the baseline comparison. The first failing stage aborts the run.

use crate::comparison::{fit_and_evaluate, BaselineComparator, ModelRun};
use crate::config::AnalysisConfig;
use crate::data::{DataLoader, RawTable};
use crate::error::{AnalysisError, Result, Stage, StageContext};
use crate::features::LagFeatureBuilder;
use crate::metrics::{evaluate, Evaluation};
use crate::report::AnalysisReport;
use crate::split::{split_at, ChronologicalSplit, Subset};
use tracing::{info, info_span};

/// Run the full analysis described by a configuration
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;
    let raw = DataLoader::from_csv(&config.data_path, &config.source_columns)
        .stage(Stage::Load, None)?;
    run_on_table(&raw, config)
}

/// Run every stage after loading on an already-loaded source table
pub fn run_on_table(raw: &RawTable, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;
    let _span = info_span!("analysis", region = %config.region).entered();

    let table = raw
        .filter_region(&config.region)
        .stage(Stage::Filter, None)?;
    let date_range = table.date_range();
    info!(rows = table.len(), "filtered to region");

    let split = split_at(&table, config.training_end)
        .and_then(|split| split.require_non_empty().map(|_| split))
        .stage(Stage::Split, None)?;
    info!(
        training_rows = split.training.len(),
        test_rows = split.test.len(),
        "split at {}",
        config.training_end
    );

    let primary = Subset::ALL
        .iter()
        .map(|&subset| fit_and_evaluate(subset, split.get(subset), config.primary_lags))
        .collect::<Result<Vec<_>>>()?;

    let holdout = if config.evaluate_holdout {
        Some(holdout_evaluation(&split, &primary)?)
    } else {
        None
    };

    let comparison = BaselineComparator::new(config.baseline_lags)
        .stage(Stage::Baseline, None)?
        .compare(&split, primary)?;

    Ok(AnalysisReport {
        config: config.clone(),
        observations: table.len(),
        date_range,
        training_rows: split.training.len(),
        test_rows: split.test.len(),
        comparison,
        holdout,
    })
}

/// Score the training model on the test subset's features
fn holdout_evaluation(split: &ChronologicalSplit, primary: &[ModelRun]) -> Result<Evaluation> {
    let training_run = primary
        .iter()
        .find(|r| r.subset == Subset::Training)
        .ok_or_else(|| {
            AnalysisError::InvalidParameter("no training model to score".to_string())
        })?;
    let builder = LagFeatureBuilder::new(training_run.lags())
        .stage(Stage::Features, Some(Subset::Test))?;
    let evaluation = evaluate(&training_run.model, &builder.build(&split.test))
        .stage(Stage::Evaluate, Some(Subset::Test))?;
    info!(mae = evaluation.mae(), "holdout evaluation of training model");
    Ok(evaluation)
}
