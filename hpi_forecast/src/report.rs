//! Human-readable report and on-disk artifacts of an analysis run

use crate::comparison::{ModelComparison, ModelRun};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result, Stage, StageContext};
use crate::metrics::Evaluation;
use crate::split::Subset;
use chrono::NaiveDate;
use polars::prelude::*;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything an analysis run produced
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub config: AnalysisConfig,
    /// Rows left after the region filter
    pub observations: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub training_rows: usize,
    pub test_rows: usize,
    pub comparison: ModelComparison,
    /// Training model scored on the test subset, when requested
    pub holdout: Option<Evaluation>,
}

impl AnalysisReport {
    /// All model runs, primary first
    pub fn runs(&self) -> impl Iterator<Item = &ModelRun> {
        self.comparison
            .primary_runs()
            .iter()
            .chain(self.comparison.baseline_runs())
    }

    /// Write one residual plot and one predictions CSV per model run
    pub fn write_artifacts<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .map_err(AnalysisError::from)
            .stage(Stage::Artifacts, None)?;

        let mut written = Vec::new();
        for run in self.runs() {
            let stem = format!("{}_lag{}", run.subset, run.lags());
            written.push(self.write_plot(dir, &stem, &run.evaluation, Some(run.subset))?);
            written.push(write_predictions(dir, &stem, &run.evaluation, Some(run.subset))?);
        }
        if let Some(holdout) = &self.holdout {
            let stem = format!("holdout_lag{}", holdout.lags());
            written.push(self.write_plot(dir, &stem, holdout, Some(Subset::Test))?);
            written.push(write_predictions(dir, &stem, holdout, Some(Subset::Test))?);
        }

        info!(files = written.len(), dir = %dir.display(), "wrote artifacts");
        Ok(written)
    }

    fn write_plot(
        &self,
        dir: &Path,
        stem: &str,
        evaluation: &Evaluation,
        subset: Option<Subset>,
    ) -> Result<PathBuf> {
        let path = dir.join(format!("residuals_{}.svg", stem));
        let title = format!("Residuals vs fitted: {}", stem.replace('_', " "));
        evaluation
            .residual_plot(title)
            .render_svg(&path, self.config.plot_size)
            .stage(Stage::Artifacts, subset)?;
        Ok(path)
    }
}

fn write_predictions(
    dir: &Path,
    stem: &str,
    evaluation: &Evaluation,
    subset: Option<Subset>,
) -> Result<PathBuf> {
    let path = dir.join(format!("predictions_{}.csv", stem));
    let write = || -> Result<()> {
        let mut frame = evaluation.predictions_frame()?;
        let mut file = File::create(&path)?;
        CsvWriter::new(&mut file)
            .has_header(true)
            .finish(&mut frame)?;
        Ok(())
    };
    write().stage(Stage::Artifacts, subset)?;
    Ok(path)
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(72);
        writeln!(f, "{}", rule)?;
        writeln!(f, "Sales volume lag regression: {}", self.config.region)?;
        writeln!(f, "{}", rule)?;
        if let Some((first, last)) = self.date_range {
            writeln!(f, "Observations: {} ({} to {})", self.observations, first, last)?;
        }
        writeln!(
            f,
            "Training: {} rows up to {}; test: {} rows from {}",
            self.training_rows,
            self.config.training_end,
            self.test_rows,
            self.config
                .test_start()
                .map_or_else(|| "-".to_string(), |d| d.to_string())
        )?;

        for run in self.runs() {
            writeln!(f)?;
            writeln!(f, "--- {} subset, {} lags ---", run.subset, run.lags())?;
            write!(f, "{}", run.model)?;
            writeln!(f)?;
            write!(f, "{}", run.evaluation)?;
        }

        if let Some(holdout) = &self.holdout {
            writeln!(f)?;
            writeln!(
                f,
                "--- training model ({} lags) scored on test subset ---",
                holdout.lags()
            )?;
            write!(f, "{}", holdout)?;
        }

        writeln!(f)?;
        writeln!(f, "--- lag comparison ---")?;
        write!(f, "{}", self.comparison)
    }
}
