//! Residual-vs-fitted diagnostic plots

use crate::error::{AnalysisError, Result};
use plotters::prelude::*;
use std::path::Path;

/// Scatter of `(predicted, residual)` points with a reference line at zero
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualPlot {
    title: String,
    points: Vec<(f64, f64)>,
}

impl ResidualPlot {
    pub fn new(title: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            title: title.into(),
            points,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Horizontal axis bounds, padded by 5%
    pub fn x_range(&self) -> (f64, f64) {
        padded(self.points.iter().map(|p| p.0))
    }

    /// Vertical axis bounds; always contains zero
    pub fn y_range(&self) -> (f64, f64) {
        padded(self.points.iter().map(|p| p.1).chain(std::iter::once(0.0)))
    }

    /// Endpoints of the `residual = 0` line across the horizontal axis
    pub fn reference_line(&self) -> [(f64, f64); 2] {
        let (x0, x1) = self.x_range();
        [(x0, 0.0), (x1, 0.0)]
    }

    /// Draw the plot into an SVG file
    pub fn render_svg<P: AsRef<Path>>(&self, path: P, size: (u32, u32)) -> Result<()> {
        if self.points.is_empty() {
            return Err(AnalysisError::PlotError(format!(
                "'{}' has no points to draw",
                self.title
            )));
        }

        let root = SVGBackend::new(path.as_ref(), size).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;

        let (x0, x1) = self.x_range();
        let (y0, y1) = self.y_range();
        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(plot_err)?;

        chart
            .configure_mesh()
            .x_desc("Predicted sales volume")
            .y_desc("Residual")
            .draw()
            .map_err(plot_err)?;

        chart
            .draw_series(
                self.points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, BLUE.mix(0.6).filled())),
            )
            .map_err(plot_err)?;

        chart
            .draw_series(LineSeries::new(self.reference_line(), RED.stroke_width(2)))
            .map_err(plot_err)?;

        root.present().map_err(plot_err)?;
        Ok(())
    }
}

fn plot_err<E: std::fmt::Display>(err: E) -> AnalysisError {
    AnalysisError::PlotError(err.to_string())
}

fn padded(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.05 };
    (lo - pad, hi + pad)
}
