//! Ordinary least squares regression
//!
//! The fit is computed from a thin QR decomposition of the design matrix
//! rather than the normal equations, so collinear predictors show up as a
//! vanishing diagonal entry of `R` and can be reported instead of
//! producing a meaningless coefficient vector.

use crate::{MathError, Result};
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

/// Relative pivot tolerance used to detect collinear columns.
pub const DEFAULT_TOLERANCE: f64 = 1e-7;

/// Ordinary least squares estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrdinaryLeastSquares {
    fit_intercept: bool,
    tolerance: f64,
}

impl Default for OrdinaryLeastSquares {
    fn default() -> Self {
        Self::new()
    }
}

impl OrdinaryLeastSquares {
    /// Create an estimator that fits an intercept
    pub fn new() -> Self {
        Self {
            fit_intercept: true,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Enable or disable the intercept column
    pub fn with_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Override the collinearity tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Result<Self> {
        if !(tolerance > 0.0 && tolerance < 1.0) {
            return Err(MathError::InvalidInput(format!(
                "Tolerance must be in (0, 1), got {}",
                tolerance
            )));
        }
        self.tolerance = tolerance;
        Ok(self)
    }

    /// Whether an intercept column is prepended to the design matrix
    pub fn fits_intercept(&self) -> bool {
        self.fit_intercept
    }

    /// Fit `y ~ x` where each entry of `x` is one observation's predictor row
    pub fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<OlsFit> {
        if x.len() != y.len() {
            return Err(MathError::InvalidInput(format!(
                "Predictor rows ({}) and response values ({}) differ in length",
                x.len(),
                y.len()
            )));
        }

        let n = y.len();
        let n_predictors = x.first().map_or(0, Vec::len);
        if let Some(row) = x.iter().position(|row| row.len() != n_predictors) {
            return Err(MathError::InvalidInput(format!(
                "Row {} has {} predictors, expected {}",
                row,
                x[row].len(),
                n_predictors
            )));
        }
        if y.iter().chain(x.iter().flatten()).any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Design matrix contains non-finite values".to_string(),
            ));
        }

        let offset = usize::from(self.fit_intercept);
        let p = n_predictors + offset;
        if p == 0 {
            return Err(MathError::InvalidInput(
                "Model has no parameters to estimate".to_string(),
            ));
        }
        if n < p {
            return Err(MathError::InsufficientData(format!(
                "{} observations for {} parameters",
                n, p
            )));
        }

        let design = DMatrix::from_fn(n, p, |i, j| {
            if self.fit_intercept && j == 0 {
                1.0
            } else {
                x[i][j - offset]
            }
        });
        let response = DVector::from_column_slice(y);

        let qr = design.clone().qr();
        let q = qr.q();
        let r = qr.r();

        for j in 0..p {
            let column_norm = design.column(j).norm();
            if r[(j, j)].abs() <= self.tolerance * column_norm {
                return Err(MathError::RankDeficient { column: j });
            }
        }

        let qty = q.transpose() * &response;
        let beta = r.solve_upper_triangular(&qty).ok_or_else(|| {
            MathError::CalculationError("Triangular solve failed".to_string())
        })?;

        // diag((X'X)^-1) = row norms of R^-1
        let r_inv = r.try_inverse().ok_or_else(|| {
            MathError::CalculationError("R factor is not invertible".to_string())
        })?;
        let unscaled_variances = (0..p).map(|j| r_inv.row(j).norm_squared()).collect();

        let fitted = &design * &beta;
        let residuals = &response - &fitted;
        let rss = residuals.norm_squared();
        let tss = if self.fit_intercept {
            let mean = response.mean();
            response.iter().map(|v| (v - mean).powi(2)).sum()
        } else {
            response.norm_squared()
        };

        Ok(OlsFit {
            coefficients: beta.iter().copied().collect(),
            fit_intercept: self.fit_intercept,
            unscaled_variances,
            fitted: fitted.iter().copied().collect(),
            residuals: residuals.iter().copied().collect(),
            rss,
            tss,
            n_obs: n,
        })
    }
}

/// A fitted least-squares model with its inference statistics
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    /// Parameter estimates, intercept first when fitted
    coefficients: Vec<f64>,
    fit_intercept: bool,
    /// Diagonal of `(X'X)^-1`
    unscaled_variances: Vec<f64>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    rss: f64,
    tss: f64,
    n_obs: usize,
}

impl OlsFit {
    /// All parameter estimates, intercept first when one was fitted
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Intercept estimate, if the model has one
    pub fn intercept(&self) -> Option<f64> {
        self.fit_intercept.then(|| self.coefficients[0])
    }

    /// Estimates for the predictor columns only
    pub fn slopes(&self) -> &[f64] {
        &self.coefficients[self.offset()..]
    }

    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    pub fn n_params(&self) -> usize {
        self.coefficients.len()
    }

    pub fn df_residual(&self) -> usize {
        self.n_obs - self.n_params()
    }

    /// Residual sum of squares
    pub fn rss(&self) -> f64 {
        self.rss
    }

    /// Coefficient of determination; NaN when the response has no variance
    pub fn r_squared(&self) -> f64 {
        if self.tss > 0.0 {
            1.0 - self.rss / self.tss
        } else {
            f64::NAN
        }
    }

    /// R-squared adjusted for the number of predictors
    pub fn adj_r_squared(&self) -> Option<f64> {
        let df = self.df_residual();
        if df == 0 {
            return None;
        }
        let n_adj = (self.n_obs - self.offset()) as f64;
        Some(1.0 - (1.0 - self.r_squared()) * n_adj / df as f64)
    }

    /// Residual standard error, undefined for an exact fit
    pub fn residual_std_error(&self) -> Option<f64> {
        self.sigma_squared().map(f64::sqrt)
    }

    /// Standard error of each parameter estimate
    pub fn std_errors(&self) -> Option<Vec<f64>> {
        let sigma_squared = self.sigma_squared()?;
        Some(
            self.unscaled_variances
                .iter()
                .map(|v| (sigma_squared * v).sqrt())
                .collect(),
        )
    }

    /// t statistic of each parameter estimate
    pub fn t_values(&self) -> Option<Vec<f64>> {
        let std_errors = self.std_errors()?;
        Some(
            self.coefficients
                .iter()
                .zip(std_errors)
                .map(|(b, se)| b / se)
                .collect(),
        )
    }

    /// Two-sided p-value of each parameter estimate
    pub fn p_values(&self) -> Result<Option<Vec<f64>>> {
        let Some(t_values) = self.t_values() else {
            return Ok(None);
        };
        let dist = StudentsT::new(0.0, 1.0, self.df_residual() as f64)
            .map_err(|e| MathError::CalculationError(e.to_string()))?;
        Ok(Some(
            t_values
                .into_iter()
                .map(|t| two_sided_p_value(&dist, t))
                .collect(),
        ))
    }

    /// Overall F statistic with its numerator and denominator degrees of freedom
    pub fn f_statistic(&self) -> Option<(f64, usize, usize)> {
        let numerator_df = self.n_params() - self.offset();
        let denominator_df = self.df_residual();
        let sigma_squared = self.sigma_squared()?;
        if numerator_df == 0 || sigma_squared <= 0.0 {
            return None;
        }
        let explained = (self.tss - self.rss) / numerator_df as f64;
        Some((explained / sigma_squared, numerator_df, denominator_df))
    }

    /// Upper-tail probability of the overall F statistic
    pub fn f_p_value(&self) -> Result<Option<f64>> {
        let Some((f, d1, d2)) = self.f_statistic() else {
            return Ok(None);
        };
        let dist = FisherSnedecor::new(d1 as f64, d2 as f64)
            .map_err(|e| MathError::CalculationError(e.to_string()))?;
        Ok(Some(1.0 - dist.cdf(f)))
    }

    /// Predict the response for one predictor row
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        let slopes = self.slopes();
        if row.len() != slopes.len() {
            return Err(MathError::InvalidInput(format!(
                "Expected {} predictors, got {}",
                slopes.len(),
                row.len()
            )));
        }
        let linear: f64 = slopes.iter().zip(row).map(|(b, x)| b * x).sum();
        Ok(self.intercept().unwrap_or(0.0) + linear)
    }

    fn offset(&self) -> usize {
        usize::from(self.fit_intercept)
    }

    fn sigma_squared(&self) -> Option<f64> {
        let df = self.df_residual();
        (df > 0).then(|| self.rss / df as f64)
    }
}

/// Two-sided tail probability of `t`. A zero estimate over a zero standard
/// error has no defined t value, so its p-value is NaN.
fn two_sided_p_value(dist: &StudentsT, t: f64) -> f64 {
    if t.is_nan() {
        f64::NAN
    } else if t.is_infinite() {
        0.0
    } else {
        2.0 * (1.0 - dist.cdf(t.abs()))
    }
}
