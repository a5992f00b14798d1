//! Weighted Statistics
//!
//! Count-weighted mean, covariance, standard deviation and correlation over
//! spectrum columns. Degenerate inputs (zero total weight, zero variance) are
//! reported as [`SpectrumError::DivideByZero`] unless a caller explicitly opts
//! into NaN results through [`Degeneracy::Nan`].
//!
//! ```text
//! mean_w(x)   = Σ xᵢwᵢ / Σ wᵢ
//! cov_w(x, y) = Σ wᵢ (xᵢ - mean_w(x)) (yᵢ - mean_w(y)) / Σ wᵢ
//! std_w(x)    = sqrt(cov_w(x, x))
//! rho_w(x, y) = cov_w(x, y) / sqrt(cov_w(x, x) · cov_w(y, y))
//! ```

use crate::error::{SpectrumError, SpectrumResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;

/// FWHM / σ for a Gaussian, `2·sqrt(2·ln 2)`
pub const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949_4;

/// How degenerate statistics are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Degeneracy {
    /// Return `SpectrumError::DivideByZero`
    #[default]
    Error,
    /// Return NaN
    Nan,
}

/// Statistics settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Delta degrees of freedom; the second moment is scaled by `n / (n - ddof)`
    pub ddof: u32,
    /// Degenerate-input reporting
    pub degeneracy: Degeneracy,
}

/// Weighted statistics calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedStats {
    config: StatsConfig,
}

impl WeightedStats {
    pub fn new(config: StatsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    fn degenerate(&self, msg: impl Into<String>) -> SpectrumResult<f64> {
        match self.config.degeneracy {
            Degeneracy::Error => Err(SpectrumError::divide_by_zero(msg)),
            Degeneracy::Nan => Ok(f64::NAN),
        }
    }

    fn total_weight(&self, len: usize, w: &[f64]) -> SpectrumResult<f64> {
        if len != w.len() {
            return Err(SpectrumError::configuration(format!(
                "{} values for {} weights",
                len,
                w.len()
            )));
        }
        Ok(w.iter().sum())
    }

    /// Every value carrying weight is the same
    fn is_flat(values: &[f64], w: &[f64]) -> bool {
        let mut weighted = values.iter().zip(w).filter(|(_, wi)| **wi != 0.0).map(|(v, _)| v);
        match weighted.next() {
            Some(first) => weighted.all(|v| v == first),
            None => true,
        }
    }

    /// `Σ xᵢwᵢ / Σ wᵢ`
    pub fn mean(&self, x: &[f64], w: &[f64]) -> SpectrumResult<f64> {
        let sum_w = self.total_weight(x.len(), w)?;
        if sum_w == 0.0 {
            return self.degenerate("weighted mean with sum(w) == 0");
        }
        let sum_xw: f64 = x.iter().zip(w).map(|(xi, wi)| xi * wi).sum();
        Ok(sum_xw / sum_w)
    }

    /// Weighted covariance; `covariance(x, x, w)` is the weighted variance.
    pub fn covariance(&self, x: &[f64], y: &[f64], w: &[f64]) -> SpectrumResult<f64> {
        let sum_w = self.total_weight(x.len(), w)?;
        if y.len() != x.len() {
            return Err(SpectrumError::configuration(format!(
                "covariance of {} and {} values",
                x.len(),
                y.len()
            )));
        }
        if sum_w == 0.0 {
            return self.degenerate("weighted covariance with sum(w) == 0");
        }
        let n = x.len() as f64;
        let dof = n - self.config.ddof as f64;
        if dof <= 0.0 {
            return self.degenerate(format!(
                "{} rows leave no degrees of freedom for ddof = {}",
                x.len(),
                self.config.ddof
            ));
        }

        // exact zero instead of rounding residue from the mean
        if Self::is_flat(x, w) || Self::is_flat(y, w) {
            return Ok(0.0);
        }

        let mx = self.mean(x, w)?;
        let my = self.mean(y, w)?;
        let sum: f64 = x
            .iter()
            .zip(y)
            .zip(w)
            .map(|((xi, yi), wi)| wi * (xi - mx) * (yi - my))
            .sum();
        Ok(sum / (sum_w * dof / n))
    }

    pub fn variance(&self, x: &[f64], w: &[f64]) -> SpectrumResult<f64> {
        self.covariance(x, x, w)
    }

    /// `sqrt(covariance(x, x, w))`
    pub fn std(&self, x: &[f64], w: &[f64]) -> SpectrumResult<f64> {
        let var = self.variance(x, w)?;
        // negative weights can push the variance below zero
        Ok(if var < 0.0 { 0.0 } else { var.sqrt() })
    }

    /// Weighted Pearson correlation; zero marginal variance is degenerate.
    pub fn correlation(&self, x: &[f64], y: &[f64], w: &[f64]) -> SpectrumResult<f64> {
        let cov = self.covariance(x, y, w)?;
        let var_x = self.variance(x, w)?;
        let var_y = self.variance(y, w)?;
        if var_x <= 0.0 || var_y <= 0.0 {
            return self.degenerate("weighted correlation with zero variance");
        }
        Ok(cov / (var_x * var_y).sqrt())
    }
}

/// Weighted mean with default settings.
pub fn weighted_mean(x: &[f64], w: &[f64]) -> SpectrumResult<f64> {
    WeightedStats::default().mean(x, w)
}

/// Weighted covariance with default settings.
pub fn weighted_covariance(x: &[f64], y: &[f64], w: &[f64]) -> SpectrumResult<f64> {
    WeightedStats::default().covariance(x, y, w)
}

/// Weighted standard deviation (population style) with default settings.
pub fn weighted_std(x: &[f64], w: &[f64]) -> SpectrumResult<f64> {
    WeightedStats::default().std(x, w)
}

/// Weighted correlation with default settings.
pub fn weighted_correlation(x: &[f64], y: &[f64], w: &[f64]) -> SpectrumResult<f64> {
    WeightedStats::default().correlation(x, y, w)
}

/// Full width at half maximum from a standard deviation.
///
/// Assumes a Gaussian shape: `fwhm = std · 2·sqrt(2·ln 2) ≈ 2.3548·std`. This
/// is an approximation and not the measured half-maximum width of the data.
pub fn fwhm(std: f64) -> f64 {
    std * 2.0 * (2.0 * LN_2).sqrt()
}
