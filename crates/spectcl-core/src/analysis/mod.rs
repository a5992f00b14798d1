//! # Weighted Statistics
//!
//! Count-weighted moments of spectrum contents and the per-gate summary table
//! built from them.
//!
//! ## Example
//!
//! ```rust
//! use spectcl_core::analysis::{summarize, WeightedStats};
//! use spectcl_core::spectrum::Columns;
//!
//! let cols = Columns::one_d("energy", vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 1.0]);
//! let summary = summarize(&cols, None).unwrap();
//! assert_eq!(summary.all().unwrap().sum, 4.0);
//!
//! let stats = WeightedStats::default();
//! assert_eq!(stats.mean(&cols.x, &cols.weights).unwrap(), 1.0);
//! ```

pub mod summary;
pub mod weighted;

pub use summary::{summarize, AxisMoments, Moments, StatsRow, StatsSummary, ALL_ROW};
pub use weighted::{
    fwhm, weighted_correlation, weighted_covariance, weighted_mean, weighted_std, Degeneracy,
    StatsConfig, WeightedStats, FWHM_PER_SIGMA,
};
