//! # SpecTcl Spectrum Core
//!
//! Coordinate mapping, gate masks and count-weighted statistics for spectra
//! retrieved from a SpecTcl histogramming server.
//!
//! ## Overview
//!
//! A server spectrum is a sparse list of channel rows (`x`, optional `y`, and
//! a count) plus one axis definition per parameter. This crate turns those
//! into:
//!
//! - **World coordinates**: each channel mapped through its axis
//!   (`low + channel * (high - low) / bins`)
//! - **Gate masks**: contour polygons and slice intervals applied to either
//!   coordinate system
//! - **Weighted statistics**: mean, standard deviation, FWHM and correlation
//!   with the counts as weights, for the whole spectrum and inside a gate
//! - **Display data**: image grids and profiles
//!
//! ## Data Flow
//!
//! ```text
//! listings ──► Catalog ──► Spectrum ──► SpectrumTable ──► Columns ──► StatsSummary
//! contents ─────────────────┘              │                 ▲
//!                                           └─► ImageGrid     │
//!                                     Gate ──► GateMask ──────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use spectcl_core::prelude::*;
//!
//! let spectrum = Spectrum::new(
//!     "pid",
//!     SpectrumType::TwoD,
//!     vec!["tof".into(), "de".into()],
//!     vec![AxisDef::new(0.0, 100.0, 100), AxisDef::new(0.0, 100.0, 100)],
//!     vec![ChannelRow::new_2d(10, 10, 4), ChannelRow::new_2d(60, 60, 4)],
//!     OutOfRangePolicy::default(),
//! )
//! .unwrap()
//! .with_show_gate(Some(std::sync::Arc::new(
//!     Gate::contour(
//!         "low",
//!         ["tof", "de"],
//!         vec![(0.0, 0.0).into(), (50.0, 0.0).into(), (50.0, 50.0).into(), (0.0, 50.0).into()],
//!     )
//!     .unwrap(),
//! )));
//!
//! let summary = spectrum.stats(CoordinateSystem::World).unwrap();
//! assert_eq!(summary.row("low").unwrap().ratio, 0.5);
//! println!("{}", summary.to_text());
//! ```

pub mod analysis;
pub mod axis;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gate;
pub mod image;
pub mod logging;
pub mod spectrum;

// Batch processing (requires `parallel` feature)
#[cfg(feature = "parallel")]
pub mod parallel;

pub use analysis::{
    fwhm, summarize, weighted_correlation, weighted_covariance, weighted_mean, weighted_std,
    Moments, StatsConfig, StatsSummary, WeightedStats,
};
pub use axis::{AxisDef, AxisMapper};
pub use catalog::{Catalog, GateApplication};
pub use config::{ConfigError, SpectclConfig};
pub use error::{OutOfRangeWarning, SpectrumError, SpectrumResult};
pub use gate::{Gate, GateConfig, GateKind, GateMask, NamedMask, Point};
pub use image::{ImageGrid, Profile};
pub use spectrum::{
    ChannelRow, Columns, CoordinateSystem, OutOfRangePolicy, Spectrum, SpectrumConfig,
    SpectrumTable, SpectrumType,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::analysis::{StatsSummary, WeightedStats};
    pub use crate::axis::{AxisDef, AxisMapper};
    pub use crate::catalog::Catalog;
    pub use crate::error::{SpectrumError, SpectrumResult};
    pub use crate::gate::{Gate, GateMask, Point};
    pub use crate::spectrum::{
        ChannelRow, CoordinateSystem, OutOfRangePolicy, Spectrum, SpectrumTable, SpectrumType,
    };
}
