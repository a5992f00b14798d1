//! Image Grids and Profiles
//!
//! Dense display data for spectra: the `(x, y, z)` image of a 2D spectrum and
//! the 1D projections of a table onto either coordinate.
//!
//! ## Example
//!
//! ```rust
//! use spectcl_core::axis::AxisDef;
//! use spectcl_core::image::ImageGrid;
//! use spectcl_core::spectrum::{ChannelRow, CoordinateSystem, OutOfRangePolicy, SpectrumTable};
//!
//! let table = SpectrumTable::new(
//!     vec!["tof".into(), "de".into()],
//!     vec![AxisDef::new(0.0, 4.0, 4), AxisDef::new(0.0, 2.0, 2)],
//!     vec![ChannelRow::new_2d(1, 0, 7)],
//!     OutOfRangePolicy::default(),
//! )
//! .unwrap();
//! let image = ImageGrid::from_table(&table, CoordinateSystem::Channel, Some(0.0)).unwrap();
//! assert_eq!(image.shape(), (2, 4));
//! assert_eq!(image.get(1, 0), 7.0);
//! ```

use crate::error::{SpectrumError, SpectrumResult};
use crate::spectrum::{Columns, CoordinateSystem, SpectrumTable};
use serde::Serialize;
use tracing::trace;

/// Image of a 2D spectrum.
///
/// `z` is row-major over `y`: the value of bin `(ix, iy)` is
/// `z[iy * x.len() + ix]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageGrid {
    /// Value of every x bin
    pub x: Vec<f64>,
    /// Value of every y bin
    pub y: Vec<f64>,
    /// Counts; bins with no row hold the fill value
    pub z: Vec<f64>,
    pub coords: CoordinateSystem,
}

impl ImageGrid {
    /// Build the image of a 2D table.
    ///
    /// Empty bins get `fill` (NaN when `None`). Each row sets its bin; rows
    /// kept outside the axis range have no bin and are skipped.
    pub fn from_table(
        table: &SpectrumTable,
        coords: CoordinateSystem,
        fill: Option<f64>,
    ) -> SpectrumResult<Self> {
        if table.dimension() != 2 {
            return Err(SpectrumError::configuration(format!(
                "image needs a 2D table, got {}D",
                table.dimension()
            )));
        }
        let mut values = table.axis_values(coords);
        let y = values.pop().unwrap_or_default();
        let x = values.pop().unwrap_or_default();
        let (nx, ny) = (x.len(), y.len());
        let mut z = vec![fill.unwrap_or(f64::NAN); nx * ny];

        let mut skipped = 0usize;
        for row in table.get_channel_view() {
            let ix = usize::try_from(row.x).ok().filter(|&i| i < nx);
            let iy = row
                .y
                .and_then(|y| usize::try_from(y).ok())
                .filter(|&i| i < ny);
            match (ix, iy) {
                (Some(ix), Some(iy)) => z[iy * nx + ix] = row.count as f64,
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            trace!(skipped, "rows outside the image grid");
        }

        Ok(Self { x, y, z, coords })
    }

    /// `(rows, columns)`, i.e. `(y bins, x bins)`
    pub fn shape(&self) -> (usize, usize) {
        (self.y.len(), self.x.len())
    }

    /// Value at bin `(ix, iy)`; NaN outside the grid
    pub fn get(&self, ix: usize, iy: usize) -> f64 {
        if ix < self.x.len() && iy < self.y.len() {
            self.z[iy * self.x.len() + ix]
        } else {
            f64::NAN
        }
    }

    /// One row of the image (fixed `iy`).
    pub fn row(&self, iy: usize) -> &[f64] {
        let nx = self.x.len();
        self.z.get(iy * nx..(iy + 1) * nx).unwrap_or(&[])
    }

    /// Nested rows, `z[iy][ix]`.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.y.len()).map(|iy| self.row(iy).to_vec()).collect()
    }

    /// Coordinate matrices of the same shape as the image
    pub fn meshgrid(&self) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let xx = self.y.iter().map(|_| self.x.clone()).collect();
        let yy = self.y.iter().map(|&y| vec![y; self.x.len()]).collect();
        (xx, yy)
    }

    /// `[x first, x last, y first, y last]` for display extents
    pub fn extent(&self) -> [f64; 4] {
        let first_last = |v: &[f64]| {
            (
                v.first().copied().unwrap_or(0.0),
                v.last().copied().unwrap_or(0.0),
            )
        };
        let (x0, x1) = first_last(&self.x);
        let (y0, y1) = first_last(&self.y);
        [x0, x1, y0, y1]
    }

    /// Location and value of the largest bin, ignoring fill NaNs.
    pub fn find_peak(&self) -> Option<(usize, usize, f64)> {
        let nx = self.x.len().max(1);
        self.z
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, &v)| (i % nx, i / nx, v))
    }
}

/// Counts projected onto one coordinate
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Profile {
    pub label: String,
    /// Distinct coordinate values, ascending
    pub coords: Vec<f64>,
    /// Summed weight at each coordinate
    pub counts: Vec<f64>,
}

impl Profile {
    /// Projection onto the x column.
    pub fn x(columns: &Columns) -> SpectrumResult<Self> {
        columns.validate()?;
        let label = columns.labels.first().cloned().unwrap_or_default();
        Ok(Self::project(label, &columns.x, &columns.weights))
    }

    /// Projection onto the y column; 2D columns only.
    pub fn y(columns: &Columns) -> SpectrumResult<Self> {
        columns.validate()?;
        let y = columns
            .y
            .as_ref()
            .ok_or_else(|| SpectrumError::configuration("y profile needs 2D columns"))?;
        let label = columns.labels.get(1).cloned().unwrap_or_default();
        Ok(Self::project(label, y, &columns.weights))
    }

    fn project(label: String, values: &[f64], weights: &[f64]) -> Self {
        let mut pairs: Vec<(f64, f64)> = values
            .iter()
            .copied()
            .zip(weights.iter().copied())
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut coords: Vec<f64> = Vec::new();
        let mut counts: Vec<f64> = Vec::new();
        for (c, w) in pairs {
            match coords.last() {
                Some(&last) if last == c => {
                    if let Some(total) = counts.last_mut() {
                        *total += w;
                    }
                }
                _ => {
                    coords.push(c);
                    counts.push(w);
                }
            }
        }
        Self {
            label,
            coords,
            counts,
        }
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }
}
