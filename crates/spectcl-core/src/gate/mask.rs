//! Gate Masks
//!
//! Set membership for the gate shapes that select a region of parameter space:
//! closed polygons (contour gates) and half-open intervals (slice gates).
//!
//! ## Boundary convention
//!
//! [`contains`] uses the crossing-number rule with half-open edges: an edge
//! counts as crossed when exactly one endpoint lies strictly above the
//! horizontal ray through the point, and the point must be strictly left of
//! the crossing. For an axis-aligned box this puts the left and bottom edges
//! inside and the right and top edges outside, the same `[low, high)` rule
//! histogram bins use, so two polygons sharing an edge never both claim a point
//! on it.

use crate::axis::AxisMapper;
use crate::error::{SpectrumError, SpectrumResult};
use crate::spectrum::Columns;
use serde::{Deserialize, Serialize};

/// A vertex in two-parameter space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Whether `point` lies inside the closed polygon.
///
/// The last vertex connects back to the first. Fewer than 3 vertices enclose
/// nothing.
pub fn contains(polygon: &[Point], point: Point) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Rows of 2D `columns` whose `(x, y)` lies inside the polygon.
pub fn filter(polygon: &[Point], columns: &Columns) -> SpectrumResult<Columns> {
    let y = columns.y.as_ref().ok_or_else(|| {
        SpectrumError::configuration("contour gates need two coordinate columns")
    })?;
    columns.validate()?;
    Ok(columns.select(|i| contains(polygon, Point::new(columns.x[i], y[i]))))
}

/// Region selected by a gate
#[derive(Debug, Clone, PartialEq)]
pub enum GateMask {
    /// Closed polygon over two parameters
    Polygon(Vec<Point>),
    /// `low <= v < high` over one parameter, where `axis` picks the
    /// coordinate column (0 for x, 1 for y)
    Interval { axis: usize, low: f64, high: f64 },
}

impl GateMask {
    /// Membership of a single coordinate pair.
    pub fn contains(&self, x: f64, y: Option<f64>) -> bool {
        match self {
            GateMask::Polygon(points) => y.map_or(false, |y| contains(points, Point::new(x, y))),
            GateMask::Interval { axis, low, high } => {
                let v = match axis {
                    0 => Some(x),
                    1 => y,
                    _ => None,
                };
                v.map_or(false, |v| *low <= v && v < *high)
            }
        }
    }

    /// Rows of `columns` inside the mask.
    pub fn filter(&self, columns: &Columns) -> SpectrumResult<Columns> {
        match self {
            GateMask::Polygon(points) => filter(points, columns),
            GateMask::Interval { axis, low, high } => {
                columns.validate()?;
                let values = match axis {
                    0 => Some(&columns.x),
                    1 => columns.y.as_ref(),
                    _ => None,
                }
                .ok_or_else(|| {
                    SpectrumError::configuration(format!(
                        "slice on axis {} of a table with {} columns",
                        axis,
                        columns.dimension()
                    ))
                })?;
                Ok(columns.select(|i| *low <= values[i] && values[i] < *high))
            }
        }
    }

    /// Express a world-coordinate mask in channel coordinates.
    ///
    /// `mappers` are the spectrum's axes in parameter order.
    pub fn to_channel(&self, mappers: &[AxisMapper]) -> SpectrumResult<GateMask> {
        match self {
            GateMask::Polygon(points) => {
                let [mx, my] = mappers else {
                    return Err(SpectrumError::configuration(format!(
                        "contour gate needs 2 axes, spectrum has {}",
                        mappers.len()
                    )));
                };
                Ok(GateMask::Polygon(
                    points
                        .iter()
                        .map(|p| Point::new(mx.unmap(p.x), my.unmap(p.y)))
                        .collect(),
                ))
            }
            GateMask::Interval { axis, low, high } => {
                let m = mappers.get(*axis).ok_or_else(|| {
                    SpectrumError::configuration(format!(
                        "slice on axis {}, spectrum has {} axes",
                        axis,
                        mappers.len()
                    ))
                })?;
                Ok(GateMask::Interval {
                    axis: *axis,
                    low: m.unmap(*low),
                    high: m.unmap(*high),
                })
            }
        }
    }

    /// Polygon vertices for overlay drawing; empty for intervals
    pub fn vertices(&self) -> &[Point] {
        match self {
            GateMask::Polygon(points) => points,
            GateMask::Interval { .. } => &[],
        }
    }
}

/// A mask tagged with the gate name used as its statistics row label
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMask {
    pub name: String,
    pub mask: GateMask,
}

impl NamedMask {
    pub fn new(name: impl Into<String>, mask: GateMask) -> Self {
        Self {
            name: name.into(),
            mask,
        }
    }
}
