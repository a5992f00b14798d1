//! Spectrum Table
//!
//! Holds the channel-coordinate contents of a spectrum and the world-coordinate
//! table derived from them. The world table is computed once at construction
//! and rebuilt only through an explicit [`SpectrumTable::recompute`] or one of
//! the `replace_*` methods; nothing is patched incrementally.

use crate::axis::{AxisDef, AxisMapper};
use crate::error::{OutOfRangeAction, OutOfRangeWarning, SpectrumError, SpectrumResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One row of spectrum contents in channel coordinates.
///
/// Deserializes from the server's `{x, y?, v}` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRow {
    pub x: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
    #[serde(alias = "v")]
    pub count: u64,
}

impl ChannelRow {
    pub fn new_1d(x: i64, count: u64) -> Self {
        Self { x, y: None, count }
    }

    pub fn new_2d(x: i64, y: i64, count: u64) -> Self {
        Self { x, y: Some(y), count }
    }
}

/// One row of spectrum contents in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorldRow {
    pub x: f64,
    pub y: Option<f64>,
    pub count: u64,
}

/// World-coordinate rows with their column labels (the spectrum parameters)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorldTable {
    pub labels: Vec<String>,
    pub rows: Vec<WorldRow>,
}

/// Which coordinate system to read a table in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSystem {
    /// Raw channel indices
    Channel,
    /// Calibrated world values
    #[default]
    World,
}

/// Policy for channel coordinates outside `[0, bins)`.
///
/// Every policy reports the row as an [`OutOfRangeWarning`]; none fails.
///
/// `Keep` is the default and goes beyond clamping or dropping: the row keeps
/// its true world position (a channel equal to `bins` maps to `high`), so sums
/// and moments match the server's contents, at the cost of rows that fall
/// outside the axis range and get no image cell. Choose `Clamp` or `Drop` when
/// every row must stay inside the declared axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutOfRangePolicy {
    /// Map the channel unchanged (the axis map is total)
    #[default]
    Keep,
    /// Move the channel to the nearest valid bin
    Clamp,
    /// Remove the row
    Drop,
}

/// Column-oriented view used by statistics and gate filtering.
///
/// `weights` holds the counts as f64; `y` is present for 2D data only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns {
    pub labels: Vec<String>,
    pub x: Vec<f64>,
    pub y: Option<Vec<f64>>,
    pub weights: Vec<f64>,
}

impl Columns {
    /// 1D columns
    pub fn one_d(label: impl Into<String>, x: Vec<f64>, weights: Vec<f64>) -> Self {
        Self {
            labels: vec![label.into()],
            x,
            y: None,
            weights,
        }
    }

    /// 2D columns
    pub fn two_d(
        labels: [String; 2],
        x: Vec<f64>,
        y: Vec<f64>,
        weights: Vec<f64>,
    ) -> Self {
        Self {
            labels: labels.to_vec(),
            x,
            y: Some(y),
            weights,
        }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Number of coordinate columns (1 or 2)
    pub fn dimension(&self) -> usize {
        if self.y.is_some() {
            2
        } else {
            1
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Rows for which `keep(index)` is true, in original order.
    pub fn select(&self, mut keep: impl FnMut(usize) -> bool) -> Columns {
        let idx: Vec<usize> = (0..self.len()).filter(|&i| keep(i)).collect();
        Columns {
            labels: self.labels.clone(),
            x: idx.iter().map(|&i| self.x[i]).collect(),
            y: self.y.as_ref().map(|y| idx.iter().map(|&i| y[i]).collect()),
            weights: idx.iter().map(|&i| self.weights[i]).collect(),
        }
    }

    /// Check that all columns have the same length.
    pub fn validate(&self) -> SpectrumResult<()> {
        let n = self.weights.len();
        let y_ok = self.y.as_ref().map_or(true, |y| y.len() == n);
        if self.x.len() != n || !y_ok {
            return Err(SpectrumError::configuration(format!(
                "column lengths differ: x={}, y={:?}, weights={}",
                self.x.len(),
                self.y.as_ref().map(Vec::len),
                n
            )));
        }
        Ok(())
    }
}

/// Channel data plus the cached world-coordinate table
#[derive(Debug, Clone)]
pub struct SpectrumTable {
    parameters: Vec<String>,
    mappers: Vec<AxisMapper>,
    policy: OutOfRangePolicy,
    /// Rows exactly as supplied
    source: Vec<ChannelRow>,
    /// Rows after the out-of-range policy
    channel: Vec<ChannelRow>,
    world: WorldTable,
    warnings: Vec<OutOfRangeWarning>,
}

impl SpectrumTable {
    /// Build a table and compute its world view.
    ///
    /// Fails with a configuration error if the number of parameters is not 1
    /// or 2, differs from the number of axes, an axis is invalid, or a row's
    /// coordinates do not match the dimensionality.
    pub fn new(
        parameters: Vec<String>,
        axes: Vec<AxisDef>,
        channel_data: Vec<ChannelRow>,
        policy: OutOfRangePolicy,
    ) -> SpectrumResult<Self> {
        if parameters.len() != axes.len() {
            return Err(SpectrumError::configuration(format!(
                "{} parameters for {} axes",
                parameters.len(),
                axes.len()
            )));
        }
        if !(1..=2).contains(&parameters.len()) {
            return Err(SpectrumError::configuration(format!(
                "unsupported dimensionality {}; expected 1 or 2",
                parameters.len()
            )));
        }
        let mappers = axes
            .into_iter()
            .map(AxisMapper::new)
            .collect::<SpectrumResult<Vec<_>>>()?;
        check_rows(&channel_data, mappers.len())?;

        let mut table = Self {
            parameters,
            mappers,
            policy,
            source: channel_data,
            channel: Vec::new(),
            world: WorldTable::default(),
            warnings: Vec::new(),
        };
        table.recompute();
        Ok(table)
    }

    /// Rebuild the channel and world views from the source rows.
    pub fn recompute(&mut self) {
        self.warnings.clear();
        let mut channel = Vec::with_capacity(self.source.len());

        'rows: for (row_idx, row) in self.source.iter().enumerate() {
            let mut out = *row;
            let coords = [Some(row.x), row.y];
            for (axis, (value, mapper)) in coords.iter().zip(&self.mappers).enumerate() {
                let Some(ch) = *value else { continue };
                if mapper.contains_channel(ch) {
                    continue;
                }
                let action = match self.policy {
                    OutOfRangePolicy::Clamp => {
                        let to = mapper.clamp_channel(ch);
                        if axis == 0 {
                            out.x = to;
                        } else {
                            out.y = Some(to);
                        }
                        OutOfRangeAction::Clamped(to)
                    }
                    OutOfRangePolicy::Drop => OutOfRangeAction::Dropped,
                    OutOfRangePolicy::Keep => OutOfRangeAction::Kept,
                };
                self.warnings.push(OutOfRangeWarning {
                    row: row_idx,
                    axis,
                    channel: ch,
                    bins: mapper.bins(),
                    action,
                });
                if action == OutOfRangeAction::Dropped {
                    continue 'rows;
                }
            }
            channel.push(out);
        }

        if !self.warnings.is_empty() {
            warn!(
                out_of_range = self.warnings.len(),
                policy = ?self.policy,
                "channel coordinates outside axis range: {}",
                self.warnings[0]
            );
        }

        let rows = channel
            .iter()
            .map(|r| WorldRow {
                x: self.mappers[0].map(r.x as f64),
                y: r.y.zip(self.mappers.get(1)).map(|(y, m)| m.map(y as f64)),
                count: r.count,
            })
            .collect();

        self.channel = channel;
        self.world = WorldTable {
            labels: self.parameters.clone(),
            rows,
        };
        debug!(
            rows = self.channel.len(),
            dimension = self.dimension(),
            "spectrum table recomputed"
        );
    }

    /// Replace the channel data and recompute.
    pub fn replace_channel_data(&mut self, channel_data: Vec<ChannelRow>) -> SpectrumResult<()> {
        check_rows(&channel_data, self.dimension())?;
        self.source = channel_data;
        self.recompute();
        Ok(())
    }

    /// Replace the axis definitions and recompute.
    pub fn replace_axes(&mut self, axes: Vec<AxisDef>) -> SpectrumResult<()> {
        if axes.len() != self.parameters.len() {
            return Err(SpectrumError::configuration(format!(
                "{} parameters for {} axes",
                self.parameters.len(),
                axes.len()
            )));
        }
        self.mappers = axes
            .into_iter()
            .map(AxisMapper::new)
            .collect::<SpectrumResult<Vec<_>>>()?;
        self.recompute();
        Ok(())
    }

    /// Replace the out-of-range policy and recompute.
    pub fn replace_policy(&mut self, policy: OutOfRangePolicy) {
        self.policy = policy;
        self.recompute();
    }

    /// Rows in channel coordinates, after the out-of-range policy
    pub fn get_channel_view(&self) -> &[ChannelRow] {
        &self.channel
    }

    /// Rows in world coordinates, labelled by parameter name
    pub fn get_world_view(&self) -> &WorldTable {
        &self.world
    }

    /// Column-oriented data in the requested coordinate system.
    ///
    /// Channel columns are labelled `x`/`y`, world columns by parameter.
    pub fn columns(&self, coords: CoordinateSystem) -> Columns {
        let weights: Vec<f64> = self.channel.iter().map(|r| r.count as f64).collect();
        match coords {
            CoordinateSystem::Channel => Columns {
                labels: ["x", "y"][..self.dimension()]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                x: self.channel.iter().map(|r| r.x as f64).collect(),
                y: (self.dimension() == 2).then(|| {
                    self.channel
                        .iter()
                        .map(|r| r.y.unwrap_or_default() as f64)
                        .collect()
                }),
                weights,
            },
            CoordinateSystem::World => Columns {
                labels: self.parameters.clone(),
                x: self.world.rows.iter().map(|r| r.x).collect(),
                y: (self.dimension() == 2).then(|| {
                    self.world
                        .rows
                        .iter()
                        .map(|r| r.y.unwrap_or_default())
                        .collect()
                }),
                weights,
            },
        }
    }

    /// Values of every bin along each axis (`0..bins`, mapped for world).
    pub fn axis_values(&self, coords: CoordinateSystem) -> Vec<Vec<f64>> {
        self.mappers
            .iter()
            .map(|m| {
                let channels: Vec<f64> = (0..m.bins()).map(f64::from).collect();
                match coords {
                    CoordinateSystem::Channel => channels,
                    CoordinateSystem::World => m.map_all(&channels),
                }
            })
            .collect()
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn mappers(&self) -> &[AxisMapper] {
        &self.mappers
    }

    pub fn axes(&self) -> Vec<AxisDef> {
        self.mappers.iter().map(|m| *m.def()).collect()
    }

    pub fn policy(&self) -> OutOfRangePolicy {
        self.policy
    }

    /// Out-of-range reports from the last recompute
    pub fn warnings(&self) -> &[OutOfRangeWarning] {
        &self.warnings
    }

    pub fn dimension(&self) -> usize {
        self.mappers.len()
    }

    /// Number of rows after the out-of-range policy
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn total_count(&self) -> u64 {
        self.channel.iter().map(|r| r.count).sum()
    }
}

fn check_rows(rows: &[ChannelRow], dimension: usize) -> SpectrumResult<()> {
    let bad = rows
        .iter()
        .position(|r| r.y.is_some() != (dimension == 2));
    match bad {
        Some(i) => Err(SpectrumError::configuration(format!(
            "row {} does not match a {}D spectrum",
            i, dimension
        ))),
        None => Ok(()),
    }
}
