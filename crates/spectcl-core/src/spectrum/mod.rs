//! Spectra
//!
//! A [`Spectrum`] is an immutable snapshot of one server histogram: its type,
//! parameters and axes, the contents table, and references to the gate applied
//! to it and the gate drawn over it.

pub mod table;

pub use table::{
    ChannelRow, Columns, CoordinateSystem, OutOfRangePolicy, SpectrumTable, WorldRow, WorldTable,
};

use crate::analysis::{StatsSummary, WeightedStats};
use crate::axis::AxisDef;
use crate::error::{SpectrumError, SpectrumResult};
use crate::gate::{Gate, NamedMask};
use crate::image::ImageGrid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{trace, warn};

/// Spectrum type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectrumType {
    /// One parameter histogram
    OneD,
    /// Two parameter histogram
    TwoD,
    /// One channel column per parameter; no axis mapping
    Summary,
}

impl SpectrumType {
    /// Server type code
    pub fn code(&self) -> &'static str {
        match self {
            SpectrumType::OneD => "1",
            SpectrumType::TwoD => "2",
            SpectrumType::Summary => "s",
        }
    }

    /// Parse a server code (`"1"`, `"2"`, `"s"`) or name (`"1D"`, `"2D"`, `"Summary"`).
    pub fn from_code(s: &str) -> SpectrumResult<Self> {
        match s {
            "1" | "1D" => Ok(SpectrumType::OneD),
            "2" | "2D" => Ok(SpectrumType::TwoD),
            "s" | "Summary" => Ok(SpectrumType::Summary),
            other => Err(SpectrumError::configuration(format!(
                "unknown spectrum type '{}'",
                other
            ))),
        }
    }

    /// Number of mapped axes, `None` for summary spectra
    pub fn dimension(&self) -> Option<usize> {
        match self {
            SpectrumType::OneD => Some(1),
            SpectrumType::TwoD => Some(2),
            SpectrumType::Summary => None,
        }
    }
}

impl fmt::Display for SpectrumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpectrumType::OneD => write!(f, "1D"),
            SpectrumType::TwoD => write!(f, "2D"),
            SpectrumType::Summary => write!(f, "Summary"),
        }
    }
}

impl FromStr for SpectrumType {
    type Err = SpectrumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpectrumType::from_code(s)
    }
}

/// Channel storage type on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelType {
    #[default]
    Long,
    Word,
    Short,
    Byte,
}

impl ChannelType {
    pub fn from_code(s: &str) -> SpectrumResult<Self> {
        match s {
            "long" => Ok(ChannelType::Long),
            "word" => Ok(ChannelType::Word),
            "short" => Ok(ChannelType::Short),
            "byte" => Ok(ChannelType::Byte),
            other => Err(SpectrumError::configuration(format!(
                "unknown channel type '{}'",
                other
            ))),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ChannelType::Long => "long",
            ChannelType::Word => "word",
            ChannelType::Short => "short",
            ChannelType::Byte => "byte",
        }
    }

    /// Largest count a channel of this type holds
    pub fn max_count(&self) -> u64 {
        match self {
            ChannelType::Long => u32::MAX as u64,
            ChannelType::Word | ChannelType::Short => u16::MAX as u64,
            ChannelType::Byte => u8::MAX as u64,
        }
    }
}

fn default_chantype() -> String {
    "long".to_string()
}

/// Spectrum record as listed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_code: String,
    pub parameters: Vec<String>,
    pub axes: Vec<AxisDef>,
    #[serde(default = "default_chantype")]
    pub chantype: String,
}

/// Immutable spectrum snapshot
#[derive(Debug, Clone)]
pub struct Spectrum {
    name: String,
    stype: SpectrumType,
    chan_type: ChannelType,
    table: SpectrumTable,
    gate: Option<Arc<Gate>>,
    show_gate: Option<Arc<Gate>>,
}

impl Spectrum {
    /// Build a spectrum from its definition and contents.
    ///
    /// The parameter count must match the dimensionality of `stype`; summary
    /// spectra are rejected since they have no channel-to-world mapping.
    pub fn new(
        name: impl Into<String>,
        stype: SpectrumType,
        parameters: Vec<String>,
        axes: Vec<AxisDef>,
        channel_data: Vec<ChannelRow>,
        policy: OutOfRangePolicy,
    ) -> SpectrumResult<Self> {
        let name = name.into();
        let dim = stype.dimension().ok_or_else(|| {
            SpectrumError::configuration(format!(
                "spectrum '{}': {} spectra have no axis mapping",
                name, stype
            ))
        })?;
        if parameters.len() != dim {
            return Err(SpectrumError::configuration(format!(
                "spectrum '{}': {} spectrum with {} parameters",
                name,
                stype,
                parameters.len()
            )));
        }
        let table = SpectrumTable::new(parameters, axes, channel_data, policy)?;
        Ok(Self {
            name,
            stype,
            chan_type: ChannelType::default(),
            table,
            gate: None,
            show_gate: None,
        })
    }

    /// Build from a server record and its contents.
    pub fn from_config(
        config: &SpectrumConfig,
        channel_data: Vec<ChannelRow>,
        policy: OutOfRangePolicy,
    ) -> SpectrumResult<Self> {
        let stype = SpectrumType::from_code(&config.type_code)?;
        let chan_type = ChannelType::from_code(&config.chantype)?;
        let mut spectrum = Self::new(
            config.name.clone(),
            stype,
            config.parameters.clone(),
            config.axes.clone(),
            channel_data,
            policy,
        )?;
        spectrum.chan_type = chan_type;
        let saturated = spectrum.saturated_channels();
        if saturated > 0 {
            warn!(
                spectrum = %spectrum.name,
                chantype = chan_type.code(),
                saturated,
                "counts above the channel type maximum"
            );
        }
        Ok(spectrum)
    }

    /// Attach the applied gate.
    pub fn with_gate(mut self, gate: Option<Arc<Gate>>) -> Self {
        self.gate = gate;
        self
    }

    /// Attach the overlay gate.
    pub fn with_show_gate(mut self, gate: Option<Arc<Gate>>) -> Self {
        self.show_gate = gate;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stype(&self) -> SpectrumType {
        self.stype
    }

    pub fn chan_type(&self) -> ChannelType {
        self.chan_type
    }

    pub fn parameters(&self) -> &[String] {
        self.table.parameters()
    }

    pub fn axes(&self) -> Vec<AxisDef> {
        self.table.axes()
    }

    pub fn table(&self) -> &SpectrumTable {
        &self.table
    }

    /// Mutable table access for explicit `replace_*` / `recompute` calls
    pub fn table_mut(&mut self) -> &mut SpectrumTable {
        &mut self.table
    }

    pub fn gate(&self) -> Option<&Arc<Gate>> {
        self.gate.as_ref()
    }

    pub fn show_gate(&self) -> Option<&Arc<Gate>> {
        self.show_gate.as_ref()
    }

    /// Rows whose count exceeds what the channel type can hold
    pub fn saturated_channels(&self) -> usize {
        let max = self.chan_type.max_count();
        self.get_channel_view().iter().filter(|r| r.count > max).count()
    }

    pub fn is_gated(&self) -> bool {
        self.gate.is_some()
    }

    pub fn get_channel_view(&self) -> &[ChannelRow] {
        self.table.get_channel_view()
    }

    pub fn get_world_view(&self) -> &WorldTable {
        self.table.get_world_view()
    }

    /// Mask restricting statistics, taken from the show gate.
    ///
    /// The applied gate is not used: the server already filters events through
    /// it, usually on parameters other than the spectrum's. Returns the mask in
    /// the requested coordinate system, or `None` when there is no show gate or
    /// it has no region over this spectrum's parameters.
    pub fn stats_mask(&self, coords: CoordinateSystem) -> SpectrumResult<Option<NamedMask>> {
        let Some(gate) = self.show_gate.as_ref() else {
            return Ok(None);
        };
        let Some(named) = gate.named_mask(self.parameters()) else {
            trace!(
                gate = gate.name(),
                kind = %gate.kind(),
                spectrum = %self.name,
                "gate has no region on this spectrum, skipped"
            );
            return Ok(None);
        };
        match coords {
            CoordinateSystem::World => Ok(Some(named)),
            CoordinateSystem::Channel => Ok(Some(NamedMask::new(
                named.name,
                named.mask.to_channel(self.table.mappers())?,
            ))),
        }
    }

    /// Weighted statistics with default settings.
    pub fn stats(&self, coords: CoordinateSystem) -> SpectrumResult<StatsSummary> {
        self.stats_with(coords, &WeightedStats::default())
    }

    /// Weighted statistics with explicit settings.
    pub fn stats_with(
        &self,
        coords: CoordinateSystem,
        stats: &WeightedStats,
    ) -> SpectrumResult<StatsSummary> {
        let columns = self.table.columns(coords);
        let mask = self.stats_mask(coords)?;
        stats.summarize(&columns, mask.as_ref())
    }

    /// Dense image of a 2D spectrum.
    pub fn to_image(&self, coords: CoordinateSystem, fill: Option<f64>) -> SpectrumResult<ImageGrid> {
        if self.stype != SpectrumType::TwoD {
            return Err(SpectrumError::configuration(format!(
                "spectrum '{}' is {}, not 2D",
                self.name, self.stype
            )));
        }
        ImageGrid::from_table(&self.table, coords, fill)
    }
}

impl fmt::Display for Spectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Spectrum '{}': [{}] parameters, [{}] entries.",
            self.name,
            self.parameters().len(),
            self.table.len()
        )
    }
}
