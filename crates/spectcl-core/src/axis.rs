//! Axis Mapping
//!
//! Converts channel indices (raw bin numbers reported by SpecTcl) into world
//! coordinates (calibrated physical values) through the linear map
//!
//! ```text
//! world = low + channel * (high - low) / bins
//! ```
//!
//! ## Example
//!
//! ```rust
//! use spectcl_core::axis::{AxisDef, AxisMapper};
//!
//! let mapper = AxisMapper::new(AxisDef::new(0.0, 10.0, 10)).unwrap();
//! assert_eq!(mapper.map(5.0), 5.0);
//! assert_eq!(mapper.map_all(&[0.0, 10.0]), vec![0.0, 10.0]);
//! ```

use crate::error::{SpectrumError, SpectrumResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Axis definition as reported by the server: `{low, high, bins}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisDef {
    /// World coordinate of channel 0
    pub low: f64,
    /// World coordinate of channel `bins`
    pub high: f64,
    /// Number of channels
    pub bins: u32,
}

impl AxisDef {
    pub fn new(low: f64, high: f64, bins: u32) -> Self {
        Self { low, high, bins }
    }

    /// Check `bins > 0`, `low < high` and finite bounds.
    pub fn validate(&self) -> SpectrumResult<()> {
        if self.bins == 0 {
            return Err(SpectrumError::configuration("axis bins must be > 0"));
        }
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(SpectrumError::configuration(format!(
                "axis bounds must be finite, got [{}, {}]",
                self.low, self.high
            )));
        }
        if self.low >= self.high {
            return Err(SpectrumError::configuration(format!(
                "axis low ({}) must be below high ({})",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

/// SpecTcl notation, e.g. `{0 1024 512}`
impl fmt::Display for AxisDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} {} {}}}", self.low, self.high, self.bins)
    }
}

impl FromStr for AxisDef {
    type Err = SpectrumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .ok_or_else(|| SpectrumError::configuration(format!("axis '{}' is not braced", s)))?;

        let fields: Vec<&str> = inner.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(SpectrumError::configuration(format!(
                "axis '{}' needs 3 fields, got {}",
                s,
                fields.len()
            )));
        }

        let parse_f = |v: &str| {
            v.parse::<f64>()
                .map_err(|e| SpectrumError::configuration(format!("axis value '{}': {}", v, e)))
        };
        let bins = fields[2]
            .parse::<u32>()
            .map_err(|e| SpectrumError::configuration(format!("axis bins '{}': {}", fields[2], e)))?;

        Ok(Self::new(parse_f(fields[0])?, parse_f(fields[1])?, bins))
    }
}

/// Linear channel-to-world mapper for one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMapper {
    def: AxisDef,
    /// Cached (high - low) / bins
    step: f64,
}

impl AxisMapper {
    /// Build a mapper from a validated axis definition.
    pub fn new(def: AxisDef) -> SpectrumResult<Self> {
        def.validate()?;
        Ok(Self {
            def,
            step: (def.high - def.low) / def.bins as f64,
        })
    }

    pub fn def(&self) -> &AxisDef {
        &self.def
    }

    pub fn bins(&self) -> u32 {
        self.def.bins
    }

    /// Width of one channel in world units
    pub fn bin_width(&self) -> f64 {
        self.step
    }

    /// Map a channel coordinate to world.
    ///
    /// Total for any real input; `map(0) == low` and `map(bins) == high` exactly.
    pub fn map(&self, channel: f64) -> f64 {
        if channel == self.def.bins as f64 {
            // avoid rounding in low + bins * step
            return self.def.high;
        }
        self.def.low + channel * (self.def.high - self.def.low) / self.def.bins as f64
    }

    /// Elementwise [`map`](Self::map), preserving order and length.
    pub fn map_all(&self, channels: &[f64]) -> Vec<f64> {
        channels.iter().map(|&c| self.map(c)).collect()
    }

    /// Inverse map: world coordinate back to (fractional) channel.
    pub fn unmap(&self, world: f64) -> f64 {
        (world - self.def.low) * self.def.bins as f64 / (self.def.high - self.def.low)
    }

    /// Whether an integer channel lies in `[0, bins)`.
    pub fn contains_channel(&self, channel: i64) -> bool {
        channel >= 0 && channel < self.def.bins as i64
    }

    /// Clamp an integer channel into `[0, bins)`.
    pub fn clamp_channel(&self, channel: i64) -> i64 {
        channel.clamp(0, self.def.bins as i64 - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_map_midpoint() {
        let m = AxisMapper::new(AxisDef::new(0.0, 10.0, 10)).unwrap();
        assert_eq!(m.map(5.0), 5.0);
    }

    #[test]
    fn test_endpoints_exact() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let low: f64 = rng.gen_range(-1e4..1e4);
            let high = low + rng.gen_range(1e-3..1e4);
            let bins: u32 = rng.gen_range(1..65536);
            let m = AxisMapper::new(AxisDef::new(low, high, bins)).unwrap();
            assert_eq!(m.map(0.0), low);
            assert_eq!(m.map(bins as f64), high);
        }
    }

    #[test]
    fn test_map_all_preserves_order() {
        let m = AxisMapper::new(AxisDef::new(-5.0, 5.0, 100)).unwrap();
        let channels = [99.0, 0.0, 50.0, 12.5];
        let world = m.map_all(&channels);
        assert_eq!(world.len(), channels.len());
        for (c, w) in channels.iter().zip(&world) {
            assert_eq!(*w, m.map(*c));
        }
        assert_relative_eq!(world[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unmap_round_trip() {
        let m = AxisMapper::new(AxisDef::new(-3.2, 17.9, 211)).unwrap();
        for ch in 0..211 {
            assert_relative_eq!(m.unmap(m.map(ch as f64)), ch as f64, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_invalid_axes() {
        assert!(AxisMapper::new(AxisDef::new(0.0, 1.0, 0)).is_err());
        assert!(AxisMapper::new(AxisDef::new(1.0, 1.0, 4)).is_err());
        assert!(AxisMapper::new(AxisDef::new(2.0, 1.0, 4)).is_err());
        assert!(AxisMapper::new(AxisDef::new(f64::NAN, 1.0, 4)).is_err());
    }

    #[test]
    fn test_channel_range() {
        let m = AxisMapper::new(AxisDef::new(0.0, 1.0, 8)).unwrap();
        assert!(m.contains_channel(0));
        assert!(m.contains_channel(7));
        assert!(!m.contains_channel(8));
        assert!(!m.contains_channel(-1));
        assert_eq!(m.clamp_channel(-3), 0);
        assert_eq!(m.clamp_channel(42), 7);
        assert_relative_eq!(m.bin_width(), 0.125);
    }

    #[test]
    fn test_axis_notation() {
        let def: AxisDef = "{0 1024 512}".parse().unwrap();
        assert_eq!(def, AxisDef::new(0.0, 1024.0, 512));
        assert_eq!(def.to_string(), "{0 1024 512}");
        assert!("0 1024 512".parse::<AxisDef>().is_err());
        assert!("{0 1024}".parse::<AxisDef>().is_err());
        assert!("{0 1024 -2}".parse::<AxisDef>().is_err());
    }
}
