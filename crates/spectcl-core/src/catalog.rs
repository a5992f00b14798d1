//! Catalog
//!
//! Assembles the spectrum, gate and gate-application records listed by a
//! SpecTcl server into [`Spectrum`] snapshots with their gates attached.
//!
//! The catalog is a plain value built from one set of listings. It never
//! fetches or refreshes anything; rebuild it after the next listing.
//!
//! ## Example
//!
//! ```rust
//! use spectcl_core::catalog::Catalog;
//! use spectcl_core::spectrum::ChannelRow;
//!
//! let listing = r#"{
//!     "spectra": [{"name": "pid", "type": "2", "parameters": ["tof", "de"],
//!                  "axes": [{"low": 0, "high": 10, "bins": 10},
//!                           {"low": 0, "high": 10, "bins": 10}]}],
//!     "gates": [{"name": "c1", "type": "c", "parameters": ["tof", "de"],
//!                "points": [{"x": 0, "y": 0}, {"x": 5, "y": 0}, {"x": 5, "y": 5}]}],
//!     "applications": [{"spectrum": "pid", "gate": "c1"}]
//! }"#;
//! let catalog = Catalog::from_json(listing).unwrap();
//! let spectrum = catalog
//!     .build_spectrum("pid", vec![ChannelRow::new_2d(1, 1, 3)])
//!     .unwrap();
//! assert!(spectrum.is_gated());
//! assert_eq!(spectrum.show_gate().unwrap().name(), "c1");
//! ```

use crate::error::{SpectrumError, SpectrumResult};
use crate::gate::{Gate, GateConfig, GateKind};
use crate::spectrum::{ChannelRow, OutOfRangePolicy, Spectrum, SpectrumConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Gate names the server uses for "no gate applied"
pub const UNGATED_MARKERS: [&str; 3] = ["-TRUE-", "-Ungated-", "ungated"];

/// Which gate is applied to which spectrum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateApplication {
    pub spectrum: String,
    pub gate: String,
}

impl GateApplication {
    pub fn is_ungated(&self) -> bool {
        UNGATED_MARKERS.contains(&self.gate.as_str())
    }
}

/// The three server listings in one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub spectra: Vec<SpectrumConfig>,
    #[serde(default)]
    pub gates: Vec<GateConfig>,
    #[serde(default)]
    pub applications: Vec<GateApplication>,
}

/// Spectrum and gate definitions indexed by name
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    spectra: Vec<SpectrumConfig>,
    spectrum_index: HashMap<String, usize>,
    gates: Vec<Arc<Gate>>,
    gate_index: HashMap<String, usize>,
    /// spectrum name -> applied gate name
    applications: HashMap<String, String>,
    /// Gate records that failed validation, with the reason
    rejected: Vec<(String, SpectrumError)>,
    policy: OutOfRangePolicy,
}

impl Catalog {
    /// Index the listings.
    ///
    /// Gate records that do not validate are skipped with a warning and kept
    /// in [`Catalog::rejected`]; a spectrum applying one of them fails in
    /// [`Catalog::build_spectrum`].
    pub fn new(
        spectra: Vec<SpectrumConfig>,
        gates: Vec<GateConfig>,
        applications: Vec<GateApplication>,
    ) -> Self {
        let spectrum_index = spectra
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), i))
            .collect();

        let mut kept = Vec::with_capacity(gates.len());
        let mut rejected = Vec::new();
        for config in gates {
            let name = config.name.clone();
            match Gate::try_from(config) {
                Ok(gate) => kept.push(Arc::new(gate)),
                Err(e) => {
                    warn!(gate = %name, "skipping gate: {}", e);
                    rejected.push((name, e));
                }
            }
        }
        let gate_index = kept
            .iter()
            .enumerate()
            .map(|(i, g)| (g.name().to_string(), i))
            .collect();

        let applications = applications
            .into_iter()
            .map(|a| (a.spectrum, a.gate))
            .collect();

        debug!(
            spectra = spectra.len(),
            gates = kept.len(),
            rejected = rejected.len(),
            "catalog indexed"
        );

        Self {
            spectra,
            spectrum_index,
            gates: kept,
            gate_index,
            applications,
            rejected,
            policy: OutOfRangePolicy::default(),
        }
    }

    /// Out-of-range policy for spectra built from this catalog.
    pub fn with_policy(mut self, policy: OutOfRangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn from_listing(listing: Listing) -> Self {
        Self::new(listing.spectra, listing.gates, listing.applications)
    }

    /// Parse a JSON [`Listing`].
    pub fn from_json(json: &str) -> SpectrumResult<Self> {
        let listing: Listing = serde_json::from_str(json)
            .map_err(|e| SpectrumError::configuration(format!("invalid listing: {}", e)))?;
        Ok(Self::from_listing(listing))
    }

    pub fn policy(&self) -> OutOfRangePolicy {
        self.policy
    }

    pub fn spectrum_config(&self, name: &str) -> Option<&SpectrumConfig> {
        self.spectrum_index.get(name).map(|&i| &self.spectra[i])
    }

    /// Spectrum names in listing order
    pub fn spectrum_names(&self) -> Vec<&str> {
        self.spectra.iter().map(|s| s.name.as_str()).collect()
    }

    /// Any valid gate by name, including ones omitted from [`Catalog::listed_gates`]
    pub fn gate(&self, name: &str) -> Option<&Arc<Gate>> {
        self.gate_index.get(name).map(|&i| &self.gates[i])
    }

    /// Gates worth listing: those over parameters or other gates, plus the
    /// constant True/False gates.
    pub fn listed_gates(&self) -> impl Iterator<Item = &Arc<Gate>> {
        self.gates.iter().filter(|g| is_listed(g))
    }

    pub fn gate_names(&self) -> Vec<&str> {
        self.listed_gates().map(|g| g.name()).collect()
    }

    pub fn rejected(&self) -> &[(String, SpectrumError)] {
        &self.rejected
    }

    /// Gate applied to `spectrum`.
    ///
    /// `Ok(None)` when the spectrum has no application entry or carries one of
    /// the [`UNGATED_MARKERS`]; an application naming an unknown gate is a
    /// configuration error.
    pub fn applied_gate(&self, spectrum: &str) -> SpectrumResult<Option<Arc<Gate>>> {
        let Some(gate) = self.applications.get(spectrum) else {
            return Ok(None);
        };
        if UNGATED_MARKERS.contains(&gate.as_str()) {
            return Ok(None);
        }
        self.gate(gate).cloned().map(Some).ok_or_else(|| {
            SpectrumError::configuration(format!(
                "spectrum '{}' applies unknown gate '{}'",
                spectrum, gate
            ))
        })
    }

    /// First listed gate defined over exactly the spectrum's parameters.
    pub fn show_gate(&self, spectrum: &str) -> Option<Arc<Gate>> {
        let config = self.spectrum_config(spectrum)?;
        self.listed_gates()
            .find(|g| !g.parameters().is_empty() && g.parameters() == config.parameters.as_slice())
            .cloned()
    }

    /// Spectra with a real gate applied
    pub fn gated_spectra(&self) -> Vec<&str> {
        self.spectra
            .iter()
            .filter(|s| matches!(self.applied_gate(&s.name), Ok(Some(_))))
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Build a spectrum snapshot from its listed definition and contents,
    /// with the applied and show gates attached.
    pub fn build_spectrum(&self, name: &str, contents: Vec<ChannelRow>) -> SpectrumResult<Spectrum> {
        let config = self
            .spectrum_config(name)
            .ok_or_else(|| SpectrumError::configuration(format!("unknown spectrum '{}'", name)))?;
        let spectrum = Spectrum::from_config(config, contents, self.policy)?
            .with_gate(self.applied_gate(name)?)
            .with_show_gate(self.show_gate(name));
        debug!(spectrum = name, gated = spectrum.is_gated(), "spectrum built");
        Ok(spectrum)
    }
}

fn is_listed(gate: &Gate) -> bool {
    matches!(gate.kind(), GateKind::True | GateKind::False)
        || !gate.parameters().is_empty()
        || !gate.referenced_gates().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ALL_ROW;
    use crate::axis::AxisDef;
    use crate::gate::Point;
    use crate::spectrum::CoordinateSystem;
    use approx::assert_relative_eq;

    fn spectrum_config(name: &str, type_code: &str, params: &[&str]) -> SpectrumConfig {
        SpectrumConfig {
            name: name.into(),
            type_code: type_code.into(),
            parameters: params.iter().map(|s| s.to_string()).collect(),
            axes: params.iter().map(|_| AxisDef::new(0.0, 100.0, 100)).collect(),
            chantype: "long".into(),
        }
    }

    fn contour(name: &str, params: &[&str], size: f64) -> GateConfig {
        GateConfig {
            name: name.into(),
            type_code: "c".into(),
            parameters: params.iter().map(|s| s.to_string()).collect(),
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(size, 0.0),
                Point::new(size, size),
                Point::new(0.0, size),
            ],
            ..Default::default()
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                spectrum_config("pid", "2", &["tof", "de"]),
                spectrum_config("energy", "1", &["e"]),
                spectrum_config("other", "2", &["a", "b"]),
            ],
            vec![
                contour("small", &["tof", "de"], 10.0),
                contour("large", &["tof", "de"], 50.0),
                GateConfig {
                    name: "both".into(),
                    type_code: "*".into(),
                    gates: vec!["small".into(), "large".into()],
                    ..Default::default()
                },
                GateConfig {
                    name: "always".into(),
                    type_code: "T".into(),
                    ..Default::default()
                },
                // contour with a single vertex fails validation
                GateConfig {
                    name: "broken".into(),
                    type_code: "c".into(),
                    parameters: vec!["tof".into(), "de".into()],
                    points: vec![Point::new(0.0, 0.0)],
                    ..Default::default()
                },
            ],
            vec![
                GateApplication {
                    spectrum: "pid".into(),
                    gate: "large".into(),
                },
                GateApplication {
                    spectrum: "energy".into(),
                    gate: "-TRUE-".into(),
                },
                GateApplication {
                    spectrum: "other".into(),
                    gate: "missing".into(),
                },
            ],
        )
    }

    #[test]
    fn test_indexing() {
        let cat = catalog();
        assert_eq!(cat.spectrum_names(), vec!["pid", "energy", "other"]);
        assert_eq!(cat.gate_names(), vec!["small", "large", "both", "always"]);
        assert_eq!(cat.rejected().len(), 1);
        assert_eq!(cat.rejected()[0].0, "broken");
        assert!(cat.gate("broken").is_none());
    }

    #[test]
    fn test_applied_gate() {
        let cat = catalog();
        assert_eq!(cat.applied_gate("pid").unwrap().unwrap().name(), "large");
        assert!(cat.applied_gate("energy").unwrap().is_none());
        assert!(cat.applied_gate("nonexistent").unwrap().is_none());
        assert!(matches!(
            cat.applied_gate("other"),
            Err(SpectrumError::Configuration(_))
        ));
        assert_eq!(cat.gated_spectra(), vec!["pid"]);
    }

    #[test]
    fn test_show_gate_matches_parameters() {
        let cat = catalog();
        assert_eq!(cat.show_gate("pid").unwrap().name(), "small");
        assert!(cat.show_gate("energy").is_none());
        assert!(cat.show_gate("other").is_none());
    }

    #[test]
    fn test_build_spectrum() {
        let cat = catalog().with_policy(OutOfRangePolicy::Drop);
        let sp = cat
            .build_spectrum(
                "pid",
                vec![
                    ChannelRow::new_2d(5, 5, 10),
                    ChannelRow::new_2d(30, 30, 10),
                    ChannelRow::new_2d(500, 5, 10),
                ],
            )
            .unwrap();
        assert_eq!(sp.table().len(), 2);
        assert_eq!(sp.gate().unwrap().name(), "large");

        // statistics follow the show gate
        let summary = sp.stats(CoordinateSystem::World).unwrap();
        assert_eq!(summary.all().unwrap().label, ALL_ROW);
        let row = summary.row("small").unwrap();
        assert_relative_eq!(row.ratio, 0.5);

        assert!(cat.build_spectrum("unknown", vec![]).is_err());
        assert!(cat.build_spectrum("other", vec![]).is_err());
    }

    #[test]
    fn test_from_json_server_shapes() {
        let cat = Catalog::from_json(
            r#"{
                "spectra": [{"name": "e", "type": "1", "parameters": ["e"],
                             "axes": [{"low": 0, "high": 1024, "bins": 1024}],
                             "chantype": "word"}],
                "gates": [{"name": "s", "type": "s", "parameters": ["e"], "low": 10, "high": 20}],
                "applications": [{"spectrum": "e", "gate": "s"}]
            }"#,
        )
        .unwrap();
        let rows: Vec<ChannelRow> =
            serde_json::from_str(r#"[{"x": 12, "v": 4}, {"x": 30, "v": 1}]"#).unwrap();
        let sp = cat.build_spectrum("e", rows).unwrap();
        assert_eq!(sp.table().total_count(), 5);
        assert_eq!(sp.show_gate().unwrap().name(), "s");

        let summary = sp.stats(CoordinateSystem::World).unwrap();
        assert_eq!(summary.row("s").unwrap().sum, 4.0);

        assert!(Catalog::from_json("{not json").is_err());
    }
}
