//! Gates
//!
//! A gate is a named selection predicate defined on the server. Each of the
//! SpecTcl gate types is a variant of [`GateDefinition`] carrying exactly the
//! payload that type needs, so statistics and drawing code match on it
//! exhaustively.
//!
//! | Code | Kind          | Payload                     |
//! |------|---------------|-----------------------------|
//! | `s`  | Slice         | parameter, low, high        |
//! | `b`  | Band          | 2 parameters, polyline      |
//! | `c`  | Contour       | 2 parameters, polygon       |
//! | `*`  | And           | gate names                  |
//! | `+`  | Or            | gate names                  |
//! | `-`  | Not           | one gate name               |
//! | `gs` | GammaSlice    | parameters, low, high       |
//! | `gb` | GammaBand     | parameters, polyline        |
//! | `gc` | GammaContour  | parameters, polygon         |
//! | `em` | EqualMask     | parameter, mask value       |
//! | `am` | AndMask       | parameter, mask value       |
//! | `nm` | AndNotMask    | parameter, mask value       |
//! | `T`  | True          |                             |
//! | `F`  | False         |                             |

pub mod mask;

pub use mask::{contains, filter, GateMask, NamedMask, Point};

use crate::error::{SpectrumError, SpectrumResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gate type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    Slice,
    Band,
    Contour,
    And,
    Or,
    Not,
    GammaSlice,
    GammaBand,
    GammaContour,
    EqualMask,
    AndMask,
    AndNotMask,
    True,
    False,
}

impl GateKind {
    pub const ALL: [GateKind; 14] = [
        GateKind::Slice,
        GateKind::Band,
        GateKind::Contour,
        GateKind::And,
        GateKind::Or,
        GateKind::Not,
        GateKind::GammaSlice,
        GateKind::GammaBand,
        GateKind::GammaContour,
        GateKind::EqualMask,
        GateKind::AndMask,
        GateKind::AndNotMask,
        GateKind::True,
        GateKind::False,
    ];

    /// Server type code
    pub fn code(&self) -> &'static str {
        match self {
            GateKind::Slice => "s",
            GateKind::Band => "b",
            GateKind::Contour => "c",
            GateKind::And => "*",
            GateKind::Or => "+",
            GateKind::Not => "-",
            GateKind::GammaSlice => "gs",
            GateKind::GammaBand => "gb",
            GateKind::GammaContour => "gc",
            GateKind::EqualMask => "em",
            GateKind::AndMask => "am",
            GateKind::AndNotMask => "nm",
            GateKind::True => "T",
            GateKind::False => "F",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GateKind::Slice => "Slice",
            GateKind::Band => "Band",
            GateKind::Contour => "Contour",
            GateKind::And => "And",
            GateKind::Or => "Or",
            GateKind::Not => "Not",
            GateKind::GammaSlice => "GammaSlice",
            GateKind::GammaBand => "GammaBand",
            GateKind::GammaContour => "GammaContour",
            GateKind::EqualMask => "EqualMask",
            GateKind::AndMask => "AndMask",
            GateKind::AndNotMask => "AndNotMask",
            GateKind::True => "True",
            GateKind::False => "False",
        }
    }

    /// Parse a server type code (`"c"`) or kind name (`"Contour"`).
    pub fn from_code(s: &str) -> SpectrumResult<Self> {
        GateKind::ALL
            .into_iter()
            .find(|k| k.code() == s || k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| SpectrumError::configuration(format!("unknown gate type '{}'", s)))
    }

    /// Boolean combination of other gates
    pub fn is_compound(&self) -> bool {
        matches!(self, GateKind::And | GateKind::Or | GateKind::Not)
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GateKind {
    type Err = SpectrumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GateKind::from_code(s)
    }
}

/// Gate record as listed by the server
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GateConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_code: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub gates: Vec<String>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub value: Option<u32>,
}

/// Kind-specific gate payload
#[derive(Debug, Clone, PartialEq)]
pub enum GateDefinition {
    Slice { parameter: String, low: f64, high: f64 },
    Band { parameters: [String; 2], points: Vec<Point> },
    Contour { parameters: [String; 2], points: Vec<Point> },
    And(Vec<String>),
    Or(Vec<String>),
    Not(String),
    GammaSlice { parameters: Vec<String>, low: f64, high: f64 },
    GammaBand { parameters: Vec<String>, points: Vec<Point> },
    GammaContour { parameters: Vec<String>, points: Vec<Point> },
    EqualMask { parameter: String, value: u32 },
    AndMask { parameter: String, value: u32 },
    AndNotMask { parameter: String, value: u32 },
    True,
    False,
}

impl GateDefinition {
    pub fn kind(&self) -> GateKind {
        match self {
            GateDefinition::Slice { .. } => GateKind::Slice,
            GateDefinition::Band { .. } => GateKind::Band,
            GateDefinition::Contour { .. } => GateKind::Contour,
            GateDefinition::And(_) => GateKind::And,
            GateDefinition::Or(_) => GateKind::Or,
            GateDefinition::Not(_) => GateKind::Not,
            GateDefinition::GammaSlice { .. } => GateKind::GammaSlice,
            GateDefinition::GammaBand { .. } => GateKind::GammaBand,
            GateDefinition::GammaContour { .. } => GateKind::GammaContour,
            GateDefinition::EqualMask { .. } => GateKind::EqualMask,
            GateDefinition::AndMask { .. } => GateKind::AndMask,
            GateDefinition::AndNotMask { .. } => GateKind::AndNotMask,
            GateDefinition::True => GateKind::True,
            GateDefinition::False => GateKind::False,
        }
    }
}

/// A named gate snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    name: String,
    definition: GateDefinition,
}

impl Gate {
    pub fn new(name: impl Into<String>, definition: GateDefinition) -> Self {
        Self {
            name: name.into(),
            definition,
        }
    }

    /// Contour gate over two parameters
    pub fn contour(
        name: impl Into<String>,
        parameters: [&str; 2],
        points: Vec<Point>,
    ) -> SpectrumResult<Self> {
        if points.len() < 3 {
            return Err(SpectrumError::configuration(format!(
                "contour needs at least 3 points, got {}",
                points.len()
            )));
        }
        Ok(Self::new(
            name,
            GateDefinition::Contour {
                parameters: parameters.map(String::from),
                points,
            },
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> GateKind {
        self.definition.kind()
    }

    pub fn definition(&self) -> &GateDefinition {
        &self.definition
    }

    /// Parameters of a leaf gate; empty for compound and constant gates.
    pub fn parameters(&self) -> &[String] {
        match &self.definition {
            GateDefinition::Slice { parameter, .. }
            | GateDefinition::EqualMask { parameter, .. }
            | GateDefinition::AndMask { parameter, .. }
            | GateDefinition::AndNotMask { parameter, .. } => std::slice::from_ref(parameter),
            GateDefinition::Band { parameters, .. } | GateDefinition::Contour { parameters, .. } => {
                parameters
            }
            GateDefinition::GammaSlice { parameters, .. }
            | GateDefinition::GammaBand { parameters, .. }
            | GateDefinition::GammaContour { parameters, .. } => parameters,
            GateDefinition::And(_)
            | GateDefinition::Or(_)
            | GateDefinition::Not(_)
            | GateDefinition::True
            | GateDefinition::False => &[],
        }
    }

    /// Names of gates a compound gate refers to
    pub fn referenced_gates(&self) -> &[String] {
        match &self.definition {
            GateDefinition::And(gates) | GateDefinition::Or(gates) => gates,
            GateDefinition::Not(gate) => std::slice::from_ref(gate),
            _ => &[],
        }
    }

    /// Vertices for overlay drawing (contours and bands)
    pub fn points(&self) -> &[Point] {
        match &self.definition {
            GateDefinition::Band { points, .. }
            | GateDefinition::Contour { points, .. }
            | GateDefinition::GammaBand { points, .. }
            | GateDefinition::GammaContour { points, .. } => points,
            _ => &[],
        }
    }

    /// Region this gate selects on a spectrum over `parameters`.
    ///
    /// A contour applies when its parameter pair is the spectrum's, in either
    /// order; a slice applies to the spectrum axis carrying its parameter.
    /// Gamma gates apply when the spectrum's parameters are among theirs.
    /// Gates over other parameters, and bands, masks, compounds and
    /// constants, have no region here.
    pub fn mask(&self, parameters: &[String]) -> Option<GateMask> {
        match &self.definition {
            GateDefinition::Contour { parameters: on, points } => match parameters {
                [x, y] if *x == on[0] && *y == on[1] => Some(GateMask::Polygon(points.clone())),
                [x, y] if *x == on[1] && *y == on[0] => Some(GateMask::Polygon(
                    points.iter().map(|p| Point::new(p.y, p.x)).collect(),
                )),
                _ => None,
            },
            GateDefinition::GammaContour { parameters: on, points } => match parameters {
                [x, y] if on.contains(x) && on.contains(y) => Some(GateMask::Polygon(points.clone())),
                _ => None,
            },
            GateDefinition::Slice { parameter, low, high } => parameters
                .iter()
                .position(|p| p == parameter)
                .map(|axis| GateMask::Interval {
                    axis,
                    low: *low,
                    high: *high,
                }),
            GateDefinition::GammaSlice { parameters: on, low, high } => parameters
                .iter()
                .position(|p| on.contains(p))
                .map(|axis| GateMask::Interval {
                    axis,
                    low: *low,
                    high: *high,
                }),
            GateDefinition::Band { .. }
            | GateDefinition::GammaBand { .. }
            | GateDefinition::And(_)
            | GateDefinition::Or(_)
            | GateDefinition::Not(_)
            | GateDefinition::EqualMask { .. }
            | GateDefinition::AndMask { .. }
            | GateDefinition::AndNotMask { .. }
            | GateDefinition::True
            | GateDefinition::False => None,
        }
    }

    /// [`mask`](Self::mask) tagged with this gate's name
    pub fn named_mask(&self, parameters: &[String]) -> Option<NamedMask> {
        self.mask(parameters).map(|m| NamedMask::new(self.name.clone(), m))
    }
}

impl TryFrom<GateConfig> for Gate {
    type Error = SpectrumError;

    fn try_from(cfg: GateConfig) -> Result<Self, Self::Error> {
        let kind = GateKind::from_code(&cfg.type_code)?;
        let name = cfg.name;
        let err = |msg: String| SpectrumError::configuration(format!("gate '{}': {}", name, msg));

        let one_param = |params: Vec<String>| -> SpectrumResult<String> {
            match <[String; 1]>::try_from(params) {
                Ok([p]) => Ok(p),
                Err(v) => Err(err(format!("expected 1 parameter, got {}", v.len()))),
            }
        };
        let two_params = |params: Vec<String>| -> SpectrumResult<[String; 2]> {
            <[String; 2]>::try_from(params)
                .map_err(|v| err(format!("expected 2 parameters, got {}", v.len())))
        };
        let limits = || -> SpectrumResult<(f64, f64)> {
            match (cfg.low, cfg.high) {
                (Some(low), Some(high)) if low <= high => Ok((low, high)),
                (Some(low), Some(high)) => Err(err(format!("low {} above high {}", low, high))),
                _ => Err(err("slice needs low and high".to_string())),
            }
        };
        let min_points = |n: usize| -> SpectrumResult<()> {
            if cfg.points.len() < n {
                return Err(err(format!(
                    "{} needs at least {} points, got {}",
                    kind,
                    n,
                    cfg.points.len()
                )));
            }
            Ok(())
        };
        let mask_value = || cfg.value.ok_or_else(|| err("mask gate needs a value".to_string()));

        let definition = match kind {
            GateKind::Slice => {
                let (low, high) = limits()?;
                GateDefinition::Slice {
                    parameter: one_param(cfg.parameters.clone())?,
                    low,
                    high,
                }
            }
            GateKind::Band => {
                min_points(2)?;
                GateDefinition::Band {
                    parameters: two_params(cfg.parameters.clone())?,
                    points: cfg.points.clone(),
                }
            }
            GateKind::Contour => {
                min_points(3)?;
                GateDefinition::Contour {
                    parameters: two_params(cfg.parameters.clone())?,
                    points: cfg.points.clone(),
                }
            }
            GateKind::And | GateKind::Or => {
                if cfg.gates.is_empty() {
                    return Err(err(format!("{} needs at least 1 gate", kind)));
                }
                if kind == GateKind::And {
                    GateDefinition::And(cfg.gates.clone())
                } else {
                    GateDefinition::Or(cfg.gates.clone())
                }
            }
            GateKind::Not => match <[String; 1]>::try_from(cfg.gates.clone()) {
                Ok([g]) => GateDefinition::Not(g),
                Err(v) => return Err(err(format!("Not needs exactly 1 gate, got {}", v.len()))),
            },
            GateKind::GammaSlice => {
                let (low, high) = limits()?;
                GateDefinition::GammaSlice {
                    parameters: cfg.parameters.clone(),
                    low,
                    high,
                }
            }
            GateKind::GammaBand => {
                min_points(2)?;
                GateDefinition::GammaBand {
                    parameters: cfg.parameters.clone(),
                    points: cfg.points.clone(),
                }
            }
            GateKind::GammaContour => {
                min_points(3)?;
                GateDefinition::GammaContour {
                    parameters: cfg.parameters.clone(),
                    points: cfg.points.clone(),
                }
            }
            GateKind::EqualMask => GateDefinition::EqualMask {
                parameter: one_param(cfg.parameters.clone())?,
                value: mask_value()?,
            },
            GateKind::AndMask => GateDefinition::AndMask {
                parameter: one_param(cfg.parameters.clone())?,
                value: mask_value()?,
            },
            GateKind::AndNotMask => GateDefinition::AndNotMask {
                parameter: one_param(cfg.parameters.clone())?,
                value: mask_value()?,
            },
            GateKind::True => GateDefinition::True,
            GateKind::False => GateDefinition::False,
        };

        Ok(Gate::new(name.clone(), definition))
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind().is_compound() {
            return write!(
                f,
                "Gate '{}': '{}' on gates {:?}",
                self.name,
                self.kind(),
                self.referenced_gates()
            );
        }
        write!(
            f,
            "Gate '{}': '{}' on parameters {:?}",
            self.name,
            self.kind(),
            self.parameters()
        )?;
        if matches!(self.kind(), GateKind::Contour | GateKind::GammaContour) {
            write!(f, " of ({}) points", self.points().len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contour_config() -> GateConfig {
        serde_json::from_str(
            r#"{
                "name": "pid",
                "type": "c",
                "parameters": ["tof", "de"],
                "points": [{"x": 0, "y": 0}, {"x": 4, "y": 0}, {"x": 2, "y": 3}]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_kind_codes() {
        for kind in GateKind::ALL {
            assert_eq!(GateKind::from_code(kind.code()).unwrap(), kind);
            assert_eq!(kind.name().parse::<GateKind>().unwrap(), kind);
        }
        assert!(GateKind::from_code("zz").is_err());
    }

    #[test]
    fn test_contour_from_config() {
        let gate = Gate::try_from(contour_config()).unwrap();
        assert_eq!(gate.kind(), GateKind::Contour);
        assert_eq!(gate.parameters(), &["tof".to_string(), "de".to_string()]);
        assert_eq!(gate.points().len(), 3);
        let tof_de = ["tof".to_string(), "de".to_string()];
        assert!(matches!(gate.mask(&tof_de), Some(GateMask::Polygon(_))));
        assert_eq!(
            gate.to_string(),
            "Gate 'pid': 'Contour' on parameters [\"tof\", \"de\"] of (3) points"
        );
    }

    #[test]
    fn test_mask_follows_spectrum_parameters() {
        let gate = Gate::try_from(contour_config()).unwrap();
        let params = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();

        assert!(gate.mask(&params(&["a", "b"])).is_none());
        assert!(gate.mask(&params(&["tof"])).is_none());
        assert!(gate.mask(&params(&["tof", "x"])).is_none());

        // transposed spectrum sees the polygon with swapped coordinates
        let swapped = gate.mask(&params(&["de", "tof"])).unwrap();
        assert_eq!(swapped.vertices()[1], Point::new(0.0, 4.0));

        let slice = Gate::new(
            "deslice",
            GateDefinition::Slice {
                parameter: "de".into(),
                low: 50.0,
                high: 100.0,
            },
        );
        assert_eq!(
            slice.mask(&params(&["tof", "de"])),
            Some(GateMask::Interval { axis: 1, low: 50.0, high: 100.0 })
        );
        assert!(slice.mask(&params(&["tof", "e"])).is_none());

        let gamma = Gate::new(
            "gs",
            GateDefinition::GammaSlice {
                parameters: params(&["g1", "g2", "g3"]),
                low: 1.0,
                high: 2.0,
            },
        );
        assert_eq!(
            gamma.mask(&params(&["g3"])),
            Some(GateMask::Interval { axis: 0, low: 1.0, high: 2.0 })
        );
        assert!(gamma.mask(&params(&["h"])).is_none());
    }

    #[test]
    fn test_contour_too_few_points() {
        let mut cfg = contour_config();
        cfg.points.truncate(2);
        assert!(matches!(Gate::try_from(cfg), Err(SpectrumError::Configuration(_))));
        assert!(Gate::contour("c", ["a", "b"], vec![Point::new(0.0, 0.0)]).is_err());
    }

    #[test]
    fn test_slice_gate() {
        let cfg = GateConfig {
            name: "peak".into(),
            type_code: "s".into(),
            parameters: vec!["energy".into()],
            low: Some(10.0),
            high: Some(20.0),
            ..Default::default()
        };
        let gate = Gate::try_from(cfg.clone()).unwrap();
        assert_eq!(
            gate.mask(&["energy".to_string()]),
            Some(GateMask::Interval { axis: 0, low: 10.0, high: 20.0 })
        );
        assert!(gate.points().is_empty());

        let missing = GateConfig { high: None, ..cfg };
        assert!(Gate::try_from(missing).is_err());
    }

    #[test]
    fn test_compound_gates() {
        let and = Gate::try_from(GateConfig {
            name: "both".into(),
            type_code: "*".into(),
            gates: vec!["a".into(), "b".into()],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(and.referenced_gates().len(), 2);
        assert!(and.parameters().is_empty());
        assert!(and.mask(&["a".to_string(), "b".to_string()]).is_none());
        assert_eq!(and.to_string(), "Gate 'both': 'And' on gates [\"a\", \"b\"]");

        let not = GateConfig {
            name: "neither".into(),
            type_code: "-".into(),
            gates: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        assert!(Gate::try_from(not).is_err());
    }

    #[test]
    fn test_mask_and_constant_gates() {
        let em = Gate::try_from(GateConfig {
            name: "bit3".into(),
            type_code: "em".into(),
            parameters: vec!["pattern".into()],
            value: Some(8),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(em.kind(), GateKind::EqualMask);
        assert!(em.mask(&["pattern".to_string()]).is_none());

        let t = Gate::try_from(GateConfig {
            name: "always".into(),
            type_code: "T".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(t.definition(), &GateDefinition::True);
        assert!(t.parameters().is_empty());
    }
}
