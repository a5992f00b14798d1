//! Statistics Summary
//!
//! One row for the whole table (`"All"`) plus one row per gate, with the
//! total weight, the fraction of it inside the gate, and the weighted moments
//! of each coordinate.

use super::weighted::{fwhm, WeightedStats};
use crate::error::SpectrumResult;
use crate::gate::NamedMask;
use crate::spectrum::Columns;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::trace;

/// Label of the row covering the whole table
pub const ALL_ROW: &str = "All";

/// Mean, standard deviation and Gaussian FWHM of one coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisMoments {
    pub mean: f64,
    pub std: f64,
    pub fwhm: f64,
}

/// Weighted moments of a 1D or 2D table
#[derive(Debug, Clone, PartialEq)]
pub enum Moments {
    OneD(AxisMoments),
    TwoD {
        x: AxisMoments,
        y: AxisMoments,
        /// Weighted correlation of x and y; undefined when either column is flat
        rho: SpectrumResult<f64>,
    },
}

impl Moments {
    pub fn x(&self) -> &AxisMoments {
        match self {
            Moments::OneD(x) | Moments::TwoD { x, .. } => x,
        }
    }

    pub fn y(&self) -> Option<&AxisMoments> {
        match self {
            Moments::OneD(_) => None,
            Moments::TwoD { y, .. } => Some(y),
        }
    }

    pub fn rho(&self) -> Option<&SpectrumResult<f64>> {
        match self {
            Moments::OneD(_) => None,
            Moments::TwoD { rho, .. } => Some(rho),
        }
    }
}

/// One labelled row of a summary.
///
/// `moments` carries its own error so a degenerate gate row (no counts inside)
/// still reports `sum` and `ratio`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRow {
    pub label: String,
    /// Total weight of the rows considered
    pub sum: f64,
    /// `sum` over the whole-table sum; 1.0 for `"All"`, 0.0 when `sum` is 0
    pub ratio: f64,
    pub moments: SpectrumResult<Moments>,
}

/// Statistics table keyed by row label
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSummary {
    /// Coordinate column labels
    pub labels: Vec<String>,
    pub rows: Vec<StatsRow>,
}

impl WeightedStats {
    /// Moments of every coordinate column.
    pub fn moments(&self, columns: &Columns) -> SpectrumResult<Moments> {
        columns.validate()?;
        let w = &columns.weights;
        let axis = |v: &[f64]| -> SpectrumResult<AxisMoments> {
            let mean = self.mean(v, w)?;
            let std = self.std(v, w)?;
            Ok(AxisMoments {
                mean,
                std,
                fwhm: fwhm(std),
            })
        };

        let x = axis(&columns.x)?;
        match &columns.y {
            None => Ok(Moments::OneD(x)),
            Some(ys) => Ok(Moments::TwoD {
                x,
                y: axis(ys)?,
                rho: self.correlation(&columns.x, ys, w),
            }),
        }
    }

    /// Summarize a table, optionally restricted by a gate mask.
    ///
    /// Fails only for malformed input (mismatched columns, a contour on 1D
    /// data); numerical degeneracies are reported per row.
    pub fn summarize(
        &self,
        columns: &Columns,
        gate: Option<&NamedMask>,
    ) -> SpectrumResult<StatsSummary> {
        columns.validate()?;
        let total = columns.total_weight();
        let mut rows = vec![StatsRow {
            label: ALL_ROW.to_string(),
            sum: total,
            ratio: 1.0,
            moments: self.moments(columns),
        }];

        if let Some(named) = gate {
            let inside = named.mask.filter(columns)?;
            let sum = inside.total_weight();
            let ratio = if sum == 0.0 { 0.0 } else { sum / total };
            trace!(gate = %named.name, rows = inside.len(), sum, "gate row");
            rows.push(StatsRow {
                label: named.name.clone(),
                sum,
                ratio,
                moments: self.moments(&inside),
            });
        }

        Ok(StatsSummary {
            labels: columns.labels.clone(),
            rows,
        })
    }
}

/// Summarize with default statistics settings.
pub fn summarize(columns: &Columns, gate: Option<&NamedMask>) -> SpectrumResult<StatsSummary> {
    WeightedStats::default().summarize(columns, gate)
}

impl StatsSummary {
    pub fn row(&self, label: &str) -> Option<&StatsRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// The whole-table row
    pub fn all(&self) -> Option<&StatsRow> {
        self.row(ALL_ROW)
    }

    pub fn dimension(&self) -> usize {
        self.labels.len()
    }

    fn headings(&self) -> &'static [&'static str] {
        if self.dimension() == 2 {
            &["Sum", "Ratio", "<x>", "<y>", "σx", "σy", "FWHMx", "FWHMy", "ρ"]
        } else {
            &["Sum", "Ratio", "<x>", "σx", "FWHM"]
        }
    }

    /// Fixed-width text table; degenerate rows show `N/A`.
    pub fn to_text(&self) -> String {
        let headings = self.headings();
        let width = 12;
        let label_width = self
            .rows
            .iter()
            .map(|r| r.label.chars().count())
            .max()
            .unwrap_or(0)
            .max(6);

        let mut output = String::new();
        output.push_str(&format!("Statistics [{}]\n", self.labels.join(", ")));
        output.push_str(&"═".repeat(label_width + (width + 2) * headings.len()));
        output.push('\n');
        output.push_str(&format!("{:<label_width$}", ""));
        for h in headings {
            output.push_str(&format!("  {:>width$}", h));
        }
        output.push('\n');
        output.push_str(&"─".repeat(label_width + (width + 2) * headings.len()));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&format!("{:<label_width$}", row.label));
            output.push_str(&format!("  {:>width$}", row.sum));
            output.push_str(&format!("  {:>width$.4}", row.ratio));
            let values: Vec<Option<f64>> = match &row.moments {
                Ok(Moments::OneD(x)) => vec![Some(x.mean), Some(x.std), Some(x.fwhm)],
                Ok(Moments::TwoD { x, y, rho }) => vec![
                    Some(x.mean),
                    Some(y.mean),
                    Some(x.std),
                    Some(y.std),
                    Some(x.fwhm),
                    Some(y.fwhm),
                    rho.as_ref().ok().copied(),
                ],
                Err(_) => vec![None; headings.len() - 2],
            };
            for v in values {
                match v {
                    Some(v) => output.push_str(&format!("  {:>width$.4}", v)),
                    None => output.push_str(&format!("  {:>width$}", "N/A")),
                }
            }
            output.push('\n');
        }
        output
    }

    /// JSON value keyed by row label.
    pub fn to_value(&self) -> Value {
        let rows: serde_json::Map<String, Value> = self
            .rows
            .iter()
            .map(|row| {
                let moments = match &row.moments {
                    Ok(Moments::OneD(x)) => json!({ "x": x }),
                    Ok(Moments::TwoD { x, y, rho }) => match rho {
                        Ok(rho) => json!({ "x": x, "y": y, "rho": rho }),
                        Err(e) => json!({ "x": x, "y": y, "rho": null, "rho_error": e.to_string() }),
                    },
                    Err(e) => json!({ "error": e.to_string() }),
                };
                (
                    row.label.clone(),
                    json!({ "sum": row.sum, "ratio": row.ratio, "moments": moments }),
                )
            })
            .collect();
        json!({ "labels": self.labels, "rows": rows })
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpectrumError;
    use crate::gate::{GateMask, Point};
    use approx::assert_relative_eq;

    fn two_d() -> Columns {
        Columns::two_d(
            ["tof".into(), "de".into()],
            vec![1.0, 2.0, 3.0, 8.0],
            vec![1.0, 2.5, 2.0, 9.0],
            vec![4.0, 2.0, 2.0, 8.0],
        )
    }

    fn unit_box(x0: f64, y0: f64, size: f64) -> NamedMask {
        NamedMask::new(
            "box",
            GateMask::Polygon(vec![
                Point::new(x0, y0),
                Point::new(x0 + size, y0),
                Point::new(x0 + size, y0 + size),
                Point::new(x0, y0 + size),
            ]),
        )
    }

    #[test]
    fn test_summary_1d() {
        let cols = Columns::one_d("energy", vec![0.0, 1.0, 2.0], vec![2.0; 3]);
        let summary = summarize(&cols, None).unwrap();
        assert_eq!(summary.rows.len(), 1);
        let all = summary.all().unwrap();
        assert_eq!(all.label, ALL_ROW);
        assert_eq!(all.sum, 6.0);
        assert_eq!(all.ratio, 1.0);
        let m = all.moments.as_ref().unwrap();
        assert_relative_eq!(m.x().mean, 1.0);
        assert_relative_eq!(m.x().std, (2.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert!(m.y().is_none());
        assert!(m.rho().is_none());
    }

    #[test]
    fn test_summary_2d_with_gate() {
        let cols = two_d();
        let gate = unit_box(0.0, 0.0, 4.0);
        let summary = summarize(&cols, Some(&gate)).unwrap();
        assert_eq!(summary.rows.len(), 2);

        let gated = summary.row("box").unwrap();
        assert_eq!(gated.sum, 8.0);
        assert_relative_eq!(gated.ratio, 0.5);
        let m = gated.moments.as_ref().unwrap();
        assert_relative_eq!(m.x().mean, (4.0 + 4.0 + 6.0) / 8.0);
        assert!(*m.rho().unwrap().as_ref().unwrap() > 0.0);
    }

    #[test]
    fn test_gate_excluding_everything() {
        let cols = two_d();
        let gate = unit_box(100.0, 100.0, 1.0);
        let summary = summarize(&cols, Some(&gate)).unwrap();
        let gated = summary.row("box").unwrap();
        assert_eq!(gated.sum, 0.0);
        assert_eq!(gated.ratio, 0.0);
        assert!(matches!(gated.moments, Err(SpectrumError::DivideByZero(_))));
        // the whole-table row is unaffected
        assert!(summary.all().unwrap().moments.is_ok());
        assert!(summary.to_text().contains("N/A"));
    }

    #[test]
    fn test_single_bin_gate_keeps_means() {
        let cols = two_d();
        // encloses only (8, 9)
        let gate = unit_box(7.5, 8.5, 1.0);
        let summary = summarize(&cols, Some(&gate)).unwrap();
        let gated = summary.row("box").unwrap();
        assert_eq!(gated.sum, 8.0);

        let m = gated.moments.as_ref().unwrap();
        assert_eq!(m.x().mean, 8.0);
        assert_eq!(m.y().unwrap().mean, 9.0);
        assert_eq!(m.x().std, 0.0);
        assert_eq!(m.y().unwrap().fwhm, 0.0);
        assert!(matches!(m.rho(), Some(Err(SpectrumError::DivideByZero(_)))));

        // only the correlation column is blank
        let text = summary.to_text();
        let line = text.lines().find(|l| l.starts_with("box")).unwrap();
        assert_eq!(line.matches("N/A").count(), 1);
        assert!(line.contains("8.0000"));

        let value = summary.to_value();
        assert!(value["rows"]["box"]["moments"]["rho"].is_null());
        assert_eq!(value["rows"]["box"]["moments"]["x"]["mean"], 8.0);
    }

    #[test]
    fn test_contour_on_1d_is_configuration_error() {
        let cols = Columns::one_d("energy", vec![0.0], vec![1.0]);
        let err = summarize(&cols, Some(&unit_box(0.0, 0.0, 1.0))).unwrap_err();
        assert!(matches!(err, SpectrumError::Configuration(_)));
    }

    #[test]
    fn test_empty_table() {
        let cols = Columns::one_d("energy", vec![], vec![]);
        let summary = summarize(&cols, None).unwrap();
        assert_eq!(summary.all().unwrap().sum, 0.0);
        assert!(summary.all().unwrap().moments.is_err());
    }

    #[test]
    fn test_text_and_json() {
        let summary = summarize(&two_d(), Some(&unit_box(0.0, 0.0, 4.0))).unwrap();
        let text = summary.to_text();
        assert!(text.contains("FWHMy"));
        assert!(text.contains("box"));

        let value: Value = serde_json::from_str(&summary.to_json()).unwrap();
        assert_eq!(value["labels"][1], "de");
        assert_eq!(value["rows"]["All"]["sum"], 16.0);
        assert_eq!(value["rows"]["box"]["ratio"], 0.5);
        assert!(value["rows"]["All"]["moments"]["rho"].is_number());
    }
}
