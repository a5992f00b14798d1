//! Parallel Batch Processing
//!
//! Rayon versions of the per-spectrum operations for working through a whole
//! catalog at once. Enable with the `parallel` feature (on by default).
//!
//! Every spectrum is an immutable snapshot, so each task reads only its own
//! input and results come back in input order.

use rayon::prelude::*;

use crate::analysis::{StatsSummary, WeightedStats};
use crate::catalog::Catalog;
use crate::error::SpectrumResult;
use crate::spectrum::{ChannelRow, CoordinateSystem, Spectrum};

/// Statistics of many spectra, one result per spectrum.
pub fn summarize_batch(
    spectra: &[Spectrum],
    coords: CoordinateSystem,
    stats: &WeightedStats,
) -> Vec<SpectrumResult<StatsSummary>> {
    spectra
        .par_iter()
        .map(|spectrum| spectrum.stats_with(coords, stats))
        .collect()
}

/// Build many spectra from one catalog.
///
/// `contents` pairs each spectrum name with its channel rows.
pub fn build_batch(
    catalog: &Catalog,
    contents: Vec<(String, Vec<ChannelRow>)>,
) -> Vec<SpectrumResult<Spectrum>> {
    contents
        .into_par_iter()
        .map(|(name, rows)| catalog.build_spectrum(&name, rows))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisDef;
    use crate::spectrum::{OutOfRangePolicy, SpectrumType};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_spectrum(rng: &mut StdRng, idx: usize) -> Spectrum {
        let rows = (0..200)
            .map(|_| ChannelRow::new_1d(rng.gen_range(0..64), rng.gen_range(1..50)))
            .collect();
        Spectrum::new(
            format!("s{}", idx),
            SpectrumType::OneD,
            vec!["e".into()],
            vec![AxisDef::new(0.0, 128.0, 64)],
            rows,
            OutOfRangePolicy::Keep,
        )
        .unwrap()
    }

    #[test]
    fn test_batch_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(7);
        let spectra: Vec<Spectrum> = (0..16).map(|i| random_spectrum(&mut rng, i)).collect();
        let stats = WeightedStats::default();

        let batch = summarize_batch(&spectra, CoordinateSystem::World, &stats);
        assert_eq!(batch.len(), spectra.len());
        for (spectrum, result) in spectra.iter().zip(&batch) {
            let expected = spectrum.stats_with(CoordinateSystem::World, &stats).unwrap();
            let got = result.as_ref().unwrap();
            assert_relative_eq!(got.all().unwrap().sum, expected.all().unwrap().sum);
            assert_eq!(got, &expected);
        }
    }

    #[test]
    fn test_build_batch_keeps_order_and_errors() {
        let catalog = Catalog::from_json(
            r#"{"spectra": [{"name": "a", "type": "1", "parameters": ["e"],
                             "axes": [{"low": 0, "high": 10, "bins": 10}]}]}"#,
        )
        .unwrap();
        let built = build_batch(
            &catalog,
            vec![
                ("a".into(), vec![ChannelRow::new_1d(1, 2)]),
                ("missing".into(), vec![]),
            ],
        );
        assert_eq!(built[0].as_ref().unwrap().name(), "a");
        assert!(built[1].is_err());
    }
}
