//! Biomarker normalization
//!
//! Two formulas exist and both are kept:
//! - Sequence payloads use direct ratios against the nominal input ranges, unclamped
//! - Text payloads use capped ratios, with IgA and sleep inverted around a
//!   healthy reference point

use crate::types::{BiomarkerInput, NormalizedMetrics};

/// Upper bounds of the nominal input ranges
const CORTISOL_MAX: f64 = 20.0;
const AMYLASE_MAX: f64 = 200.0;
const IGA_MAX: f64 = 80.0;
const SLEEP_MAX: f64 = 12.0;

/// Reference points for the text-payload formula
const TEXT_CORTISOL_SCALE: f64 = 25.0;
const TEXT_IGA_REFERENCE: f64 = 50.0;
const TEXT_IGA_SPAN: f64 = 30.0;
const TEXT_SLEEP_TARGET: f64 = 8.0;

/// Normalizer for biomarker readings
pub struct Normalizer;

impl Normalizer {
    /// Direct ratios. Readings outside the nominal range give values outside 0-1.
    pub fn direct_ratios(input: &BiomarkerInput) -> NormalizedMetrics {
        NormalizedMetrics {
            cortisol_norm: input.cortisol / CORTISOL_MAX,
            amylase_norm: input.amylase / AMYLASE_MAX,
            iga_norm: input.iga / IGA_MAX,
            sleep_norm: input.sleep_hours / SLEEP_MAX,
        }
    }

    /// Capped ratios with IgA and sleep inverted: low IgA and short sleep score high.
    pub fn inverted_ratios(input: &BiomarkerInput) -> NormalizedMetrics {
        NormalizedMetrics {
            cortisol_norm: (input.cortisol / TEXT_CORTISOL_SCALE).min(1.0),
            amylase_norm: (input.amylase / AMYLASE_MAX).min(1.0),
            iga_norm: ((TEXT_IGA_REFERENCE - input.iga) / TEXT_IGA_SPAN).clamp(0.0, 1.0),
            sleep_norm: ((TEXT_SLEEP_TARGET - input.sleep_hours) / TEXT_SLEEP_TARGET)
                .clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_input(iga: f64, sleep_hours: f64) -> BiomarkerInput {
        BiomarkerInput {
            name: "test".to_string(),
            age: 40,
            cortisol: 10.0,
            amylase: 100.0,
            iga,
            sleep_hours,
        }
    }

    #[test]
    fn test_direct_ratios() {
        let metrics = Normalizer::direct_ratios(&make_test_input(40.0, 6.0));
        assert!((metrics.cortisol_norm - 0.5).abs() < 1e-9);
        assert!((metrics.amylase_norm - 0.5).abs() < 1e-9);
        assert!((metrics.iga_norm - 0.5).abs() < 1e-9);
        assert!((metrics.sleep_norm - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_direct_ratios_are_not_clamped() {
        let mut input = make_test_input(100.0, -3.0);
        input.cortisol = 30.0;
        let metrics = Normalizer::direct_ratios(&input);
        assert!((metrics.cortisol_norm - 1.5).abs() < 1e-9);
        assert!((metrics.iga_norm - 1.25).abs() < 1e-9);
        assert!((metrics.sleep_norm + 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_ratios() {
        let metrics = Normalizer::inverted_ratios(&make_test_input(35.0, 6.0));
        assert!((metrics.cortisol_norm - 0.4).abs() < 1e-9);
        assert!((metrics.amylase_norm - 0.5).abs() < 1e-9);
        assert!((metrics.iga_norm - 0.5).abs() < 1e-9);
        assert!((metrics.sleep_norm - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_ratios_clamp() {
        let mut input = make_test_input(70.0, 10.0);
        input.cortisol = 40.0;
        input.amylase = 260.0;
        let metrics = Normalizer::inverted_ratios(&input);
        assert_eq!(metrics.cortisol_norm, 1.0);
        assert_eq!(metrics.amylase_norm, 1.0);
        assert_eq!(metrics.iga_norm, 0.0);
        assert_eq!(metrics.sleep_norm, 0.0);

        let metrics = Normalizer::inverted_ratios(&make_test_input(10.0, 0.0));
        assert_eq!(metrics.iga_norm, 1.0);
        assert_eq!(metrics.sleep_norm, 1.0);
    }
}
