//! Response interpretation
//!
//! Turns a raw prediction payload into a `StressAssessment`. Sequence payloads
//! (prediction text, gauge chart, biomarker chart) and bare strings are
//! understood; anything else is rejected with the payload in the error.

use serde_json::Value;
use tracing::debug;

use crate::error::StressError;
use crate::extract::{self, DEFAULT_SCORE};
use crate::normalizer::Normalizer;
use crate::payload::RawPrediction;
use crate::types::{BiomarkerInput, StressAssessment, StressLevel};

pub const HIGH_STRESS_ADVICE: &str =
    "Consider stress management techniques and professional consultation";
pub const LOW_STRESS_ADVICE: &str = "Excellent stress management! Continue your healthy lifestyle";
pub const MODERATE_STRESS_ADVICE: &str = "Monitor stress levels and consider lifestyle adjustments";
pub const MONITORING_REMINDER: &str = "Regular biomarker monitoring recommended for optimal health";

pub const TEXT_PAYLOAD_NOTE: &str = "Analysis based on your biomarker levels";
pub const TEXT_PAYLOAD_REMINDER: &str = "Continue monitoring your stress indicators";

/// Interpret a prediction payload for the given input
pub fn interpret(payload: &Value, input: &BiomarkerInput) -> Result<StressAssessment, StressError> {
    let prediction = RawPrediction::classify(payload);
    debug!(shape = prediction.shape_name(), "classified prediction payload");

    match prediction {
        RawPrediction::Sequence {
            prediction_text,
            gauge_chart,
            biomarker_chart: _,
        } => Ok(interpret_sequence(&prediction_text, gauge_chart.as_ref(), input)),
        RawPrediction::Text(text) => Ok(interpret_text(text, input)),
        RawPrediction::Unrecognized(value) => Err(StressError::Parse(value.to_string())),
    }
}

fn interpret_sequence(
    prediction_text: &Value,
    gauge_chart: Option<&Value>,
    input: &BiomarkerInput,
) -> StressAssessment {
    let text = prediction_text.as_str();

    let mut raw_score = DEFAULT_SCORE;
    if let Some((score, matcher)) = text.and_then(extract::score_from_text) {
        debug!(score, matcher, "score found in prediction text");
        raw_score = score;
    }
    if let Some(score) = gauge_chart.and_then(extract::gauge_score) {
        debug!(score, "score taken from gauge chart");
        raw_score = score;
    }

    let score = extract::finalize_score(raw_score);
    let headline = match text {
        Some(text) => text.to_string(),
        None => format!("Stress probability: {}%", one_decimal(raw_score)),
    };

    StressAssessment {
        score,
        level: StressLevel::from_score(f64::from(score)),
        recommendations: vec![
            headline,
            tier_advice(raw_score).to_string(),
            MONITORING_REMINDER.to_string(),
        ],
        metrics: Normalizer::direct_ratios(input),
        input: input.clone(),
    }
}

fn interpret_text(text: String, input: &BiomarkerInput) -> StressAssessment {
    let raw_score = extract::bare_number(&text).unwrap_or(DEFAULT_SCORE);
    debug!(raw_score, "score taken from text payload");
    let score = extract::finalize_score(raw_score);

    StressAssessment {
        score,
        level: StressLevel::from_score(f64::from(score)),
        recommendations: vec![
            text,
            TEXT_PAYLOAD_NOTE.to_string(),
            TEXT_PAYLOAD_REMINDER.to_string(),
        ],
        metrics: Normalizer::inverted_ratios(input),
        input: input.clone(),
    }
}

/// One decimal place, exact halves rounded away from zero.
///
/// `{:.1}` already rounds to the nearest representable decimal; it differs only
/// on exact ties (x.x5 with an exact binary value), where it rounds to even.
fn one_decimal(value: f64) -> String {
    let quarters = value * 4.0;
    if quarters.fract() == 0.0 && quarters.rem_euclid(2.0) == 1.0 {
        format!("{:.1}", (value * 10.0).round() / 10.0)
    } else {
        format!("{value:.1}")
    }
}

/// Advice tier, chosen on the unrounded score
fn tier_advice(raw_score: f64) -> &'static str {
    if raw_score > 70.0 {
        HIGH_STRESS_ADVICE
    } else if raw_score < 30.0 {
        LOW_STRESS_ADVICE
    } else {
        MODERATE_STRESS_ADVICE
    }
}
