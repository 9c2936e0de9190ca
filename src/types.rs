//! Core types for biomarker stress assessment
//!
//! `BiomarkerInput` flows into the remote model, `StressAssessment` comes out of
//! the interpreter. Field labels on the wire match the remote operation's
//! argument names.

use serde::{Deserialize, Serialize};

use crate::error::StressError;

/// Inclusive bounds accepted for each biomarker
pub const AGE_RANGE: (u32, u32) = (1, 120);
pub const CORTISOL_RANGE: (f64, f64) = (0.0, 20.0);
pub const AMYLASE_RANGE: (f64, f64) = (50.0, 200.0);
pub const IGA_RANGE: (f64, f64) = (20.0, 80.0);
pub const SLEEP_RANGE: (f64, f64) = (0.0, 12.0);

/// Biomarker readings for a single submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerInput {
    /// Display name of the person assessed
    #[serde(rename = "user_name")]
    pub name: String,
    /// Age in years
    #[serde(rename = "user_age")]
    pub age: u32,
    /// Salivary cortisol (μg/dL)
    #[serde(rename = "cortisol_val")]
    pub cortisol: f64,
    /// Salivary alpha-amylase (U/L)
    #[serde(rename = "amylase_val")]
    pub amylase: f64,
    /// Secretory immunoglobulin A (mg/dL)
    #[serde(rename = "iga_val")]
    pub iga: f64,
    /// Hours slept the previous night
    #[serde(rename = "sleep_val")]
    pub sleep_hours: f64,
}

impl BiomarkerInput {
    /// Check every reading against its accepted range.
    ///
    /// Submission and interpretation do not call this; callers collecting user
    /// input are expected to.
    pub fn validate(&self) -> Result<(), StressError> {
        if self.name.trim().is_empty() {
            return Err(StressError::InvalidInput("name is required".to_string()));
        }
        if self.age < AGE_RANGE.0 || self.age > AGE_RANGE.1 {
            return Err(StressError::InvalidInput(format!(
                "age {} outside {}-{}",
                self.age, AGE_RANGE.0, AGE_RANGE.1
            )));
        }
        check_range("cortisol", self.cortisol, CORTISOL_RANGE)?;
        check_range("amylase", self.amylase, AMYLASE_RANGE)?;
        check_range("iga", self.iga, IGA_RANGE)?;
        check_range("sleep", self.sleep_hours, SLEEP_RANGE)?;
        Ok(())
    }
}

fn check_range(field: &str, value: f64, (min, max): (f64, f64)) -> Result<(), StressError> {
    if !value.is_finite() || value < min || value > max {
        return Err(StressError::InvalidInput(format!(
            "{field} {value} outside {min}-{max}"
        )));
    }
    Ok(())
}

/// Discrete stress category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressLevel {
    Low,
    Moderate,
    High,
}

impl StressLevel {
    /// Category for a stress index. 30 and 70 are both Moderate.
    pub fn from_score(score: f64) -> Self {
        if score < 30.0 {
            StressLevel::Low
        } else if score > 70.0 {
            StressLevel::High
        } else {
            StressLevel::Moderate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::Low => "Low",
            StressLevel::Moderate => "Moderate",
            StressLevel::High => "High",
        }
    }
}

/// Per-biomarker ratios against their nominal ranges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetrics {
    pub cortisol_norm: f64,
    pub amylase_norm: f64,
    pub iga_norm: f64,
    pub sleep_norm: f64,
}

/// Interpreted result of one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressAssessment {
    /// Stress index (0-100)
    pub score: u8,
    pub level: StressLevel,
    /// Always three entries: model text, tier advice, monitoring reminder
    pub recommendations: Vec<String>,
    pub metrics: NormalizedMetrics,
    /// Submitted readings, echoed unmodified
    #[serde(flatten)]
    pub input: BiomarkerInput,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_input() -> BiomarkerInput {
        BiomarkerInput {
            name: "Ada".to_string(),
            age: 34,
            cortisol: 12.5,
            amylase: 110.0,
            iga: 45.0,
            sleep_hours: 6.5,
        }
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(StressLevel::from_score(0.0), StressLevel::Low);
        assert_eq!(StressLevel::from_score(29.0), StressLevel::Low);
        assert_eq!(StressLevel::from_score(30.0), StressLevel::Moderate);
        assert_eq!(StressLevel::from_score(50.0), StressLevel::Moderate);
        assert_eq!(StressLevel::from_score(70.0), StressLevel::Moderate);
        assert_eq!(StressLevel::from_score(71.0), StressLevel::High);
        assert_eq!(StressLevel::from_score(100.0), StressLevel::High);
    }

    #[test]
    fn test_input_serializes_with_remote_labels() {
        let value = serde_json::to_value(sample_input()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "user_name": "Ada",
                "user_age": 34,
                "cortisol_val": 12.5,
                "amylase_val": 110.0,
                "iga_val": 45.0,
                "sleep_val": 6.5
            })
        );
    }

    #[test]
    fn test_validate_accepts_nominal_input() {
        assert!(sample_input().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut input = sample_input();
        input.cortisol = 25.0;
        assert!(matches!(input.validate(), Err(StressError::InvalidInput(_))));

        let mut input = sample_input();
        input.age = 0;
        assert!(input.validate().is_err());

        let mut input = sample_input();
        input.amylase = f64::NAN;
        assert!(input.validate().is_err());

        let mut input = sample_input();
        input.name = "   ".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_assessment_flattens_echoed_input() {
        let assessment = StressAssessment {
            score: 42,
            level: StressLevel::Moderate,
            recommendations: vec!["a".into(), "b".into(), "c".into()],
            metrics: NormalizedMetrics {
                cortisol_norm: 0.5,
                amylase_norm: 0.5,
                iga_norm: 0.5,
                sleep_norm: 0.5,
            },
            input: sample_input(),
        };
        let value = serde_json::to_value(&assessment).unwrap();
        assert_eq!(value["level"], "Moderate");
        assert_eq!(value["user_name"], "Ada");
        assert_eq!(value["sleep_val"], 6.5);

        let back: StressAssessment = serde_json::from_value(value).unwrap();
        assert_eq!(back, assessment);
    }
}
