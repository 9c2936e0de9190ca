//! Shape detection for remote prediction payloads
//!
//! The inference endpoint returns loosely typed JSON. Everything downstream works
//! on `RawPrediction`, so shape probing happens only here.

use serde_json::Value;

/// A prediction payload classified by shape
#[derive(Debug, Clone, PartialEq)]
pub enum RawPrediction {
    /// Ordered outputs: prediction text, gauge chart, biomarker chart
    Sequence {
        prediction_text: Value,
        gauge_chart: Option<Value>,
        biomarker_chart: Option<Value>,
    },
    /// A bare string
    Text(String),
    /// Empty array, object, number, boolean or null
    Unrecognized(Value),
}

impl RawPrediction {
    /// Classify a payload. Elements past the third are ignored.
    pub fn classify(payload: &Value) -> Self {
        match payload {
            Value::Array(items) if !items.is_empty() => RawPrediction::Sequence {
                prediction_text: items[0].clone(),
                gauge_chart: items.get(1).cloned(),
                biomarker_chart: items.get(2).cloned(),
            },
            Value::String(text) => RawPrediction::Text(text.clone()),
            other => RawPrediction::Unrecognized(other.clone()),
        }
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            RawPrediction::Sequence { .. } => "sequence",
            RawPrediction::Text(_) => "text",
            RawPrediction::Unrecognized(_) => "unrecognized",
        }
    }
}
