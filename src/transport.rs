//! Remote inference transport
//!
//! The submitter talks to the model through these traits: connect once, then
//! call an operation path with either labeled or positional arguments.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::types::BiomarkerInput;

/// Arguments for a prediction call
#[derive(Debug, Clone, PartialEq)]
pub enum PredictArgs {
    /// Labeled arguments, keyed by the input's wire names
    Named(serde_json::Map<String, Value>),
    /// name, age, cortisol, amylase, iga, sleep
    Positional(Vec<Value>),
}

impl PredictArgs {
    pub fn named(input: &BiomarkerInput) -> Self {
        let mut args = serde_json::Map::new();
        args.insert("user_name".to_string(), json!(input.name));
        args.insert("user_age".to_string(), json!(input.age));
        args.insert("cortisol_val".to_string(), json!(input.cortisol));
        args.insert("amylase_val".to_string(), json!(input.amylase));
        args.insert("iga_val".to_string(), json!(input.iga));
        args.insert("sleep_val".to_string(), json!(input.sleep_hours));
        PredictArgs::Named(args)
    }

    pub fn positional(input: &BiomarkerInput) -> Self {
        PredictArgs::Positional(vec![
            json!(input.name),
            json!(input.age),
            json!(input.cortisol),
            json!(input.amylase),
            json!(input.iga),
            json!(input.sleep_hours),
        ])
    }

    pub fn convention(&self) -> &'static str {
        match self {
            PredictArgs::Named(_) => "named",
            PredictArgs::Positional(_) => "positional",
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            PredictArgs::Named(args) => Value::Object(args.clone()),
            PredictArgs::Positional(args) => Value::Array(args.clone()),
        }
    }
}

/// A completed prediction call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictResponse {
    /// Payload container as returned by the service
    pub data: Option<Value>,
}

impl PredictResponse {
    pub fn with_data(data: Value) -> Self {
        Self { data: Some(data) }
    }

    /// The payload container, unless absent or empty-ish (`null`, `false`, `0`, `""`)
    pub fn payload(&self) -> Option<&Value> {
        self.data.as_ref().filter(|data| match data {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
    }
}

/// Errors raised by a transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Connect(String),

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Structured error reported by the remote app
    #[error("{}", describe_remote_error(.0))]
    Remote(Value),

    #[error("{0}")]
    Protocol(String),
}

impl TransportError {
    /// Human-readable message for surfacing to callers
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

/// Pick a message out of a structured error value.
///
/// Order: `detail`, `message`, `error`, then `type` with `endpoint`, then the
/// whole value serialized.
pub fn describe_remote_error(error: &Value) -> String {
    let Some(fields) = error.as_object() else {
        return display_value(error);
    };

    for key in ["detail", "message", "error"] {
        if let Some(value) = fields.get(key) {
            return display_value(value);
        }
    }

    if let (Some(kind), Some(endpoint)) = (fields.get("type"), fields.get("endpoint")) {
        return format!(
            "Gradio {} error on {}",
            display_value(kind),
            display_value(endpoint)
        );
    }

    error.to_string()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// An established handle to an inference endpoint
#[async_trait]
pub trait InferenceSession: Send + Sync {
    /// Call `path` with the given arguments
    async fn predict(&self, path: &str, args: &PredictArgs)
        -> Result<PredictResponse, TransportError>;
}

/// Factory for sessions against a named service
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    async fn connect(&self, service_id: &str)
        -> Result<Box<dyn InferenceSession>, TransportError>;
}
