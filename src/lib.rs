//! Biomarker Stress - client and interpreter for hosted stress-assessment models
//!
//! Biomarker readings (cortisol, amylase, IgA, sleep) are submitted to a remote
//! inference app; whatever it returns is normalized into a bounded, typed
//! `StressAssessment`: connect → named call (positional fallback) → shape
//! detection → score extraction → level, advice and normalized metrics.
//!
//! ## Modules
//!
//! - **Submission**: `submitter`, `transport`, `gradio`, `config`
//! - **Interpretation**: `interpreter`, `payload`, `extract`, `normalizer`

pub mod config;
pub mod error;
pub mod extract;
pub mod gradio;
pub mod interpreter;
pub mod normalizer;
pub mod payload;
pub mod submitter;
pub mod transport;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::ClientConfig;
pub use error::{InferenceError, StressError};
pub use interpreter::interpret;
pub use payload::RawPrediction;
pub use submitter::{analyze_stress, StressAnalyzer};
pub use types::{BiomarkerInput, NormalizedMetrics, StressAssessment, StressLevel};

/// Library version embedded in reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "biomarker-stress";
