//! Submission orchestration
//!
//! One submission: connect, call with named arguments, fall back once to
//! positional arguments, then interpret the payload container.

use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{InferenceError, StressError};
use crate::gradio::GradioTransport;
use crate::interpreter::interpret;
use crate::transport::{InferenceTransport, PredictArgs, PredictResponse};
use crate::types::{BiomarkerInput, StressAssessment};

/// Submit biomarkers to the default hosted model.
///
/// # Example
/// ```ignore
/// let assessment = analyze_stress(&input).await?;
/// println!("{} ({})", assessment.score, assessment.level.as_str());
/// ```
pub async fn analyze_stress(input: &BiomarkerInput) -> Result<StressAssessment, StressError> {
    let config = ClientConfig::default();
    let transport = GradioTransport::new(&config)
        .map_err(|e| InferenceError::Connection(e.describe()))?;
    StressAnalyzer::new(transport, config).submit(input).await
}

/// Submits biomarker readings through a transport. Holds no per-call state.
pub struct StressAnalyzer<T: InferenceTransport> {
    transport: T,
    config: ClientConfig,
}

impl StressAnalyzer<GradioTransport> {
    /// Analyzer backed by the HTTP transport
    pub fn from_config(config: ClientConfig) -> Result<Self, StressError> {
        let transport = GradioTransport::new(&config)
            .map_err(|e| InferenceError::Connection(e.describe()))?;
        Ok(Self::new(transport, config))
    }
}

impl<T: InferenceTransport> StressAnalyzer<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submit readings and interpret the model's answer
    pub async fn submit(&self, input: &BiomarkerInput) -> Result<StressAssessment, StressError> {
        let response = self.request_prediction(input).await?;
        let payload = response.payload().ok_or_else(|| {
            warn!(response = ?response.data, "prediction response has no payload");
            InferenceError::MissingPayload
        })?;
        debug!(%payload, "prediction payload received");

        interpret(payload, input)
    }

    /// Connect and call the prediction path, named arguments first
    async fn request_prediction(
        &self,
        input: &BiomarkerInput,
    ) -> Result<PredictResponse, InferenceError> {
        let service_id = &self.config.service_id;
        let path = &self.config.predict_path;

        let session = self.transport.connect(service_id).await.map_err(|e| {
            warn!(%service_id, error = %e, "could not connect to inference service");
            InferenceError::Connection(e.describe())
        })?;
        info!(%service_id, "connected to inference service");

        let named = PredictArgs::named(input);
        match session.predict(path, &named).await {
            Ok(response) => {
                debug!(convention = named.convention(), "prediction call succeeded");
                Ok(response)
            }
            Err(named_error) => {
                warn!(
                    error = %named_error,
                    "named-argument call failed, retrying with positional arguments"
                );
                let positional = PredictArgs::positional(input);
                let response = session.predict(path, &positional).await.map_err(|e| {
                    warn!(error = %e, "positional-argument call failed");
                    InferenceError::Call(e.describe())
                })?;
                debug!(convention = positional.convention(), "prediction call succeeded");
                Ok(response)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{InferenceSession, TransportError};
    use crate::types::StressLevel;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    type CallLog = Arc<Mutex<Vec<(String, PredictArgs)>>>;

    /// Scripted transport: named and positional calls answer independently
    struct ScriptedTransport {
        connect_error: Option<String>,
        named: fn() -> Result<PredictResponse, TransportError>,
        positional: fn() -> Result<PredictResponse, TransportError>,
        calls: CallLog,
        connected_to: Arc<Mutex<Vec<String>>>,
    }

    struct ScriptedSession {
        named: fn() -> Result<PredictResponse, TransportError>,
        positional: fn() -> Result<PredictResponse, TransportError>,
        calls: CallLog,
    }

    #[async_trait]
    impl InferenceSession for ScriptedSession {
        async fn predict(
            &self,
            path: &str,
            args: &PredictArgs,
        ) -> Result<PredictResponse, TransportError> {
            self.calls.lock().unwrap().push((path.to_string(), args.clone()));
            match args {
                PredictArgs::Named(_) => (self.named)(),
                PredictArgs::Positional(_) => (self.positional)(),
            }
        }
    }

    #[async_trait]
    impl InferenceTransport for ScriptedTransport {
        async fn connect(
            &self,
            service_id: &str,
        ) -> Result<Box<dyn InferenceSession>, TransportError> {
            self.connected_to.lock().unwrap().push(service_id.to_string());
            if let Some(message) = &self.connect_error {
                return Err(TransportError::Connect(message.clone()));
            }
            Ok(Box::new(ScriptedSession {
                named: self.named,
                positional: self.positional,
                calls: self.calls.clone(),
            }))
        }
    }

    fn scripted(
        named: fn() -> Result<PredictResponse, TransportError>,
        positional: fn() -> Result<PredictResponse, TransportError>,
    ) -> ScriptedTransport {
        ScriptedTransport {
            connect_error: None,
            named,
            positional,
            calls: Arc::default(),
            connected_to: Arc::default(),
        }
    }

    fn high_stress() -> Result<PredictResponse, TransportError> {
        Ok(PredictResponse::with_data(json!(["Stress probability: 82%", {}, {}])))
    }

    fn low_stress_text() -> Result<PredictResponse, TransportError> {
        Ok(PredictResponse::with_data(json!("12% stress")))
    }

    fn remote_failure() -> Result<PredictResponse, TransportError> {
        Err(TransportError::Remote(json!({"detail": "Invalid arguments"})))
    }

    fn status_failure() -> Result<PredictResponse, TransportError> {
        Err(TransportError::Remote(json!({"type": "status", "endpoint": "/predict"})))
    }

    fn no_payload() -> Result<PredictResponse, TransportError> {
        Ok(PredictResponse::default())
    }

    fn object_payload() -> Result<PredictResponse, TransportError> {
        Ok(PredictResponse::with_data(json!({"unexpected": true})))
    }

    fn make_test_input() -> BiomarkerInput {
        BiomarkerInput {
            name: "Riley".to_string(),
            age: 41,
            cortisol: 16.0,
            amylase: 150.0,
            iga: 30.0,
            sleep_hours: 5.0,
        }
    }

    fn recorded(calls: &CallLog) -> Vec<(String, &'static str)> {
        calls
            .lock()
            .unwrap()
            .iter()
            .map(|(path, args)| (path.clone(), args.convention()))
            .collect()
    }

    #[tokio::test]
    async fn test_named_call_success_skips_fallback() {
        let transport = scripted(high_stress, remote_failure);
        let calls = transport.calls.clone();
        let connected_to = transport.connected_to.clone();
        let analyzer = StressAnalyzer::new(transport, ClientConfig::default());

        let result = analyzer.submit(&make_test_input()).await.unwrap();
        assert_eq!(result.score, 82);
        assert_eq!(result.level, StressLevel::High);
        assert_eq!(result.input, make_test_input());
        assert_eq!(recorded(&calls), vec![("/predict".to_string(), "named")]);
        assert_eq!(
            *connected_to.lock().unwrap(),
            vec!["mekashishsingh/STRESS-DETECTOR".to_string()]
        );
    }

    #[tokio::test]
    async fn test_named_failure_falls_back_to_positional() {
        let transport = scripted(remote_failure, low_stress_text);
        let calls = transport.calls.clone();
        let analyzer = StressAnalyzer::new(transport, ClientConfig::default());

        let result = analyzer.submit(&make_test_input()).await.unwrap();
        assert_eq!(result.score, 12);
        assert_eq!(result.level, StressLevel::Low);
        assert_eq!(
            recorded(&calls),
            vec![
                ("/predict".to_string(), "named"),
                ("/predict".to_string(), "positional"),
            ]
        );

        let positional = calls.lock().unwrap()[1].1.to_value();
        assert_eq!(positional, json!(["Riley", 41, 16.0, 150.0, 30.0, 5.0]));
    }

    #[tokio::test]
    async fn test_both_calls_failing_reports_last_error() {
        let analyzer = StressAnalyzer::new(
            scripted(remote_failure, status_failure),
            ClientConfig::default(),
        );

        let err = analyzer.submit(&make_test_input()).await.unwrap_err();
        match err {
            StressError::Inference(InferenceError::Call(message)) => {
                assert_eq!(message, "Gradio status error on /predict")
            }
            other => panic!("expected call failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_failure_makes_no_calls() {
        let mut transport = scripted(high_stress, high_stress);
        transport.connect_error = Some("Space not found".to_string());
        let calls = transport.calls.clone();
        let analyzer = StressAnalyzer::new(transport, ClientConfig::default());

        let err = analyzer.submit(&make_test_input()).await.unwrap_err();
        assert!(err.is_inference());
        assert_eq!(
            err.to_string(),
            "Inference service error: connection failed: Space not found"
        );
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_payload_container() {
        let analyzer = StressAnalyzer::new(scripted(no_payload, high_stress), ClientConfig::default());
        let err = analyzer.submit(&make_test_input()).await.unwrap_err();
        assert!(matches!(
            err,
            StressError::Inference(InferenceError::MissingPayload)
        ));
    }

    #[tokio::test]
    async fn test_unrecognized_payload_is_parse_error() {
        let analyzer =
            StressAnalyzer::new(scripted(object_payload, high_stress), ClientConfig::default());
        let err = analyzer.submit(&make_test_input()).await.unwrap_err();
        match err {
            StressError::Parse(dump) => {
                let value: Value = serde_json::from_str(&dump).unwrap();
                assert_eq!(value, json!({"unexpected": true}));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_custom_service_and_path() {
        let transport = scripted(high_stress, high_stress);
        let calls = transport.calls.clone();
        let connected_to = transport.connected_to.clone();
        let config = ClientConfig {
            predict_path: "/analyze".to_string(),
            ..ClientConfig::default()
        }
        .with_service_id("lab/stress-v2");
        let analyzer = StressAnalyzer::new(transport, config);

        analyzer.submit(&make_test_input()).await.unwrap();
        assert_eq!(recorded(&calls), vec![("/analyze".to_string(), "named")]);
        assert_eq!(*connected_to.lock().unwrap(), vec!["lab/stress-v2".to_string()]);
    }
}
