//! HTTP transport for Gradio apps
//!
//! Connecting fetches the app config (which also tells us the API prefix) and
//! the API description, whose parameter names let labeled arguments be sent in
//! the order the endpoint expects. A prediction is two requests: POST the arguments to `/call/{op}` to get an
//! event id, then GET `/call/{op}/{event_id}` and read the server-sent events
//! until `complete` or `error`.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::transport::{
    InferenceSession, InferenceTransport, PredictArgs, PredictResponse, TransportError,
};

const SPACES_DOMAIN: &str = "hf.space";

/// Transport for apps hosted on Hugging Face Spaces or any Gradio server
#[derive(Debug, Clone)]
pub struct GradioTransport {
    client: Client,
    base_url: Option<String>,
    access_token: Option<String>,
}

impl GradioTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
            access_token: config.access_token.clone(),
        })
    }
}

/// Base URL for a service id.
///
/// URLs pass through; `owner/space` maps to the Spaces subdomain
/// (`mekashishsingh/STRESS-DETECTOR` → `https://mekashishsingh-stress-detector.hf.space`).
pub fn resolve_base_url(service_id: &str) -> String {
    let service_id = service_id.trim();
    if service_id.starts_with("http://") || service_id.starts_with("https://") {
        return service_id.trim_end_matches('/').to_string();
    }

    let subdomain: String = service_id
        .to_lowercase()
        .chars()
        .map(|c| if matches!(c, '/' | '_' | '.') { '-' } else { c })
        .collect();
    format!("https://{subdomain}.{SPACES_DOMAIN}")
}

fn authorize(builder: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
    match access_token {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

#[async_trait]
impl InferenceTransport for GradioTransport {
    async fn connect(
        &self,
        service_id: &str,
    ) -> Result<Box<dyn InferenceSession>, TransportError> {
        let base_url = match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => resolve_base_url(service_id),
        };
        let config_url = format!("{base_url}/config");
        info!(service_id, %base_url, "connecting to inference app");

        let response = authorize(self.client.get(&config_url), self.access_token.as_deref())
            .send()
            .await
            .map_err(|e| TransportError::Connect(format!("could not reach {base_url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Connect(format!(
                "could not load app config from {base_url}: HTTP {status}"
            )));
        }

        let app_config: Value = response.json().await.map_err(|e| {
            TransportError::Connect(format!("invalid app config from {base_url}: {e}"))
        })?;
        let api_prefix = app_config
            .get("api_prefix")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string();
        debug!(%api_prefix, "app config loaded");

        let api_info = self.fetch_api_info(&base_url, &api_prefix).await;

        Ok(Box::new(GradioSession {
            client: self.client.clone(),
            base_url,
            api_prefix,
            api_info,
            access_token: self.access_token.clone(),
            session_hash: Uuid::new_v4().simple().to_string(),
        }))
    }
}

impl GradioTransport {
    /// API description of the app; without it only positional calls work
    async fn fetch_api_info(&self, base_url: &str, api_prefix: &str) -> Option<ApiInfo> {
        let info_url = format!("{base_url}{api_prefix}/info");
        let response = authorize(self.client.get(&info_url), self.access_token.as_deref())
            .send()
            .await;

        let result = match response {
            Ok(response) if response.status().is_success() => {
                response.json::<ApiInfo>().await.map_err(|e| e.to_string())
            }
            Ok(response) => Err(format!("HTTP {}", response.status())),
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(info) => {
                debug!(endpoints = info.named_endpoints.len(), "api info loaded");
                Some(info)
            }
            Err(error) => {
                warn!(%info_url, %error, "api info unavailable, labeled arguments cannot be resolved");
                None
            }
        }
    }
}

/// The parts of `/info` needed to place labeled arguments
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub named_endpoints: HashMap<String, EndpointInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointInfo {
    #[serde(default)]
    pub parameters: Vec<ParameterInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParameterInfo {
    pub parameter_name: Option<String>,
    #[serde(default)]
    pub parameter_has_default: bool,
    #[serde(default)]
    pub parameter_default: Value,
}

impl ApiInfo {
    /// Parameters of an endpoint, looked up with or without the leading slash
    pub fn parameters(&self, path: &str) -> Option<&[ParameterInfo]> {
        let path = format!("/{}", path.trim_start_matches('/'));
        self.named_endpoints
            .get(&path)
            .map(|endpoint| endpoint.parameters.as_slice())
    }
}

/// Place labeled arguments in the endpoint's parameter order.
///
/// Unknown labels and missing required parameters are errors; missing
/// parameters with a default take the default.
pub fn order_named_args(
    args: &Map<String, Value>,
    parameters: &[ParameterInfo],
    endpoint: &str,
) -> Result<Vec<Value>, TransportError> {
    let names = parameters
        .iter()
        .map(|p| {
            p.parameter_name.as_deref().ok_or_else(|| {
                TransportError::Protocol(format!("{endpoint} has an unnamed parameter"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(unknown) = args.keys().find(|key| !names.contains(&key.as_str())) {
        return Err(TransportError::Protocol(format!(
            "`{unknown}` is not a parameter of {endpoint}"
        )));
    }

    names
        .iter()
        .zip(parameters)
        .map(|(name, parameter)| match args.get(*name) {
            Some(value) => Ok(value.clone()),
            None if parameter.parameter_has_default => Ok(parameter.parameter_default.clone()),
            None => Err(TransportError::Protocol(format!(
                "no value for required parameter `{name}` of {endpoint}"
            ))),
        })
        .collect()
}

/// Connected Gradio app
#[derive(Debug)]
struct GradioSession {
    client: Client,
    base_url: String,
    api_prefix: String,
    api_info: Option<ApiInfo>,
    access_token: Option<String>,
    session_hash: String,
}

impl GradioSession {
    /// Arguments as the list the call endpoint accepts
    fn call_data(&self, path: &str, args: &PredictArgs) -> Result<Vec<Value>, TransportError> {
        match args {
            PredictArgs::Positional(values) => Ok(values.clone()),
            PredictArgs::Named(labeled) => {
                let parameters = self
                    .api_info
                    .as_ref()
                    .and_then(|info| info.parameters(path))
                    .ok_or_else(|| {
                        TransportError::Protocol(format!("no parameter names published for {path}"))
                    })?;
                order_named_args(labeled, parameters, path)
            }
        }
    }

    fn call_url(&self, path: &str) -> String {
        format!(
            "{}{}/call/{}",
            self.base_url,
            self.api_prefix,
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl InferenceSession for GradioSession {
    async fn predict(
        &self,
        path: &str,
        args: &PredictArgs,
    ) -> Result<PredictResponse, TransportError> {
        let data = self.call_data(path, args)?;
        let call_url = self.call_url(path);
        let body = json!({
            "data": data,
            "session_hash": self.session_hash,
        });
        debug!(
            %call_url,
            convention = args.convention(),
            args = %args.to_value(),
            "submitting prediction"
        );

        let response = authorize(self.client.post(&call_url).json(&body), self.access_token.as_deref())
            .send()
            .await?;
        let response = check_status(response).await?;

        let ack: Value = response.json().await?;
        let event_id = ack
            .get("event_id")
            .and_then(Value::as_str)
            .ok_or_else(|| TransportError::Protocol(format!("no event_id returned by {call_url}")))?;

        let events_url = format!("{call_url}/{event_id}");
        debug!(%events_url, "awaiting prediction result");
        let response = authorize(self.client.get(&events_url), self.access_token.as_deref())
            .send()
            .await?;
        let stream = check_status(response).await?.text().await?;

        parse_event_stream(&stream, path)
    }
}

/// Turn non-2xx responses into errors, keeping structured bodies intact
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<Value>(&body) {
        Ok(value @ Value::Object(_)) => Err(TransportError::Remote(value)),
        _ => Err(TransportError::Status {
            status: status.as_u16(),
            body,
        }),
    }
}

/// Read a server-sent event stream up to its terminal event
pub fn parse_event_stream(stream: &str, endpoint: &str) -> Result<PredictResponse, TransportError> {
    let mut event: Option<String> = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in stream.lines().chain(std::iter::once("")) {
        if line.is_empty() {
            let data = data_lines.join("\n");
            data_lines.clear();
            match event.take().as_deref() {
                Some("complete") => {
                    let payload = serde_json::from_str(&data).map_err(|e| {
                        TransportError::Protocol(format!("unreadable result from {endpoint}: {e}"))
                    })?;
                    return Ok(PredictResponse::with_data(payload));
                }
                Some("error") => return Err(TransportError::Remote(error_event_value(&data, endpoint))),
                _ => {}
            }
            continue;
        }

        if let Some(name) = line.strip_prefix("event:") {
            event = Some(name.trim().to_string());
        } else if let Some(data) = line.strip_prefix("data:") {
            data_lines.push(data.trim_start());
        }
    }

    Err(TransportError::Protocol(format!(
        "event stream from {endpoint} ended without a result"
    )))
}

fn error_event_value(data: &str, endpoint: &str) -> Value {
    match serde_json::from_str::<Value>(data) {
        Ok(value @ Value::Object(_)) => value,
        Ok(Value::String(message)) if !message.is_empty() => {
            json!({ "type": "error", "endpoint": endpoint, "message": message })
        }
        _ => json!({ "type": "error", "endpoint": endpoint }),
    }
}
