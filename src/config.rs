//! Client configuration
//!
//! Defaults point at the hosted stress-detector app. Environment variables
//! override them; the CLI layers its flags on top.

use std::time::Duration;

use crate::error::StressError;

/// Hosted app serving the stress model
pub const DEFAULT_SERVICE_ID: &str = "mekashishsingh/STRESS-DETECTOR";

/// Operation path of the prediction endpoint
pub const DEFAULT_PREDICT_PATH: &str = "/predict";

pub const ENV_SERVICE_ID: &str = "STRESS_SERVICE_ID";
pub const ENV_PREDICT_PATH: &str = "STRESS_PREDICT_PATH";
pub const ENV_BASE_URL: &str = "STRESS_BASE_URL";
pub const ENV_ACCESS_TOKEN: &str = "HF_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "STRESS_TIMEOUT_SECS";

/// Settings for reaching the inference endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Service identifier (`owner/space`) or a full URL
    pub service_id: String,
    /// Operation path called on the service
    pub predict_path: String,
    /// Explicit base URL; takes precedence over the service id
    pub base_url: Option<String>,
    /// Bearer token for private apps
    pub access_token: Option<String>,
    /// Request timeout. Unset means the HTTP client default.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_id: DEFAULT_SERVICE_ID.to_string(),
            predict_path: DEFAULT_PREDICT_PATH.to_string(),
            base_url: None,
            access_token: None,
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self, StressError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`. Blank values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StressError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(service_id) = get(ENV_SERVICE_ID) {
            config.service_id = service_id;
        }
        if let Some(path) = get(ENV_PREDICT_PATH) {
            config.predict_path = path;
        }
        config.base_url = get(ENV_BASE_URL);
        config.access_token = get(ENV_ACCESS_TOKEN);
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.parse().map_err(|_| {
                StressError::Config(format!("{ENV_TIMEOUT_SECS} must be whole seconds, got {raw:?}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn with_service_id(mut self, service_id: impl Into<String>) -> Self {
        self.service_id = service_id.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.service_id, DEFAULT_SERVICE_ID);
        assert_eq!(config.predict_path, "/predict");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (ENV_SERVICE_ID, "someone/other-space"),
            (ENV_BASE_URL, "http://localhost:7860"),
            (ENV_ACCESS_TOKEN, "hf_abc"),
            (ENV_TIMEOUT_SECS, "30"),
            (ENV_PREDICT_PATH, "  "),
        ]))
        .unwrap();
        assert_eq!(config.service_id, "someone/other-space");
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:7860"));
        assert_eq!(config.access_token.as_deref(), Some("hf_abc"));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.predict_path, DEFAULT_PREDICT_PATH);
    }

    #[test]
    fn test_invalid_timeout() {
        let result = ClientConfig::from_lookup(lookup_from(&[(ENV_TIMEOUT_SECS, "soon")]));
        assert!(matches!(result, Err(StressError::Config(_))));
    }
}
