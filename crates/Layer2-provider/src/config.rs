//! Provider configuration
//!
//! A `ProviderConfig` describes one backend endpoint. It is owned by the
//! provider instance built from it and never mutated afterwards; per-plugin
//! overrides produce a new value via [`ProviderConfig::with_overrides`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

/// Configuration for a single provider instance
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Configured name (e.g. "OpenRouter")
    pub name: String,

    #[serde(default)]
    pub api_key: String,

    /// Base URL; empty means "use the vendor default"
    #[serde(default)]
    pub base_url: String,

    /// Model id; empty means "use the vendor default"
    #[serde(default)]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Extra body parameters merged into each request
    #[serde(default)]
    pub extra_params: HashMap<String, Value>,

    /// Extra HTTP headers sent with each request
    #[serde(default)]
    pub extra_headers: HashMap<String, String>,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_key: String::new(),
            base_url: String::new(),
            model: String::new(),
            timeout: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            extra_params: HashMap::new(),
            extra_headers: HashMap::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.as_secs().max(1);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_extra_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra_params.insert(key.into(), value);
        self
    }

    pub fn with_extra_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }

    /// Return a copy with known fields replaced from a settings map.
    ///
    /// Unknown keys and values of the wrong type are skipped with a log line.
    pub fn with_overrides(&self, overrides: &HashMap<String, Value>) -> Self {
        let mut config = self.clone();

        for (key, value) in overrides {
            let applied = match key.as_str() {
                "name" => value.as_str().map(|v| config.name = v.to_string()).is_some(),
                "api_key" => value.as_str().map(|v| config.api_key = v.to_string()).is_some(),
                "base_url" => value.as_str().map(|v| config.base_url = v.to_string()).is_some(),
                "model" => value.as_str().map(|v| config.model = v.to_string()).is_some(),
                "timeout" => value.as_u64().map(|v| config.timeout = v.max(1)).is_some(),
                "max_tokens" => value
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .map(|v| config.max_tokens = v)
                    .is_some(),
                "temperature" => value
                    .as_f64()
                    .map(|v| config.temperature = v as f32)
                    .is_some(),
                "extra_params" => value
                    .as_object()
                    .map(|obj| {
                        for (k, v) in obj {
                            config.extra_params.insert(k.clone(), v.clone());
                        }
                    })
                    .is_some(),
                "extra_headers" => value
                    .as_object()
                    .map(|obj| {
                        for (k, v) in obj {
                            if let Some(v) = v.as_str() {
                                config.extra_headers.insert(k.clone(), v.to_string());
                            }
                        }
                    })
                    .is_some(),
                _ => {
                    debug!("Ignoring unknown provider setting '{}'", key);
                    continue;
                }
            };

            if !applied {
                warn!("Provider setting '{}' has unexpected type: {}", key, value);
            }
        }

        config
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("extra_params", &self.extra_params)
            .field("extra_headers", &self.extra_headers.keys().collect::<Vec<_>>())
            .finish()
    }
}
