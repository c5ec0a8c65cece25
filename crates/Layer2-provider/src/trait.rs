//! Provider trait and common types
//!
//! ## Capabilities
//!
//! Every provider exposes four capabilities:
//! - describe: `provider_name` + `supported_models`
//! - `initialize`
//! - `generate_message`
//! - `health_check`

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Token usage reported by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Normalized reply from a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Generated text (non-empty)
    pub content: String,

    /// Name of the provider that produced it
    pub provider_name: String,

    /// Model that produced it
    pub model: String,

    #[serde(default)]
    pub usage: TokenUsage,

    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl ProviderResponse {
    pub fn new(
        content: impl Into<String>,
        provider_name: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            provider_name: provider_name.into(),
            model: model.into(),
            usage: TokenUsage::default(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Serializable provider summary (for `providerInfo`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub config_name: String,
    pub model: String,
    pub supported_models: Vec<String>,
    pub base_url: String,
    pub timeout: u64,
    pub max_tokens: u32,
}

/// Message provider trait
///
/// Implement this trait to add support for a new backend. A provider owns
/// its transport; side effects are limited to network (or subprocess) I/O.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name (e.g. "OpenRouter")
    fn provider_name(&self) -> &str;

    /// Known model ids. Used for warnings only, never enforced.
    fn supported_models(&self) -> &[String];

    /// Configuration this provider was built from
    fn config(&self) -> &ProviderConfig;

    /// Whether an API key is mandatory
    fn requires_api_key(&self) -> bool {
        true
    }

    /// Prepare the transport. Idempotent.
    ///
    /// Returns false on recoverable misconfiguration instead of failing.
    fn initialize(&mut self) -> bool;

    /// One request/response cycle bounded by the configured timeout.
    ///
    /// Returns `None` on any transport, auth or empty-content failure;
    /// the cause is logged, never returned.
    async fn generate_message(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Option<ProviderResponse>;

    /// Minimal, low-cost check against the same backend
    async fn health_check(&self) -> bool;

    /// Validate the configuration
    fn validate_config(&self) -> Result<(), ProviderError> {
        let config = self.config();

        if config.name.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "provider name is required".to_string(),
            ));
        }
        if self.requires_api_key() && config.api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(format!(
                "API key is required for {}",
                config.name
            )));
        }
        if config.model.trim().is_empty() {
            return Err(ProviderError::NotConfigured(format!(
                "model is required for {}",
                config.name
            )));
        }
        if !config.base_url.is_empty()
            && !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://"))
        {
            return Err(ProviderError::NotConfigured(format!(
                "{} base_url must start with http:// or https://",
                config.name
            )));
        }

        let supported = self.supported_models();
        if !supported.is_empty() && !supported.iter().any(|m| m == &config.model) {
            warn!(
                "[{}] model '{}' is not in the known model list, trying anyway",
                self.provider_name(),
                config.model
            );
        }

        Ok(())
    }

    /// Provider summary
    fn info(&self) -> ProviderInfo {
        let config = self.config();
        ProviderInfo {
            name: self.provider_name().to_string(),
            config_name: config.name.clone(),
            model: config.model.clone(),
            supported_models: self.supported_models().to_vec(),
            base_url: config.base_url.clone(),
            timeout: config.timeout,
            max_tokens: config.max_tokens,
        }
    }
}
