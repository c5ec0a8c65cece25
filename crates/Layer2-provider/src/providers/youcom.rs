//! You.com Smart API provider
//!
//! `POST {base_url}/smart` with `{"query", "instructions", ...extra_params}`
//! and the key in `X-API-Key`. The reply carries `answer` plus optional
//! `search_results`; the API reports no token usage, so usage is a word count.

use crate::{
    config::ProviderConfig,
    error::ProviderError,
    presets::VendorPreset,
    r#trait::{Provider, ProviderResponse, TokenUsage},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Keys shorter than this are rejected at initialization
const MIN_API_KEY_LEN: usize = 10;

const DEFAULT_INSTRUCTIONS: &str = "Provide a helpful and informative response.";
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Provider for the You.com Smart API
pub struct YouComProvider {
    config: ProviderConfig,
    display_name: String,
    supported_models: Vec<String>,
    client: Option<Client>,
}

impl YouComProvider {
    /// Empty base URL and model fall back to the preset defaults
    pub fn from_preset(preset: &VendorPreset, mut config: ProviderConfig) -> Self {
        if config.base_url.trim().is_empty() {
            config.base_url = preset.base_url.to_string();
        }
        if config.model.trim().is_empty() {
            config.model = preset.default_model.to_string();
        }

        Self {
            config,
            display_name: preset.display_name.to_string(),
            supported_models: preset.supported_models(),
            client: None,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/smart", self.config.base_url.trim_end_matches('/'))
    }

    fn client(&self) -> Result<&Client, ProviderError> {
        self.client
            .as_ref()
            .ok_or_else(|| ProviderError::NotInitialized(self.display_name.clone()))
    }

    fn post(&self, client: &Client, body: &SmartRequest<'_>) -> reqwest::RequestBuilder {
        let mut request = client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(body);
        for (key, value) in &self.config.extra_headers {
            request = request.header(key.as_str(), value.as_str());
        }
        request
    }

    async fn request(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        let client = self.client()?;
        let query = format!("{}\n\nQuery: {}", system_prompt, user_prompt);
        let instructions = if system_prompt != user_prompt {
            system_prompt
        } else {
            DEFAULT_INSTRUCTIONS
        };
        let body = SmartRequest {
            query: &query,
            instructions,
            extra: &self.config.extra_params,
        };

        let response = self.post(client, &body).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.config.timeout)
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_http_status(status, &body));
        }

        let reply: SmartResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let content = reply
            .answer
            .map(|a| a.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(ProviderError::EmptyContent);
        }

        let usage = TokenUsage::new(word_count(&query), word_count(&content));
        Ok(ProviderResponse::new(content, &self.display_name, &self.config.model)
            .with_usage(usage)
            .with_metadata(
                "search_results_count",
                Value::from(reply.search_results.len()),
            ))
    }
}

fn word_count(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

#[async_trait]
impl Provider for YouComProvider {
    fn provider_name(&self) -> &str {
        &self.display_name
    }

    fn supported_models(&self) -> &[String] {
        &self.supported_models
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn initialize(&mut self) -> bool {
        if self.client.is_some() {
            return true;
        }

        if let Err(e) = self.validate_config() {
            warn!("[{}] {}", self.display_name, e);
            return false;
        }
        if self.config.api_key.trim().len() < MIN_API_KEY_LEN {
            warn!("[{}] API key appears to be invalid or too short", self.display_name);
            return false;
        }

        match Client::builder()
            .timeout(self.config.timeout_duration())
            .build()
        {
            Ok(client) => {
                debug!(
                    "[{}] initialized with model {} at {}",
                    self.display_name, self.config.model, self.config.base_url
                );
                self.client = Some(client);
                true
            }
            Err(e) => {
                warn!("[{}] failed to create HTTP client: {}", self.display_name, e);
                false
            }
        }
    }

    async fn generate_message(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Option<ProviderResponse> {
        match self.request(system_prompt, user_prompt).await {
            Ok(response) => Some(response),
            Err(e) => {
                warn!("[{}] generation failed: {}", self.display_name, e);
                None
            }
        }
    }

    /// The Smart API has no listing endpoint; a tiny query stands in
    async fn health_check(&self) -> bool {
        let client = match self.client() {
            Ok(client) => client,
            Err(_) => return false,
        };

        let empty = HashMap::new();
        let body = SmartRequest {
            query: "Hello",
            instructions: "Respond with a simple greeting.",
            extra: &empty,
        };

        let response = match self.post(client, &body).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(
                    "[{}] health check returned {}",
                    self.display_name,
                    response.status()
                );
                return false;
            }
            Err(e) => {
                debug!("[{}] health check failed: {}", self.display_name, e);
                return false;
            }
        };

        match response.json::<SmartResponse>().await {
            Ok(reply) => reply.answer.is_some_and(|a| !a.trim().is_empty()),
            Err(_) => false,
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct SmartRequest<'a> {
    query: &'a str,
    instructions: &'a str,
    #[serde(flatten)]
    extra: &'a HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SmartResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    search_results: Vec<Value>,
}
