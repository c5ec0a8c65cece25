//! OpenAI-compatible chat-completions provider
//!
//! One HTTP transport shared by every vendor that accepts
//! `POST {base_url}/chat/completions`. Vendor differences live in
//! [`VendorPreset`] defaults only.

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
use tracing::{debug, warn};

/// Provider for any chat-completions compatible endpoint
pub struct OpenAiCompatProvider {
    config: ProviderConfig,
    display_name: String,
    supported_models: Vec<String>,
    requires_api_key: bool,
    client: Option<Client>,
}

impl OpenAiCompatProvider {
    /// Create a provider for an arbitrary compatible endpoint
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            display_name: config.name.clone(),
            config,
            supported_models: Vec::new(),
            requires_api_key: true,
            client: None,
        }
    }

    /// Create a provider for a built-in vendor; empty base URL and model
    /// fall back to the preset defaults
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
            requires_api_key: true,
            client: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_supported_models(mut self, models: Vec<String>) -> Self {
        self.supported_models = models;
        self
    }

    /// Allow keyless endpoints (local servers)
    pub fn with_optional_api_key(mut self) -> Self {
        self.requires_api_key = false;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn client(&self) -> Result<&Client, ProviderError> {
        self.client
            .as_ref()
            .ok_or_else(|| ProviderError::NotInitialized(self.display_name.clone()))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut request = request;
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }
        for (key, value) in &self.config.extra_headers {
            request = request.header(key.as_str(), value.as_str());
        }
        request
    }

    fn build_request<'a>(&'a self, system_prompt: &'a str, user_prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            extra: &self.config.extra_params,
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.config.timeout)
        } else {
            ProviderError::Network(err.to_string())
        }
    }

    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> ProviderError {
        if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(body) {
            return ProviderError::from_http_status(status.as_u16(), &error_response.error.message);
        }
        ProviderError::from_http_status(status.as_u16(), body)
    }

    /// One chat-completions round trip
    async fn request(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        let client = self.client()?;
        let body = self.build_request(system_prompt, user_prompt);

        let response = self
            .authorized(client.post(self.endpoint("chat/completions")))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_error_response(status, &body));
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))?;

        let content = choice
            .message
            .content
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(ProviderError::EmptyContent);
        }

        let usage = api_response
            .usage
            .map(|u| match u.total_tokens {
                Some(total_tokens) => TokenUsage {
                    prompt_tokens: u.prompt_tokens,
                    completion_tokens: u.completion_tokens,
                    total_tokens,
                },
                None => TokenUsage::new(u.prompt_tokens, u.completion_tokens),
            })
            .unwrap_or_default();

        let mut response = ProviderResponse::new(
            content,
            &self.display_name,
            api_response.model.unwrap_or_else(|| self.config.model.clone()),
        )
        .with_usage(usage);

        if let Some(id) = api_response.id {
            response = response.with_metadata("id", Value::String(id));
        }
        if let Some(reason) = choice.finish_reason {
            response = response.with_metadata("finish_reason", Value::String(reason));
        }

        Ok(response)
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn provider_name(&self) -> &str {
        &self.display_name
    }

    fn supported_models(&self) -> &[String] {
        &self.supported_models
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn requires_api_key(&self) -> bool {
        self.requires_api_key
    }

    fn initialize(&mut self) -> bool {
        if self.client.is_some() {
            return true;
        }

        if let Err(e) = self.validate_config() {
            warn!("[{}] {}", self.display_name, e);
            return false;
        }
        if self.config.base_url.trim().is_empty() {
            warn!("[{}] base_url is required", self.display_name);
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
            Ok(response) => {
                debug!(
                    "[{}] generated {} chars ({} tokens)",
                    self.display_name,
                    response.content.len(),
                    response.usage.total_tokens
                );
                Some(response)
            }
            Err(e) => {
                warn!("[{}] generation failed: {}", self.display_name, e);
                None
            }
        }
    }

    async fn health_check(&self) -> bool {
        let client = match self.client() {
            Ok(client) => client,
            Err(_) => return false,
        };

        match self.authorized(client.get(self.endpoint("models"))).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(
                    "[{}] health check returned {}",
                    self.display_name,
                    response.status()
                );
                false
            }
            Err(e) => {
                debug!("[{}] health check failed: {}", self.display_name, e);
                false
            }
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(flatten)]
    extra: &'a HashMap<String, Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
