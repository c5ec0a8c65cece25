//! Subprocess provider
//!
//! Runtime-loaded third-party providers run as a separate executable, never
//! as in-process code. Each call spawns the executable once:
//!
//! - stdin: one JSON request
//!   `{"action": "generate" | "health", "system_prompt", "user_prompt", "model",
//!   "max_tokens", "temperature", "extra_params"}`
//! - env: `TICKER_API_KEY` (when configured)
//! - stdout: one JSON reply
//!   `{"content", "model"?, "usage"?, "metadata"?}`, `{"error": "..."}` or
//!   `{"healthy": bool}`
//!
//! The whole exchange is bounded by the configured timeout; the child is
//! killed when the timeout fires.

use crate::{
    config::ProviderConfig,
    error::ProviderError,
    r#trait::{Provider, ProviderResponse, TokenUsage},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Environment variable carrying the API key into the child
pub const API_KEY_ENV: &str = "TICKER_API_KEY";

const GENERATE_ACTION: &str = "generate";
const HEALTH_ACTION: &str = "health";

/// Provider backed by an external executable
pub struct ProcessProvider {
    config: ProviderConfig,
    display_name: String,
    command: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    supported_models: Vec<String>,
    ready: bool,
}

impl ProcessProvider {
    pub fn new(config: ProviderConfig, command: impl Into<PathBuf>) -> Self {
        Self {
            display_name: config.name.clone(),
            config,
            command: command.into(),
            args: Vec::new(),
            working_dir: None,
            supported_models: Vec::new(),
            ready: false,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_supported_models(mut self, models: Vec<String>) -> Self {
        self.supported_models = models;
        self
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    fn command_available(&self) -> bool {
        if self.command.components().count() > 1 || self.command.is_absolute() {
            self.command.is_file()
        } else {
            which::which(&self.command).is_ok()
        }
    }

    async fn exchange(&self, request: &ProcessRequest<'_>) -> Result<ProcessReply, ProviderError> {
        if !self.ready {
            return Err(ProviderError::NotInitialized(self.display_name.clone()));
        }

        let payload = serde_json::to_vec(request)
            .map_err(|e| ProviderError::Process(format!("Failed to encode request: {}", e)))?;

        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        if !self.config.api_key.is_empty() {
            command.env(API_KEY_ENV, &self.config.api_key);
        }

        let run = async {
            let mut child = command.spawn()?;
            if let Some(mut stdin) = child.stdin.take() {
                // 요청을 다 읽지 않고 끝난 child 의 stdout 도 그대로 사용
                let write = async {
                    stdin.write_all(&payload).await?;
                    stdin.write_all(b"\n").await?;
                    stdin.shutdown().await
                };
                match write.await {
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                        debug!("[{}] plugin closed stdin early", self.display_name);
                    }
                    other => other?,
                }
            }
            child.wait_with_output().await
        };

        let output = match tokio::time::timeout(self.config.timeout_duration(), run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ProviderError::Process(format!(
                    "Failed to run {}: {}",
                    self.command.display(),
                    e
                )))
            }
            Err(_) => return Err(ProviderError::Timeout(self.config.timeout)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();

        if stdout.is_empty() {
            if request.action == HEALTH_ACTION {
                return Ok(ProcessReply {
                    exit_ok: output.status.success(),
                    ..ProcessReply::default()
                });
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Process(if output.status.success() {
                "plugin produced no output".to_string()
            } else if stderr.trim().is_empty() {
                format!("plugin exited with code {:?}", output.status.code())
            } else {
                stderr.trim().to_string()
            }));
        }

        let mut reply: ProcessReply = serde_json::from_str(stdout)
            .map_err(|e| ProviderError::InvalidResponse(format!("plugin reply: {}", e)))?;
        reply.exit_ok = output.status.success();
        Ok(reply)
    }

    fn request<'a>(&'a self, action: &'a str, system: &'a str, user: &'a str) -> ProcessRequest<'a> {
        ProcessRequest {
            action,
            system_prompt: system,
            user_prompt: user,
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            extra_params: &self.config.extra_params,
        }
    }

    async fn generate(&self, system: &str, user: &str) -> Result<ProviderResponse, ProviderError> {
        let reply = self.exchange(&self.request(GENERATE_ACTION, system, user)).await?;

        if let Some(error) = reply.error {
            return Err(ProviderError::Process(error));
        }

        let content = reply
            .content
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(ProviderError::EmptyContent);
        }

        let mut response = ProviderResponse::new(
            content,
            &self.display_name,
            reply.model.unwrap_or_else(|| self.config.model.clone()),
        )
        .with_usage(reply.usage.unwrap_or_default());
        response.metadata = reply.metadata;
        Ok(response)
    }
}

#[async_trait]
impl Provider for ProcessProvider {
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
        false
    }

    fn initialize(&mut self) -> bool {
        if self.ready {
            return true;
        }

        if let Err(e) = self.validate_config() {
            warn!("[{}] {}", self.display_name, e);
            return false;
        }
        if !self.command_available() {
            warn!(
                "[{}] plugin executable not found: {}",
                self.display_name,
                self.command.display()
            );
            return false;
        }

        debug!("[{}] using executable {}", self.display_name, self.command.display());
        self.ready = true;
        true
    }

    async fn generate_message(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Option<ProviderResponse> {
        match self.generate(system_prompt, user_prompt).await {
            Ok(response) => Some(response),
            Err(e) => {
                warn!("[{}] generation failed: {}", self.display_name, e);
                None
            }
        }
    }

    async fn health_check(&self) -> bool {
        match self.exchange(&self.request(HEALTH_ACTION, "", "")).await {
            Ok(reply) => reply.healthy.unwrap_or(reply.exit_ok && reply.error.is_none()),
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
struct ProcessRequest<'a> {
    action: &'a str,
    system_prompt: &'a str,
    user_prompt: &'a str,
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    extra_params: &'a HashMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ProcessReply {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<TokenUsage>,
    #[serde(default)]
    metadata: HashMap<String, Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    healthy: Option<bool>,
    #[serde(skip)]
    exit_ok: bool,
}
