//! Provider-specific error types
//!
//! ProviderError는 provider 호출 한 번의 실패 원인을 나타냅니다.
//! `generate_message` 밖으로는 나가지 않고 로그 후 `None` 으로 바뀝니다.
//! ticker_foundation::Error와의 변환을 지원합니다.

use thiserror::Error;
use ticker_foundation::Error as FoundationError;

/// Errors that can occur during provider operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// API key is missing or invalid
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Server error (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Network error (connection failed, DNS, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Invalid request (bad parameters, unknown model)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid response from API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Response arrived but carried no text
    #[error("Empty content in response")]
    EmptyContent,

    /// `initialize()` was not called or failed
    #[error("Provider not initialized: {0}")]
    NotInitialized(String),

    /// Provider not configured
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Subprocess plugin failure
    #[error("Plugin process error: {0}")]
    Process(String),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// Create from HTTP status code and body
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ProviderError::Authentication(body.to_string()),
            429 => ProviderError::RateLimited(body.to_string()),
            400 | 404 | 422 => ProviderError::InvalidRequest(body.to_string()),
            500..=599 => ProviderError::ServerError(body.to_string()),
            _ => ProviderError::Unknown(format!("HTTP {}: {}", status, body)),
        }
    }

    /// Configuration problems (as opposed to transient call failures)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ProviderError::NotConfigured(_)
                | ProviderError::NotInitialized(_)
                | ProviderError::Authentication(_)
        )
    }
}

// ============================================================================
// ticker_foundation::Error 변환
// ============================================================================

impl From<ProviderError> for FoundationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(msg) => FoundationError::Config(msg),
            ProviderError::Timeout(secs) => {
                FoundationError::Timeout(format!("provider request exceeded {}s", secs))
            }
            other => FoundationError::Provider(other.to_string()),
        }
    }
}
