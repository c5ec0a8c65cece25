//! Plugin load errors
//!
//! 모든 variant 는 문제가 된 unit 이름을 가진다.

use super::descriptor::Capability;
use thiserror::Error;

/// 플러그인 unit 하나를 로드하다 발생한 에러
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginLoadError {
    #[error("[{unit}] plugin not found")]
    NotFound { unit: String },

    #[error("[{unit}] plugin is disabled")]
    Disabled { unit: String },

    #[error("[{unit}] malformed metadata: {reason}")]
    MalformedMetadata { unit: String, reason: String },

    #[error("[{}] missing capabilities: {}", .unit, join(.missing))]
    MissingCapability {
        unit: String,
        missing: Vec<Capability>,
    },

    #[error("[{unit}] no provider implementation: {reason}")]
    MissingImplementation { unit: String, reason: String },

    #[error("[{unit}] plugin is already registered")]
    Duplicate { unit: String },

    #[error("[{unit}] invalid plugin: {reason}")]
    Invalid { unit: String, reason: String },

    #[error("[{unit}] I/O error: {reason}")]
    Io { unit: String, reason: String },
}

fn join(caps: &[Capability]) -> String {
    caps.iter()
        .map(Capability::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl PluginLoadError {
    /// 문제가 된 unit
    pub fn unit(&self) -> &str {
        match self {
            PluginLoadError::NotFound { unit }
            | PluginLoadError::Disabled { unit }
            | PluginLoadError::MalformedMetadata { unit, .. }
            | PluginLoadError::MissingCapability { unit, .. }
            | PluginLoadError::MissingImplementation { unit, .. }
            | PluginLoadError::Duplicate { unit }
            | PluginLoadError::Invalid { unit, .. }
            | PluginLoadError::Io { unit, .. } => unit,
        }
    }

    /// 사람이 읽는 사유 (unit prefix 제외)
    pub fn reason(&self) -> String {
        let full = self.to_string();
        let prefix = format!("[{}] ", self.unit());
        full.strip_prefix(&prefix).map(str::to_string).unwrap_or(full)
    }

    pub(crate) fn malformed(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        PluginLoadError::MalformedMetadata {
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        PluginLoadError::Invalid {
            unit: unit.into(),
            reason: reason.into(),
        }
    }
}

impl From<PluginLoadError> for ticker_foundation::Error {
    fn from(e: PluginLoadError) -> Self {
        ticker_foundation::Error::Plugin(e.to_string())
    }
}
