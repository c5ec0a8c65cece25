//! Error types for Ticker
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Ticker 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련 (시작 시점에 치명적)
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 저장소 관련
    // ========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    // ========================================================================
    // Provider 관련
    // ========================================================================
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // ========================================================================
    // Plugin 관련
    // ========================================================================
    #[error("Plugin error: {0}")]
    Plugin(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 시작 시점에 치명적인 에러인지 확인
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// 저장소 손상/읽기 실패 계열인지 확인 (빈 상태로 취급 가능)
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Io(_) | Error::Json(_))
    }
}
