//! Logging - tracing subscriber 초기화
//!
//! `RUST_LOG` 가 있으면 그것을, 없으면 주어진 기본 레벨을 사용한다.

use crate::{Error, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 전역 tracing subscriber 설치
///
/// 이미 설치되어 있으면 `Error::Internal` 을 돌려줄 뿐 panic 하지 않는다.
pub fn init_tracing(default_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to initialize tracing: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        let _ = init_tracing("debug");
        assert!(init_tracing("info").is_err());
    }
}
