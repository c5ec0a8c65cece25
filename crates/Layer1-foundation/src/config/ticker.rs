//! Ticker Config - 환경 변수 기반 통합 설정
//!
//! 모든 값은 환경 변수(또는 임의의 key lookup)에서 읽고, 잘못된 숫자는
//! 경고 후 기본값을 쓴다. 범위 검사는 `validate()` 에서 한 번에 수행하며
//! 실패는 시작 시점의 치명적 `Error::Config` 이다.

use super::prompts::{PromptPair, PromptProfiles, DEFAULT_PROFILE, PROMPTS_FILE};
use crate::similarity::DEFAULT_FUZZY_THRESHOLD;
use crate::storage::{
    MessageStore, RecencyTracker, DEFAULT_LAST_LIMIT, DEFAULT_MAX_CACHE_SIZE, LAST_MESSAGES_FILE,
    MESSAGE_CACHE_FILE,
};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// 기본 캐시 경로 확률
pub const DEFAULT_CACHE_PROBABILITY: f64 = 0.6;

/// 기본 provider 요청 timeout (초)
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// 기본 커스텀 플러그인 디렉토리
pub const DEFAULT_PLUGIN_DIR: &str = "plugins/custom";

/// 기본 플러그인 설정 파일
pub const PLUGIN_CONFIG_FILE: &str = "plugin_config.json";

// ============================================================================
// Environment keys
// ============================================================================

pub const ENV_FUZZY_THRESHOLD: &str = "FUZZY_THRESHOLD";
pub const ENV_CACHE_PROBABILITY: &str = "CACHE_PROBABILITY";
pub const ENV_LAST_LIMIT: &str = "LAST_LIMIT";
pub const ENV_MAX_CACHE_SIZE: &str = "MAX_CACHE_SIZE";
pub const ENV_CACHE_FILE: &str = "CACHE_FILE";
pub const ENV_LAST_FILE: &str = "LAST_FILE";
pub const ENV_PROMPTS_FILE: &str = "PROMPTS_FILE";
pub const ENV_PROMPT_PROFILE: &str = "PROMPT_PROFILE";
pub const ENV_SYSTEM_PROMPT: &str = "SYSTEM_PROMPT";
pub const ENV_USER_PROMPT: &str = "USER_PROMPT";
pub const ENV_API_TIMEOUT: &str = "API_TIMEOUT";
pub const ENV_PLUGIN_DIR: &str = "PLUGIN_DIR";
pub const ENV_PLUGIN_CONFIG_FILE: &str = "PLUGIN_CONFIG_FILE";

// ============================================================================
// TickerConfig
// ============================================================================

/// 메시지 티커 설정
#[derive(Debug, Clone)]
pub struct TickerConfig {
    /// 중복 판정 임계값 (0–100)
    pub fuzzy_threshold: u32,

    /// 캐시 경로를 시도할 확률 (0.0–1.0)
    pub cache_probability: f64,

    /// RecencyTracker 크기
    pub last_limit: usize,

    /// MessageStore 최대 크기
    pub max_cache_size: usize,

    pub cache_file: PathBuf,
    pub last_file: PathBuf,
    pub prompts_file: PathBuf,
    pub prompt_profile: String,

    /// SYSTEM_PROMPT / USER_PROMPT 가 있으면 프로필보다 우선
    pub system_prompt_override: Option<String>,
    pub user_prompt_override: Option<String>,

    /// provider 요청 timeout (초)
    pub api_timeout_secs: u64,

    pub plugin_dir: PathBuf,
    pub plugin_config_file: PathBuf,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: u32::from(DEFAULT_FUZZY_THRESHOLD),
            cache_probability: DEFAULT_CACHE_PROBABILITY,
            last_limit: DEFAULT_LAST_LIMIT,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            cache_file: PathBuf::from(MESSAGE_CACHE_FILE),
            last_file: PathBuf::from(LAST_MESSAGES_FILE),
            prompts_file: PathBuf::from(PROMPTS_FILE),
            prompt_profile: DEFAULT_PROFILE.to_string(),
            system_prompt_override: None,
            user_prompt_override: None,
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            plugin_dir: PathBuf::from(DEFAULT_PLUGIN_DIR),
            plugin_config_file: PathBuf::from(PLUGIN_CONFIG_FILE),
        }
    }
}

impl TickerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 프로세스 환경 변수에서 로드 + 검증
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 key lookup 에서 로드 + 검증
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            fuzzy_threshold: parse_or(&lookup, ENV_FUZZY_THRESHOLD, defaults.fuzzy_threshold),
            cache_probability: parse_or(&lookup, ENV_CACHE_PROBABILITY, defaults.cache_probability),
            last_limit: parse_or(&lookup, ENV_LAST_LIMIT, defaults.last_limit),
            max_cache_size: parse_or(&lookup, ENV_MAX_CACHE_SIZE, defaults.max_cache_size),
            cache_file: get(ENV_CACHE_FILE).map(PathBuf::from).unwrap_or(defaults.cache_file),
            last_file: get(ENV_LAST_FILE).map(PathBuf::from).unwrap_or(defaults.last_file),
            prompts_file: get(ENV_PROMPTS_FILE)
                .map(PathBuf::from)
                .unwrap_or(defaults.prompts_file),
            prompt_profile: get(ENV_PROMPT_PROFILE).unwrap_or(defaults.prompt_profile),
            system_prompt_override: get(ENV_SYSTEM_PROMPT),
            user_prompt_override: get(ENV_USER_PROMPT),
            api_timeout_secs: parse_or(&lookup, ENV_API_TIMEOUT, defaults.api_timeout_secs),
            plugin_dir: get(ENV_PLUGIN_DIR).map(PathBuf::from).unwrap_or(defaults.plugin_dir),
            plugin_config_file: get(ENV_PLUGIN_CONFIG_FILE)
                .map(PathBuf::from)
                .unwrap_or(defaults.plugin_config_file),
        };

        config.validate()?;
        Ok(config)
    }

    /// 모든 문제를 모아서 하나의 Config 에러로 반환
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();

        if !(0.0..=1.0).contains(&self.cache_probability) {
            issues.push(format!(
                "{} must be between 0 and 1, got {}",
                ENV_CACHE_PROBABILITY, self.cache_probability
            ));
        }
        if self.fuzzy_threshold > 100 {
            issues.push(format!(
                "{} must be between 0 and 100, got {}",
                ENV_FUZZY_THRESHOLD, self.fuzzy_threshold
            ));
        }
        if self.last_limit < 1 {
            issues.push(format!("{} must be at least 1", ENV_LAST_LIMIT));
        }
        if self.max_cache_size < 1 {
            issues.push(format!("{} must be at least 1", ENV_MAX_CACHE_SIZE));
        }
        if self.api_timeout_secs < 1 {
            issues.push(format!("{} must be at least 1", ENV_API_TIMEOUT));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(issues.join("; ")))
        }
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// 상대 경로를 모두 `base` 아래로 옮긴다
    pub fn with_base_dir(mut self, base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        for path in [
            &mut self.cache_file,
            &mut self.last_file,
            &mut self.prompts_file,
            &mut self.plugin_dir,
            &mut self.plugin_config_file,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }

    pub fn with_fuzzy_threshold(mut self, threshold: u32) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    pub fn with_cache_probability(mut self, probability: f64) -> Self {
        self.cache_probability = probability;
        self
    }

    // ========================================================================
    // Derived values
    // ========================================================================

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// 검증된 임계값 (0–100)
    pub fn threshold(&self) -> Result<u8> {
        u8::try_from(self.fuzzy_threshold)
            .ok()
            .filter(|t| *t <= 100)
            .ok_or_else(|| {
                Error::Config(format!(
                    "{} must be between 0 and 100, got {}",
                    ENV_FUZZY_THRESHOLD, self.fuzzy_threshold
                ))
            })
    }

    pub fn message_store(&self) -> MessageStore {
        MessageStore::new(&self.cache_file, self.max_cache_size)
    }

    pub fn recency_tracker(&self) -> RecencyTracker {
        RecencyTracker::new(&self.last_file, self.last_limit)
    }

    /// 환경 변수 > 프로필 > 기본값 순으로 prompt 결정
    pub fn prompts(&self) -> PromptPair {
        let mut prompts = PromptProfiles::load(&self.prompts_file).resolve(&self.prompt_profile);
        if let Some(system) = &self.system_prompt_override {
            prompts.system = system.clone();
        }
        if let Some(user) = &self.user_prompt_override {
            prompts.user = user.clone();
        }
        prompts
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("Invalid {} value '{}', using default {}", key, raw, default);
                default
            }
        },
        _ => default,
    }
}
