//! Orchestrator - 메시지 획득 파이프라인
//!
//! 호출마다 독립적으로 동작한다 (두 저장소 외에 호출 간 상태 없음):
//!
//! ```text
//! 1. MessageStore (cached), RecencyTracker (recent) 로드
//! 2. 확률 p 로 cache 경로: cached \ recent 중 무작위 (비면 cached 전체)
//! 3. generation 경로: provider 순서를 섞어 차례로 호출,
//!    cached 와의 최대 유사도 < threshold 인 첫 응답을 채택
//! 4. fallback: cached 에서 무작위 + " (from archive)"
//! 5. 모두 실패: 고정 sentinel 문자열
//! ```
//!
//! 저장소 파일은 잠금 없이 read-modify-write 된다. 동시 호출은 서로의 갱신을
//! 덮어쓸 수 있다.

use crate::integration::ProviderIntegration;
use crate::plugin::PluginInfo;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use ticker_foundation::config::DEFAULT_CACHE_PROBABILITY;
use ticker_foundation::similarity::{self, DEFAULT_FUZZY_THRESHOLD};
use ticker_foundation::{Error, MessageStore, PromptPair, RecencyTracker, Result, TickerConfig};
use ticker_provider::ProviderInfo;
use tracing::{debug, info, warn};

/// fallback 메시지 표시
pub const ARCHIVE_SUFFIX: &str = " (from archive)";

/// cache 도 provider 도 없을 때 반환하는 메시지
pub const UNAVAILABLE_MESSAGE: &str = "[No response available - please check configuration]";

// ============================================================================
// AcquisitionConfig
// ============================================================================

/// 획득 알고리즘 파라미터
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionConfig {
    /// cache 경로를 시도할 확률 (0.0 ~ 1.0)
    pub cache_probability: f64,

    /// 중복 판정 임계값 (0 ~ 100)
    pub fuzzy_threshold: u8,
}

impl AcquisitionConfig {
    /// 검증 후 생성
    pub fn new(cache_probability: f64, fuzzy_threshold: u8) -> Result<Self> {
        let config = Self {
            cache_probability,
            fuzzy_threshold,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_ticker(config: &TickerConfig) -> Result<Self> {
        Self::new(config.cache_probability, config.threshold()?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.cache_probability) {
            return Err(Error::Config(format!(
                "cache probability must be between 0 and 1, got {}",
                self.cache_probability
            )));
        }
        if self.fuzzy_threshold > 100 {
            return Err(Error::Config(format!(
                "fuzzy threshold must be between 0 and 100, got {}",
                self.fuzzy_threshold
            )));
        }
        Ok(())
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            cache_probability: DEFAULT_CACHE_PROBABILITY,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

// ============================================================================
// Acquisition
// ============================================================================

/// 한 번의 획득 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// cache 경로
    Cached(String),
    /// provider 가 새로 생성
    Generated { content: String, provider: String },
    /// 모든 provider 실패, cache 에서 선택
    Fallback(String),
    /// cache 도 provider 도 없음
    Unavailable,
}

impl Acquisition {
    /// 원문 (fallback 표시 / sentinel 제외)
    pub fn content(&self) -> Option<&str> {
        match self {
            Acquisition::Cached(content) | Acquisition::Fallback(content) => Some(content),
            Acquisition::Generated { content, .. } => Some(content),
            Acquisition::Unavailable => None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Acquisition::Generated { .. })
    }

    /// 호출자에게 보여줄 문자열
    pub fn into_message(self) -> String {
        match self {
            Acquisition::Cached(content) => content,
            Acquisition::Generated { content, .. } => content,
            Acquisition::Fallback(content) => format!("{}{}", content, ARCHIVE_SUFFIX),
            Acquisition::Unavailable => UNAVAILABLE_MESSAGE.to_string(),
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// 메시지 획득 파이프라인
pub struct Orchestrator {
    integration: Arc<ProviderIntegration>,
    store: MessageStore,
    recency: RecencyTracker,
    prompts: PromptPair,
    config: AcquisitionConfig,
}

impl Orchestrator {
    pub fn new(
        integration: Arc<ProviderIntegration>,
        store: MessageStore,
        recency: RecencyTracker,
        prompts: PromptPair,
        config: AcquisitionConfig,
    ) -> Self {
        Self {
            integration,
            store,
            recency,
            prompts,
            config,
        }
    }

    /// 설정으로부터 전체 구성
    pub fn from_config(config: &TickerConfig) -> Result<Self> {
        config.validate()?;
        let acquisition = AcquisitionConfig::from_ticker(config)?;
        let integration = Arc::new(ProviderIntegration::from_config(config));

        Ok(Self::new(
            integration,
            config.message_store(),
            config.recency_tracker(),
            config.prompts(),
            acquisition,
        ))
    }

    pub fn integration(&self) -> &Arc<ProviderIntegration> {
        &self.integration
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn prompts(&self) -> &PromptPair {
        &self.prompts
    }

    // ========================================================================
    // 획득
    // ========================================================================

    /// 메시지 하나 획득
    pub async fn acquire(&self) -> Acquisition {
        let cached = self.store.load();
        let recent = self.recency.load();

        // 1. cache 경로
        if !cached.is_empty() && OsRng.gen_bool(self.config.cache_probability) {
            if let Some(message) = pick_cached(&cached, &recent) {
                debug!("Serving cached message");
                self.remember(&message);
                return Acquisition::Cached(message);
            }
        }

        // 2. generation 경로
        if let Some((content, provider)) = self.generate(&cached).await {
            if let Err(e) = self.store.append(content.clone()) {
                warn!("Failed to persist generated message: {}", e);
            }
            self.remember(&content);
            return Acquisition::Generated { content, provider };
        }

        // 3. fallback
        if let Some(message) = cached.choose(&mut OsRng) {
            info!("All providers failed, serving archived message");
            self.remember(message);
            return Acquisition::Fallback(message.clone());
        }

        warn!("No cached messages and no working provider");
        Acquisition::Unavailable
    }

    /// `acquire` 후 표시용 문자열
    pub async fn acquire_message(&self) -> String {
        self.acquire().await.into_message()
    }

    /// 무작위 순서로 provider 를 호출해 중복이 아닌 첫 응답을 반환
    async fn generate(&self, cached: &[String]) -> Option<(String, String)> {
        let mut providers = self.integration.providers();
        providers.shuffle(&mut OsRng);

        for (name, provider) in providers {
            let response = match provider
                .generate_message(&self.prompts.system, &self.prompts.user)
                .await
            {
                Some(response) => response,
                None => {
                    debug!("[{}] no response, trying next provider", name);
                    continue;
                }
            };

            let score = similarity::max_similarity(&response.content, cached);
            if score >= f64::from(self.config.fuzzy_threshold) {
                info!(
                    "[{}] reply too similar to cache ({:.1} >= {}), trying next provider",
                    name, score, self.config.fuzzy_threshold
                );
                continue;
            }

            info!("[{}] accepted new message", name);
            return Some((response.content, name));
        }

        None
    }

    fn remember(&self, message: &str) {
        if let Err(e) = self.recency.record(message) {
            warn!("Failed to update recent messages: {}", e);
        }
    }

    // ========================================================================
    // 조회 / 관리
    // ========================================================================

    pub fn list_providers(&self) -> Vec<String> {
        self.integration.provider_names()
    }

    pub fn provider_info(&self) -> BTreeMap<String, ProviderInfo> {
        self.integration.provider_info()
    }

    pub async fn health_check_all(&self) -> BTreeMap<String, bool> {
        self.integration.health_check_all().await
    }

    /// provider 맵 재구성. 구성된 개수를 반환
    pub fn reload_providers(&self) -> usize {
        self.integration.reload()
    }

    pub fn list_plugins(&self) -> Vec<PluginInfo> {
        self.integration.plugin_manager().list_plugins()
    }

    /// 저장된 메시지 수
    pub fn cache_size(&self) -> usize {
        self.store.len()
    }
}

/// recent 에 없는 cached 항목 중 무작위 (없으면 cached 전체에서)
fn pick_cached(cached: &[String], recent: &[String]) -> Option<String> {
    let recent: HashSet<&str> = recent.iter().map(String::as_str).collect();
    let fresh: Vec<&String> = cached
        .iter()
        .filter(|m| !recent.contains(m.as_str()))
        .collect();

    if fresh.is_empty() {
        cached.choose(&mut OsRng).cloned()
    } else {
        fresh.choose(&mut OsRng).map(|m| (*m).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_into_message() {
        assert_eq!(Acquisition::Cached("a".into()).into_message(), "a");
        assert_eq!(
            Acquisition::Fallback("a".into()).into_message(),
            "a (from archive)"
        );
        assert_eq!(Acquisition::Unavailable.into_message(), UNAVAILABLE_MESSAGE);
        assert!(Acquisition::Generated {
            content: "n".into(),
            provider: "p".into()
        }
        .is_fresh());
    }

    #[test]
    fn test_acquisition_config_validation() {
        assert!(AcquisitionConfig::new(0.0, 0).is_ok());
        assert!(AcquisitionConfig::new(1.0, 100).is_ok());
        assert!(AcquisitionConfig::new(1.5, 85).unwrap_err().is_fatal());
        assert!(AcquisitionConfig::new(0.5, 101).is_err());
    }

    #[test]
    fn test_pick_cached_avoids_recent() {
        let cached = strings(&["A", "B", "C"]);
        let recent = strings(&["A"]);
        for _ in 0..50 {
            let picked = pick_cached(&cached, &recent).unwrap();
            assert_ne!(picked, "A");
        }
    }

    #[test]
    fn test_pick_cached_falls_back_to_all() {
        let cached = strings(&["A", "B"]);
        let recent = strings(&["B", "A"]);
        let picked = pick_cached(&cached, &recent).unwrap();
        assert!(cached.contains(&picked));
        assert!(pick_cached(&[], &recent).is_none());
    }
}
