//! Provider Integration - 설정에서 live Provider 맵 구성
//!
//! 환경 변수 또는 명시적 record 목록을 plugin key 로 매핑하고
//! `PluginManager::create_provider` 로 인스턴스를 만든다.
//! `initialize()` 가 false 인 provider 는 로그를 남기고 버린다.

use crate::plugin::{PluginManager, PluginRegistry};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use ticker_foundation::TickerConfig;
use ticker_provider::config::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS};
use ticker_provider::{Provider, ProviderConfig, ProviderInfo};
use tracing::{debug, error, info, warn};

// ============================================================================
// ProviderRecord
// ============================================================================

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

/// 평면 provider 설정 record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub name: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub model: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub extra_params: HashMap<String, Value>,

    #[serde(default)]
    pub extra_headers: HashMap<String, String>,

    /// 명시적 plugin key (없으면 name 에서 매핑)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
}

impl ProviderRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_key: String::new(),
            base_url: String::new(),
            model: String::new(),
            timeout: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            extra_params: HashMap::new(),
            extra_headers: HashMap::new(),
            plugin: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = secs;
        self
    }

    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    /// 맵 키 (소문자)
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn to_config(&self) -> ProviderConfig {
        ProviderConfig {
            name: self.name.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            timeout: self.timeout.max(1),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            extra_params: self.extra_params.clone(),
            extra_headers: self.extra_headers.clone(),
        }
    }
}

// ============================================================================
// ProviderSource
// ============================================================================

/// 환경 변수 조회 함수
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// provider 설정 출처
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderSource {
    /// `<PROVIDER>_API_KEY` 환경 변수
    Environment,
    /// 명시적 record 목록
    Records(Vec<ProviderRecord>),
}

/// `Environment` 출처에 쓰이는 값
#[derive(Clone)]
pub struct EnvDefaults {
    pub lookup: EnvLookup,
    pub timeout_secs: u64,
}

impl EnvDefaults {
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lookup = Arc::new(lookup);
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for EnvDefaults {
    fn default() -> Self {
        Self {
            lookup: Arc::new(|key| std::env::var(key).ok()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// 등록된 플러그인 중 API key 변수가 설정된 것마다 record 하나
///
/// API key 변수를 선언하지 않은 외부 플러그인 (로컬 endpoint, 실행 파일) 은
/// key 없이 포함된다.
pub fn records_from_env(
    registry: &PluginRegistry,
    lookup: &dyn Fn(&str) -> Option<String>,
    timeout_secs: u64,
) -> Vec<ProviderRecord> {
    let plugins = registry.list_all();
    let mut names: Vec<&String> = plugins.keys().collect();
    names.sort();

    let mut records = Vec::new();
    for name in names {
        let descriptor = &plugins[name];
        let vars = descriptor.api_key_env();

        let api_key = if vars.is_empty() {
            if descriptor.source.is_builtin() {
                continue;
            }
            String::new()
        } else {
            match vars
                .iter()
                .filter_map(|var| lookup(var))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
            {
                Some(key) => key,
                None => {
                    debug!("No API key set for plugin {} ({})", name, vars.join(", "));
                    continue;
                }
            }
        };

        records.push(
            ProviderRecord::new(descriptor.display_name())
                .with_api_key(api_key)
                .with_timeout(timeout_secs)
                .with_plugin(name.as_str()),
        );
    }
    records
}

/// legacy provider 이름 → plugin key
///
/// 소문자 + 영숫자만 남긴 뒤 별칭을 적용한다. 레지스트리에 없는 key 는 None.
pub fn map_legacy_name(name: &str, registry: &PluginRegistry) -> Option<String> {
    let normalized: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    let key = match normalized.as_str() {
        "google" | "googlegemini" | "googleai" => "gemini",
        "claude" => "anthropic",
        "togetherai" => "together",
        "mistralai" => "mistral",
        other => other,
    };

    registry.contains(key).then(|| key.to_string())
}

// ============================================================================
// ProviderIntegration
// ============================================================================

/// 이름 → live Provider 맵
pub struct ProviderIntegration {
    manager: Arc<PluginManager>,
    source: ProviderSource,
    env: EnvDefaults,
    providers: RwLock<BTreeMap<String, Arc<dyn Provider>>>,
}

impl ProviderIntegration {
    /// 생성 후 바로 provider 맵 구성
    pub fn new(manager: Arc<PluginManager>, source: ProviderSource) -> Self {
        Self::with_env(manager, source, EnvDefaults::default())
    }

    /// 환경 변수 조회 함수 지정
    pub fn with_env(manager: Arc<PluginManager>, source: ProviderSource, env: EnvDefaults) -> Self {
        let integration = Self {
            manager,
            source,
            env,
            providers: RwLock::new(BTreeMap::new()),
        };
        integration.reload();
        integration
    }

    /// 설정으로부터 전체 구성: 내장 등록 → 플러그인 로드 → 환경 변수 provider
    pub fn from_config(config: &TickerConfig) -> Self {
        let manager = Arc::new(PluginManager::from_config(config));
        manager.register_builtins();

        let report = manager.load_all();
        for (unit, reason) in report.failures() {
            warn!("Plugin {} not loaded: {}", unit, reason);
        }

        let env = EnvDefaults::default().with_timeout_secs(config.api_timeout_secs);
        Self::with_env(manager, ProviderSource::Environment, env)
    }

    pub fn plugin_manager(&self) -> &Arc<PluginManager> {
        &self.manager
    }

    pub fn source(&self) -> &ProviderSource {
        &self.source
    }

    fn records(&self) -> Vec<ProviderRecord> {
        match &self.source {
            ProviderSource::Environment => records_from_env(
                self.manager.registry(),
                self.env.lookup.as_ref(),
                self.env.timeout_secs,
            ),
            ProviderSource::Records(records) => records.clone(),
        }
    }

    /// record 하나를 초기화된 Provider 로
    fn instantiate(&self, plugin: &str, record: &ProviderRecord) -> Option<Arc<dyn Provider>> {
        let mut provider = match self.manager.create_provider(plugin, record.to_config()) {
            Ok(provider) => provider,
            Err(e) => {
                error!("Failed to create provider {}: {}", record.name, e);
                return None;
            }
        };

        if !provider.initialize() {
            error!(
                "Failed to initialize provider {} from plugin {}",
                record.name, plugin
            );
            return None;
        }

        Some(Arc::from(provider))
    }

    /// provider 맵을 다시 구성. 구성된 개수를 반환
    ///
    /// 새 맵이 완성된 뒤 한 번에 교체된다. `add_custom_provider` 로 추가한 항목은 사라진다.
    pub fn reload(&self) -> usize {
        let mut built: BTreeMap<String, Arc<dyn Provider>> = BTreeMap::new();

        for record in self.records() {
            let plugin = match record
                .plugin
                .clone()
                .or_else(|| map_legacy_name(&record.name, self.manager.registry()))
            {
                Some(plugin) => plugin,
                None => {
                    warn!("No plugin for provider {}, skipping", record.name);
                    continue;
                }
            };

            let key = record.key();
            if built.contains_key(&key) {
                warn!("Duplicate provider {}, keeping the first", record.name);
                continue;
            }

            if let Some(provider) = self.instantiate(&plugin, &record) {
                info!("Initialized provider: {}", key);
                built.insert(key, provider);
            }
        }

        let count = built.len();
        *self.providers.write() = built;
        info!("{} providers available", count);
        count
    }

    /// 이미 로드된 플러그인으로 provider 추가
    pub fn add_custom_provider(&self, plugin: &str, record: ProviderRecord) -> bool {
        match self.instantiate(plugin, &record) {
            Some(provider) => {
                let key = record.key();
                self.providers.write().insert(key.clone(), provider);
                info!("Added custom provider: {}", key);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// provider 이름 (정렬)
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.read().keys().cloned().collect()
    }

    /// (이름, provider) 스냅샷 (정렬)
    pub fn providers(&self) -> Vec<(String, Arc<dyn Provider>)> {
        self.providers
            .read()
            .iter()
            .map(|(name, provider)| (name.clone(), Arc::clone(provider)))
            .collect()
    }

    pub fn provider(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.read().get(&name.to_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }

    /// 이름 → provider 요약
    pub fn provider_info(&self) -> BTreeMap<String, ProviderInfo> {
        self.providers
            .read()
            .iter()
            .map(|(name, provider)| (name.clone(), provider.info()))
            .collect()
    }

    /// 모든 provider health check
    ///
    /// 각 health check 는 별도 task 에서 실행된다. task 가 panic 하면 unhealthy 로 처리한다.
    pub async fn health_check_all(&self) -> BTreeMap<String, bool> {
        let handles: Vec<(String, tokio::task::JoinHandle<bool>)> = self
            .providers()
            .into_iter()
            .map(|(name, provider)| {
                let handle = tokio::spawn(async move { provider.health_check().await });
                (name, handle)
            })
            .collect();

        let (names, handles): (Vec<String>, Vec<_>) = handles.into_iter().unzip();
        let outcomes = futures::future::join_all(handles).await;

        names
            .into_iter()
            .zip(outcomes)
            .map(|(name, outcome)| {
                let healthy = match outcome {
                    Ok(healthy) => healthy,
                    Err(e) => {
                        error!("Health check failed for {}: {}", name, e);
                        false
                    }
                };
                (name, healthy)
            })
            .collect()
    }
}
