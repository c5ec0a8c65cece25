//! Plugin Descriptor - 플러그인 메타데이터 + Provider factory

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use ticker_provider::{Provider, ProviderConfig};

/// 메타데이터 기본값
pub const DEFAULT_AUTHOR: &str = "Unknown";
pub const DEFAULT_DESCRIPTION: &str = "Custom AI Provider";

/// 메타데이터 키: 표시 이름
pub const META_DISPLAY_NAME: &str = "display_name";

/// 메타데이터 키: API key 환경 변수 (쉼표 구분)
pub const META_API_KEY_ENV: &str = "api_key_env";

// ============================================================================
// PluginVersion
// ============================================================================

/// 플러그인 버전
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PluginVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// 버전 문자열 파싱 (예: "1.2.3", "v1.2")
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().trim_start_matches('v');
        let parts: Vec<&str> = s.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return None;
        }

        let part = |i: usize| -> Option<u32> {
            match parts.get(i) {
                Some(p) => p.parse().ok(),
                None => Some(0),
            }
        };

        Some(Self {
            major: part(0)?,
            minor: part(1)?,
            patch: part(2)?,
        })
    }
}

impl std::fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Default for PluginVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

// ============================================================================
// Capability
// ============================================================================

/// Provider 가 노출해야 하는 기능
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// provider_name + supported_models
    Describe,
    Initialize,
    GenerateMessage,
    HealthCheck,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Describe,
        Capability::Initialize,
        Capability::GenerateMessage,
        Capability::HealthCheck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Describe => "describe",
            Capability::Initialize => "initialize",
            Capability::GenerateMessage => "generate_message",
            Capability::HealthCheck => "health_check",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s.trim())
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PluginSource
// ============================================================================

/// 플러그인 출처
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "path", rename_all = "snake_case")]
pub enum PluginSource {
    /// 프로세스 시작 시 등록되는 내장 플러그인
    Builtin,
    /// 단일 manifest 파일
    File(PathBuf),
    /// 디렉토리 (실행 파일 + 선택적 plugin.json)
    Directory(PathBuf),
    /// 코드에서 직접 등록
    Runtime,
}

impl PluginSource {
    pub fn is_builtin(&self) -> bool {
        matches!(self, PluginSource::Builtin)
    }
}

// ============================================================================
// PluginDescriptor
// ============================================================================

/// Provider 생성 함수
pub type ProviderFactory = Arc<dyn Fn(ProviderConfig) -> Box<dyn Provider> + Send + Sync>;

/// 플러그인 디스크립터 - 레지스트리에 등록되는 단위
#[derive(Clone)]
pub struct PluginDescriptor {
    /// 등록 키
    pub name: String,

    pub version: PluginVersion,
    pub author: String,
    pub description: String,

    /// 선언된 기능 (네 가지 모두 있어야 유효)
    pub required_capabilities: Vec<Capability>,

    pub source: PluginSource,

    /// 추가 메타데이터 (display_name, api_key_env 등)
    pub metadata: HashMap<String, String>,

    /// 디스크립터 생성 시각
    pub created_at: DateTime<Utc>,

    factory: ProviderFactory,
}

impl PluginDescriptor {
    /// 새 디스크립터 생성 (기본 메타데이터 포함)
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(ProviderConfig) -> Box<dyn Provider> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            version: PluginVersion::default(),
            author: DEFAULT_AUTHOR.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            required_capabilities: Capability::ALL.to_vec(),
            source: PluginSource::Runtime,
            metadata: HashMap::new(),
            created_at: Utc::now(),
            factory: Arc::new(factory),
        }
    }

    /// 빌더 패턴: 버전 설정
    pub fn with_version(mut self, version: PluginVersion) -> Self {
        self.version = version;
        self
    }

    /// 빌더 패턴: 작성자 설정
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// 빌더 패턴: 설명 설정
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// 빌더 패턴: 선언 기능 설정
    pub fn with_capabilities(mut self, capabilities: Vec<Capability>) -> Self {
        self.required_capabilities = capabilities;
        self
    }

    /// 빌더 패턴: 출처 설정
    pub fn with_source(mut self, source: PluginSource) -> Self {
        self.source = source;
        self
    }

    /// 빌더 패턴: 메타데이터 추가
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// 선언되지 않은 기능
    pub fn missing_capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| !self.required_capabilities.contains(c))
            .collect()
    }

    /// 표시 이름 (없으면 등록 키)
    pub fn display_name(&self) -> &str {
        self.metadata
            .get(META_DISPLAY_NAME)
            .map(String::as_str)
            .unwrap_or(&self.name)
    }

    /// API key 를 찾을 환경 변수 목록
    pub fn api_key_env(&self) -> Vec<String> {
        self.metadata
            .get(META_API_KEY_ENV)
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// factory 호출
    pub fn create(&self, config: ProviderConfig) -> Box<dyn Provider> {
        (self.factory)(config)
    }

    /// 직렬화 가능한 요약
    pub fn info(&self) -> PluginInfo {
        PluginInfo {
            name: self.name.clone(),
            display_name: self.display_name().to_string(),
            version: self.version.to_string(),
            author: self.author.clone(),
            description: self.description.clone(),
            capabilities: self.required_capabilities.clone(),
            source: self.source.clone(),
            created_at: self.created_at,
        }
    }
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("author", &self.author)
            .field("description", &self.description)
            .field("required_capabilities", &self.required_capabilities)
            .field("source", &self.source)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// `listPlugins` 결과 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub display_name: String,
    pub version: String,
    pub author: String,
    pub description: String,
    pub capabilities: Vec<Capability>,
    pub source: PluginSource,
    pub created_at: DateTime<Utc>,
}
