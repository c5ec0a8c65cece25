//! Plugin Manifest - 외부 플러그인 unit 의 메타데이터
//!
//! 파일 unit 은 `<name>.json` 자체가 manifest 이고, 디렉토리 unit 은
//! 선택적으로 `plugin.json` 을 가진다.
//!
//! ```json
//! {
//!   "name": "Local LLM",
//!   "version": "1.2.0",
//!   "author": "someone",
//!   "description": "llama.cpp server on localhost",
//!   "requires": ["describe", "initialize", "generate_message", "health_check"],
//!   "kind": "openai_compatible",
//!   "base_url": "http://127.0.0.1:8080/v1",
//!   "default_model": "llama-3",
//!   "supported_models": ["llama-3"],
//!   "api_key_env": ["LOCAL_LLM_KEY"]
//! }
//! ```

use super::descriptor::{Capability, PluginVersion, DEFAULT_AUTHOR, DEFAULT_DESCRIPTION};
use serde::{Deserialize, Serialize};

/// 디렉토리 unit 의 메타데이터 파일
pub const MANIFEST_FILE: &str = "plugin.json";

/// 디렉토리 unit 의 기본 실행 파일
pub const DEFAULT_COMMAND: &str = "provider";

/// unit 이 Provider 를 구현하는 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// chat-completions 호환 HTTP endpoint
    OpenaiCompatible,
    /// stdin/stdout JSON 을 주고받는 실행 파일
    Process,
}

/// API key 환경 변수: 문자열 하나 또는 목록
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvNames {
    One(String),
    Many(Vec<String>),
}

impl EnvNames {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            EnvNames::One(name) => vec![name.clone()],
            EnvNames::Many(names) => names.clone(),
        }
    }
}

/// unit manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// 표시 이름 (레지스트리 키는 unit 이름)
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// 선언 capability (생략 시 전체)
    #[serde(default)]
    pub requires: Option<Vec<String>>,

    #[serde(default)]
    pub kind: Option<UnitKind>,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub default_model: Option<String>,

    #[serde(default)]
    pub supported_models: Vec<String>,

    /// 실행 파일 (unit 디렉토리 기준 상대 경로 또는 PATH 상의 이름)
    #[serde(default, alias = "main")]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub api_key_env: Option<EnvNames>,
}

impl PluginManifest {
    /// JSON 파싱
    pub fn from_json(raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|e| e.to_string())
    }

    /// 버전 (생략 시 1.0.0)
    pub fn parsed_version(&self) -> Result<PluginVersion, String> {
        match &self.version {
            None => Ok(PluginVersion::default()),
            Some(raw) => {
                PluginVersion::parse(raw).ok_or_else(|| format!("invalid version '{}'", raw))
            }
        }
    }

    /// 선언 capability (생략 시 전체)
    pub fn capabilities(&self) -> Result<Vec<Capability>, String> {
        match &self.requires {
            None => Ok(Capability::ALL.to_vec()),
            Some(names) => names
                .iter()
                .map(|n| Capability::parse(n).ok_or_else(|| format!("unknown capability '{}'", n)))
                .collect(),
        }
    }

    pub fn author_or_default(&self) -> String {
        non_empty(&self.author).unwrap_or(DEFAULT_AUTHOR).to_string()
    }

    pub fn description_or_default(&self) -> String {
        non_empty(&self.description)
            .unwrap_or(DEFAULT_DESCRIPTION)
            .to_string()
    }

    pub fn api_key_env(&self) -> Vec<String> {
        self.api_key_env
            .as_ref()
            .map(EnvNames::to_vec)
            .unwrap_or_default()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
