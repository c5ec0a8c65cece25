//! # Plugin System
//!
//! Provider 플러그인 시스템
//!
//! ## 개요
//!
//! 새 backend 를 orchestration 코드 수정 없이 추가할 수 있습니다:
//! - 내장 플러그인: 프로세스 시작 시 factory 등록
//! - 외부 플러그인: 플러그인 디렉토리의 manifest (HTTP endpoint 또는 실행 파일)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PluginManager                           │
//! │  ┌───────────────────────────────────────────────────────┐ │
//! │  │                   PluginRegistry                       │ │
//! │  │  ┌────────────┬────────────┬────────────────────┐    │ │
//! │  │  │ openrouter │ groq       │ local (file unit)  │    │ │
//! │  │  │ (builtin)  │ (builtin)  │                    │    │ │
//! │  │  └────────────┴────────────┴────────────────────┘    │ │
//! │  └───────────────────────────────────────────────────────┘ │
//! │         ▲                         ▲                         │
//! │  PluginDiscovery ── loader   PluginSettingsStore            │
//! │  (plugins/custom)            (plugin_config.json)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! let manager = PluginManager::from_config(&config);
//! manager.register_builtins();
//! let report = manager.load_all();
//! for (unit, reason) in report.failures() {
//!     eprintln!("{unit}: {reason}");
//! }
//! let provider = manager.create_provider("groq", ProviderConfig::new("Groq"))?;
//! ```

pub mod builtin;
mod descriptor;
mod discovery;
mod error;
pub mod loader;
mod manager;
mod manifest;
mod registry;
mod settings;

pub use descriptor::{
    Capability, PluginDescriptor, PluginInfo, PluginSource, PluginVersion, ProviderFactory,
    DEFAULT_AUTHOR, DEFAULT_DESCRIPTION, META_API_KEY_ENV, META_DISPLAY_NAME,
};
pub use discovery::{DiscoveredUnit, PluginDiscovery, UnitLayout};
pub use error::PluginLoadError;
pub use manager::{LoadReport, PluginManager};
pub use manifest::{EnvNames, PluginManifest, UnitKind, DEFAULT_COMMAND, MANIFEST_FILE};
pub use registry::PluginRegistry;
pub use settings::{PluginSettings, PluginSettingsStore};
