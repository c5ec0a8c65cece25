//! ticker-core: Core Runtime for Ticker
//!
//! Layer2 - 메시지 획득 레이어
//!
//! # 주요 모듈
//!
//! - `plugin`: Provider 플러그인 시스템 (registry, manager, discovery)
//! - `integration`: 설정 → live Provider 맵
//! - `orchestrator`: cache / generation / fallback 획득 알고리즘
//!
//! # 사용 예시
//!
//! ```ignore
//! use ticker_core::Orchestrator;
//! use ticker_foundation::{init_tracing, TickerConfig};
//!
//! init_tracing("info")?;
//! let config = TickerConfig::from_env()?;
//! let orchestrator = Orchestrator::from_config(&config)?;
//!
//! // 메시지 하나
//! let message = orchestrator.acquire_message().await;
//!
//! // 모니터링
//! let health = orchestrator.health_check_all().await;
//! let plugins = orchestrator.list_plugins();
//! ```

// Core modules
pub mod integration;
pub mod orchestrator;
pub mod plugin;

// Re-exports: Plugin
pub use plugin::{
    Capability, LoadReport, PluginDescriptor, PluginInfo, PluginLoadError, PluginManager,
    PluginRegistry, PluginSettings, PluginSettingsStore, PluginSource, PluginVersion,
};

// Re-exports: Integration
pub use integration::{EnvDefaults, ProviderIntegration, ProviderRecord, ProviderSource};

// Re-exports: Orchestrator
pub use orchestrator::{
    Acquisition, AcquisitionConfig, Orchestrator, ARCHIVE_SUFFIX, UNAVAILABLE_MESSAGE,
};
