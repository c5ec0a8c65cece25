//! Plugin Manager - 플러그인 라이프사이클 관리
//!
//! - 내장 플러그인 등록
//! - 플러그인 디렉토리 발견 및 로드 (unit 단위로 실패 격리)
//! - enable/disable 목록 영속화
//! - unload / reload

use super::builtin;
use super::descriptor::{PluginDescriptor, PluginInfo};
use super::discovery::{DiscoveredUnit, PluginDiscovery};
use super::error::PluginLoadError;
use super::loader;
use super::registry::PluginRegistry;
use super::settings::PluginSettingsStore;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use ticker_foundation::{Result, TickerConfig};
use ticker_provider::{Provider, ProviderConfig};
use tracing::{debug, error, info, warn};

// ============================================================================
// LoadReport
// ============================================================================

/// `load_all` 결과
#[derive(Debug, Default)]
pub struct LoadReport {
    /// 새로 등록된 unit
    pub loaded: Vec<String>,

    /// 실패한 unit 과 사유
    pub failed: Vec<PluginLoadError>,

    /// 비활성화되었거나 이미 로드된 unit
    pub skipped: Vec<String>,
}

impl LoadReport {
    /// (unit, reason) 목록
    pub fn failures(&self) -> Vec<(String, String)> {
        self.failed
            .iter()
            .map(|e| (e.unit().to_string(), e.reason()))
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

// ============================================================================
// PluginManager
// ============================================================================

/// 플러그인 매니저 - 레지스트리 + 설정 + 발견
pub struct PluginManager {
    /// 플러그인 레지스트리
    registry: Arc<PluginRegistry>,

    /// enable/disable 목록
    settings: PluginSettingsStore,

    /// 플러그인 디렉토리 스캐너
    discovery: PluginDiscovery,

    /// load / unload / reload 직렬화
    lifecycle: Mutex<()>,
}

impl PluginManager {
    /// 새 매니저 생성
    pub fn new(
        registry: Arc<PluginRegistry>,
        settings: PluginSettingsStore,
        plugin_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            registry,
            settings,
            discovery: PluginDiscovery::new(plugin_dir.as_ref()),
            lifecycle: Mutex::new(()),
        }
    }

    /// 설정 파일 / 플러그인 디렉토리 경로로 생성
    pub fn from_config(config: &TickerConfig) -> Self {
        Self::new(
            Arc::new(PluginRegistry::new()),
            PluginSettingsStore::open(&config.plugin_config_file),
            &config.plugin_dir,
        )
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &PluginSettingsStore {
        &self.settings
    }

    pub fn plugin_dir(&self) -> &Path {
        self.discovery.directory()
    }

    // ========================================================================
    // 등록
    // ========================================================================

    /// 내장 플러그인 등록. 등록된 개수를 반환
    pub fn register_builtins(&self) -> usize {
        let _guard = self.lifecycle.lock();
        let mut count = 0;
        for descriptor in builtin::descriptors() {
            let name = descriptor.name.clone();
            if self.settings.is_disabled(&name) {
                info!("Skipping disabled plugin: {}", name);
                continue;
            }
            match self.admit(descriptor) {
                Ok(()) => count += 1,
                Err(e) => warn!("Failed to register built-in plugin: {}", e),
            }
        }
        debug!("Registered {} built-in plugins", count);
        count
    }

    /// 코드에서 만든 디스크립터 등록
    pub fn register(&self, descriptor: PluginDescriptor) -> std::result::Result<(), PluginLoadError> {
        let _guard = self.lifecycle.lock();
        if self.settings.is_disabled(&descriptor.name) {
            return Err(PluginLoadError::Disabled {
                unit: descriptor.name,
            });
        }
        self.admit(descriptor)
    }

    /// 검증 후 레지스트리에 등록 (중복은 항상 거부)
    fn admit(&self, descriptor: PluginDescriptor) -> std::result::Result<(), PluginLoadError> {
        if self.settings.validate_on_load() {
            self.registry.check(&descriptor)?;
        }

        let name = descriptor.name.clone();
        if self.registry.register(&name, descriptor) {
            Ok(())
        } else {
            Err(PluginLoadError::Duplicate { unit: name })
        }
    }

    // ========================================================================
    // 발견 / 로드
    // ========================================================================

    /// 플러그인 디렉토리의 unit 목록
    pub fn discover(&self) -> Vec<DiscoveredUnit> {
        self.discovery.discover()
    }

    /// 이름으로 unit 하나 로드
    pub fn load_plugin(&self, name: &str) -> std::result::Result<(), PluginLoadError> {
        let _guard = self.lifecycle.lock();
        self.load_unit_named(name)
    }

    fn load_unit_named(&self, name: &str) -> std::result::Result<(), PluginLoadError> {
        if self.settings.is_disabled(name) {
            return Err(PluginLoadError::Disabled {
                unit: name.to_string(),
            });
        }
        if self.registry.contains(name) {
            return Err(PluginLoadError::Duplicate {
                unit: name.to_string(),
            });
        }

        let unit = self
            .discovery
            .find(name)
            .ok_or_else(|| PluginLoadError::NotFound {
                unit: name.to_string(),
            })?;
        self.load_unit(&unit)
    }

    fn load_unit(&self, unit: &DiscoveredUnit) -> std::result::Result<(), PluginLoadError> {
        info!("Loading plugin: {}", unit.name);
        let descriptor = loader::resolve(unit)?;
        self.admit(descriptor)?;
        info!("Plugin {} loaded successfully", unit.name);
        Ok(())
    }

    /// 발견된 모든 unit + enabled 목록 로드
    ///
    /// 한 unit 의 실패는 나머지에 영향을 주지 않는다.
    pub fn load_all(&self) -> LoadReport {
        let _guard = self.lifecycle.lock();
        let mut report = LoadReport::default();

        if self.settings.auto_discovery() {
            for unit in self.discovery.discover() {
                if self.settings.is_disabled(&unit.name) {
                    info!("Skipping disabled plugin: {}", unit.name);
                    report.skipped.push(unit.name);
                    continue;
                }
                if self.is_loaded_from(&unit) {
                    debug!("Plugin {} already loaded", unit.name);
                    report.skipped.push(unit.name);
                    continue;
                }

                match self.load_unit(&unit) {
                    Ok(()) => report.loaded.push(unit.name),
                    Err(e) => {
                        error!("Failed to load plugin: {}", e);
                        report.failed.push(e);
                    }
                }
            }
        }

        for name in self.settings.snapshot().enabled_plugins {
            if self.registry.contains(&name)
                || report.loaded.contains(&name)
                || report.failed.iter().any(|e| e.unit() == name)
            {
                continue;
            }
            match self.load_unit_named(&name) {
                Ok(()) => report.loaded.push(name),
                Err(e) => {
                    error!("Failed to load enabled plugin: {}", e);
                    report.failed.push(e);
                }
            }
        }

        info!(
            "Plugin load complete: {} loaded, {} failed, {} skipped",
            report.loaded.len(),
            report.failed.len(),
            report.skipped.len()
        );
        report
    }

    fn is_loaded_from(&self, unit: &DiscoveredUnit) -> bool {
        self.registry
            .get(&unit.name)
            .map(|d| loader::source_of(unit) == d.source)
            .unwrap_or(false)
    }

    // ========================================================================
    // Unload / Reload
    // ========================================================================

    /// 레지스트리에서 제거
    pub fn unload(&self, name: &str) -> bool {
        let _guard = self.lifecycle.lock();
        let removed = self.registry.unregister(name);
        if removed {
            info!("Plugin {} unloaded", name);
        } else {
            debug!("Plugin {} was not loaded", name);
        }
        removed
    }

    /// 다시 resolve 한 뒤 한 번에 교체
    ///
    /// 교체 전까지 이전 디스크립터가 그대로 남아 있으므로 관찰자는 "없음" 상태를
    /// 보지 않는다. 실패 시 이전 디스크립터가 유지된다.
    pub fn reload(&self, name: &str) -> std::result::Result<(), PluginLoadError> {
        let _guard = self.lifecycle.lock();

        if self.settings.is_disabled(name) {
            return Err(PluginLoadError::Disabled {
                unit: name.to_string(),
            });
        }

        let current = self.registry.get(name);
        let descriptor = match current.as_ref().map(|d| d.source.is_builtin()) {
            Some(true) => ticker_provider::preset(name)
                .map(builtin::descriptor)
                .ok_or_else(|| PluginLoadError::NotFound {
                    unit: name.to_string(),
                })?,
            _ => {
                let unit = self
                    .discovery
                    .find(name)
                    .ok_or_else(|| PluginLoadError::NotFound {
                        unit: name.to_string(),
                    })?;
                loader::resolve(&unit)?
            }
        };

        if self.settings.validate_on_load() {
            self.registry.check(&descriptor)?;
        }

        self.registry.replace(name, descriptor);
        info!("Plugin {} reloaded", name);
        Ok(())
    }

    // ========================================================================
    // Enable / Disable
    // ========================================================================

    /// 활성화 (저장)
    pub fn enable(&self, name: &str) -> Result<()> {
        self.settings.enable(name)?;
        info!("Plugin {} enabled", name);
        Ok(())
    }

    /// 비활성화 (저장) + 로드되어 있으면 unload
    pub fn disable(&self, name: &str) -> Result<()> {
        self.settings.disable(name)?;
        info!("Plugin {} disabled", name);
        self.unload(name);
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        !self.settings.is_disabled(name)
    }

    // ========================================================================
    // Provider 생성
    // ========================================================================

    /// 플러그인 factory 로 Provider 생성 (plugin_settings override 적용)
    pub fn create_provider(
        &self,
        name: &str,
        config: ProviderConfig,
    ) -> std::result::Result<Box<dyn Provider>, PluginLoadError> {
        if self.settings.is_disabled(name) {
            return Err(PluginLoadError::Disabled {
                unit: name.to_string(),
            });
        }

        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| PluginLoadError::NotFound {
                unit: name.to_string(),
            })?;

        let overrides = self.settings.overrides(name);
        let config = if overrides.is_empty() {
            config
        } else {
            config.with_overrides(&overrides)
        };

        Ok(descriptor.create(config))
    }

    /// 등록된 플러그인 요약 (이름 순)
    pub fn list_plugins(&self) -> Vec<PluginInfo> {
        let mut plugins: Vec<PluginInfo> = self
            .registry
            .list_all()
            .values()
            .map(PluginDescriptor::info)
            .collect();
        plugins.sort_by(|a, b| a.name.cmp(&b.name));
        plugins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::descriptor::{Capability, PluginSource};
    use crate::plugin::settings::PluginSettings;
    use serde_json::Value;
    use std::collections::HashMap;
    use tempfile::TempDir;
    use ticker_provider::{OpenAiCompatProvider, BUILTIN_PRESETS};

    fn manager(dir: &TempDir) -> PluginManager {
        let plugins = dir.path().join("plugins");
        std::fs::create_dir_all(&plugins).unwrap();
        PluginManager::new(
            Arc::new(PluginRegistry::new()),
            PluginSettingsStore::open(dir.path().join("plugin_config.json")),
            plugins,
        )
    }

    fn write_unit(dir: &TempDir, name: &str, body: &str) {
        std::fs::write(dir.path().join("plugins").join(format!("{}.json", name)), body).unwrap();
    }

    fn descriptor(name: &str) -> PluginDescriptor {
        PluginDescriptor::new(name, |config| Box::new(OpenAiCompatProvider::new(config)))
    }

    #[test]
    fn test_register_builtins() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        manager.settings().disable("mistral").unwrap();

        assert_eq!(manager.register_builtins(), BUILTIN_PRESETS.len() - 1);
        assert!(!manager.registry().contains("mistral"));
        assert!(manager.registry().contains("openrouter"));
    }

    #[test]
    fn test_load_all_isolates_failures() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        write_unit(&dir, "good", r#"{"base_url": "http://127.0.0.1:9/v1", "default_model": "m"}"#);
        write_unit(&dir, "broken", "{ nope");
        write_unit(&dir, "partial", r#"{"base_url": "http://x.test", "requires": ["initialize"]}"#);
        write_unit(&dir, "off", r#"{"base_url": "http://x.test"}"#);
        manager.settings().disable("off").unwrap();

        let report = manager.load_all();
        assert_eq!(report.loaded, vec!["good".to_string()]);
        assert_eq!(report.skipped, vec!["off".to_string()]);

        let mut failed: Vec<String> = report.failures().into_iter().map(|(unit, _)| unit).collect();
        failed.sort();
        assert_eq!(failed, vec!["broken".to_string(), "partial".to_string()]);
        assert!(report
            .failed
            .iter()
            .any(|e| matches!(e, PluginLoadError::MissingCapability { .. })));

        // 두 번째 호출은 이미 로드된 unit 을 건너뛴다
        let again = manager.load_all();
        assert!(again.loaded.is_empty());
        assert!(again.skipped.contains(&"good".to_string()));
    }

    #[test]
    fn test_validate_on_load_disabled() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("plugin_config.json"),
            serde_json::to_string(&PluginSettings {
                validate_on_load: false,
                ..PluginSettings::default()
            })
            .unwrap(),
        )
        .unwrap();
        let manager = manager(&dir);
        write_unit(&dir, "partial", r#"{"base_url": "http://x.test", "requires": ["initialize"]}"#);

        assert!(manager.load_plugin("partial").is_ok());
        assert_eq!(
            manager.load_plugin("partial"),
            Err(PluginLoadError::Duplicate {
                unit: "partial".to_string()
            })
        );
    }

    #[test]
    fn test_unit_name_collision_with_builtin() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        manager.register_builtins();
        write_unit(&dir, "groq", r#"{"base_url": "http://evil.test"}"#);

        let report = manager.load_all();
        assert!(matches!(report.failed.as_slice(), [PluginLoadError::Duplicate { unit }] if unit == "groq"));
        assert_eq!(
            manager.registry().get("groq").map(|d| d.source),
            Some(PluginSource::Builtin)
        );
    }

    #[test]
    fn test_load_enabled_but_missing() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        manager.enable("ghost").unwrap();

        let report = manager.load_all();
        assert_eq!(
            report.failed,
            vec![PluginLoadError::NotFound {
                unit: "ghost".to_string()
            }]
        );
    }

    #[test]
    fn test_disable_unloads_and_persists() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        manager.register_builtins();

        manager.disable("groq").unwrap();
        assert!(!manager.registry().contains("groq"));
        assert!(!manager.is_enabled("groq"));
        assert!(matches!(
            manager.create_provider("groq", ProviderConfig::new("Groq")),
            Err(PluginLoadError::Disabled { .. })
        ));

        let reopened = PluginSettingsStore::open(dir.path().join("plugin_config.json"));
        assert!(reopened.is_disabled("groq"));

        manager.enable("groq").unwrap();
        assert!(manager.is_enabled("groq"));
    }

    #[test]
    fn test_reload_replaces_descriptor() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        write_unit(&dir, "local", r#"{"version": "1.0.0", "base_url": "http://x.test"}"#);
        manager.load_plugin("local").unwrap();

        write_unit(&dir, "local", r#"{"version": "1.1.0", "base_url": "http://x.test"}"#);
        manager.reload("local").unwrap();
        assert_eq!(
            manager.registry().get("local").map(|d| d.version.to_string()),
            Some("1.1.0".to_string())
        );

        // 실패한 reload 는 이전 디스크립터를 유지한다
        write_unit(&dir, "local", "{ broken");
        assert!(matches!(
            manager.reload("local"),
            Err(PluginLoadError::MalformedMetadata { .. })
        ));
        assert_eq!(
            manager.registry().get("local").map(|d| d.version.to_string()),
            Some("1.1.0".to_string())
        );
    }

    #[test]
    fn test_reload_builtin() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        manager.register_builtins();
        assert!(manager.reload("gemini").is_ok());
        assert!(manager.registry().contains("gemini"));
    }

    #[test]
    fn test_register_runtime_descriptor() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        assert!(manager.register(descriptor("mock")).is_ok());
        assert!(matches!(
            manager.register(descriptor("mock")),
            Err(PluginLoadError::Duplicate { .. })
        ));
        assert!(matches!(
            manager.register(descriptor("half").with_capabilities(vec![Capability::Describe])),
            Err(PluginLoadError::MissingCapability { .. })
        ));
    }

    #[test]
    fn test_create_provider_applies_overrides() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        manager.register_builtins();

        let mut overrides = HashMap::new();
        overrides.insert("max_tokens".to_string(), Value::from(64));
        overrides.insert("model".to_string(), Value::from("llama3-8b-8192"));
        manager.settings().set_overrides("groq", overrides).unwrap();

        let provider = manager
            .create_provider("groq", ProviderConfig::new("Groq").with_api_key("k"))
            .unwrap();
        assert_eq!(provider.config().max_tokens, 64);
        assert_eq!(provider.config().model, "llama3-8b-8192");

        assert!(matches!(
            manager.create_provider("nope", ProviderConfig::new("x")),
            Err(PluginLoadError::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_plugins_sorted() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        manager.register_builtins();

        let names: Vec<String> = manager.list_plugins().into_iter().map(|p| p.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), BUILTIN_PRESETS.len());
    }
}
