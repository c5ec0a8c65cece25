//! Plugin Settings - 활성/비활성 목록 영속화
//!
//! plugin_config.json 을 통해 enable/disable 목록과 플러그인별 설정을 관리합니다.
//!
//! ```json
//! {
//!   "enabled_plugins": [],
//!   "disabled_plugins": [],
//!   "plugin_settings": { "groq": { "max_tokens": 256 } },
//!   "auto_discovery": true,
//!   "validate_on_load": true
//! }
//! ```

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use ticker_foundation::{JsonFile, Result};
use tracing::{debug, info, warn};

// ============================================================================
// PluginSettings - 파일 구조
// ============================================================================

/// plugin_config.json 파일 구조
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSettings {
    #[serde(default)]
    pub enabled_plugins: Vec<String>,

    #[serde(default)]
    pub disabled_plugins: Vec<String>,

    /// 플러그인별 ProviderConfig override
    #[serde(default)]
    pub plugin_settings: HashMap<String, HashMap<String, Value>>,

    #[serde(default = "default_true")]
    pub auto_discovery: bool,

    #[serde(default = "default_true")]
    pub validate_on_load: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            enabled_plugins: Vec::new(),
            disabled_plugins: Vec::new(),
            plugin_settings: HashMap::new(),
            auto_discovery: true,
            validate_on_load: true,
        }
    }
}

impl PluginSettings {
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled_plugins.iter().any(|n| n == name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled_plugins.iter().any(|n| n == name)
    }

    /// 플러그인별 override (없으면 빈 맵)
    pub fn overrides(&self, name: &str) -> HashMap<String, Value> {
        self.plugin_settings.get(name).cloned().unwrap_or_default()
    }

    fn enable(&mut self, name: &str) {
        if !self.is_enabled(name) {
            self.enabled_plugins.push(name.to_string());
        }
        self.disabled_plugins.retain(|n| n != name);
    }

    fn disable(&mut self, name: &str) {
        if !self.is_disabled(name) {
            self.disabled_plugins.push(name.to_string());
        }
        self.enabled_plugins.retain(|n| n != name);
    }
}

// ============================================================================
// PluginSettingsStore - 파일 관리
// ============================================================================

/// 설정 파일 + 메모리 사본
pub struct PluginSettingsStore {
    file: JsonFile,
    settings: RwLock<PluginSettings>,
}

impl PluginSettingsStore {
    /// 파일을 열거나 없으면 기본값으로 생성
    ///
    /// 파일이 손상되었으면 기본값을 사용하고 파일은 덮어쓰지 않는다.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let file = JsonFile::new(path);

        let settings = match file.load_optional::<PluginSettings>() {
            Ok(Some(settings)) => {
                debug!("Loaded plugin settings from {}", file.path().display());
                settings
            }
            Ok(None) => {
                let settings = PluginSettings::default();
                match file.save(&settings) {
                    Ok(()) => info!("Created plugin settings at {}", file.path().display()),
                    Err(e) => warn!("Failed to create plugin settings: {}", e),
                }
                settings
            }
            Err(e) => {
                warn!("Failed to load plugin settings, using defaults: {}", e);
                PluginSettings::default()
            }
        };

        Self {
            file,
            settings: RwLock::new(settings),
        }
    }

    /// 파일 없이 메모리에서만 사용
    pub fn in_memory(settings: PluginSettings) -> Self {
        Self {
            file: JsonFile::new(PathBuf::new()),
            settings: RwLock::new(settings),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// 현재 설정 복사본
    pub fn snapshot(&self) -> PluginSettings {
        self.settings.read().clone()
    }

    pub fn auto_discovery(&self) -> bool {
        self.settings.read().auto_discovery
    }

    pub fn validate_on_load(&self) -> bool {
        self.settings.read().validate_on_load
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.settings.read().is_disabled(name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.settings.read().is_enabled(name)
    }

    pub fn overrides(&self, name: &str) -> HashMap<String, Value> {
        self.settings.read().overrides(name)
    }

    /// enabled 에 추가, disabled 에서 제거 후 저장
    pub fn enable(&self, name: &str) -> Result<()> {
        self.update(|s| s.enable(name))
    }

    /// disabled 에 추가, enabled 에서 제거 후 저장
    pub fn disable(&self, name: &str) -> Result<()> {
        self.update(|s| s.disable(name))
    }

    /// 플러그인별 override 설정 후 저장
    pub fn set_overrides(&self, name: &str, overrides: HashMap<String, Value>) -> Result<()> {
        self.update(|s| {
            s.plugin_settings.insert(name.to_string(), overrides);
        })
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut PluginSettings),
    {
        let snapshot = {
            let mut settings = self.settings.write();
            f(&mut settings);
            settings.clone()
        };
        self.persist(&snapshot)
    }

    fn persist(&self, settings: &PluginSettings) -> Result<()> {
        if self.file.path().as_os_str().is_empty() {
            return Ok(());
        }
        self.file.save(settings)
    }
}
