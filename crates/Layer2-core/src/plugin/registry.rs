//! Plugin Registry - 플러그인 저장소
//!
//! 이름 → `PluginDescriptor` 맵. 모든 읽기/쓰기는 하나의 mutex 아래에서
//! 수행된다. 같은 이름의 두 번째 등록은 거부된다 (먼저 등록된 쪽이 남음).

use super::descriptor::{Capability, PluginDescriptor};
use super::error::PluginLoadError;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// 플러그인 레지스트리
pub struct PluginRegistry {
    plugins: Mutex<HashMap<String, PluginDescriptor>>,
}

impl PluginRegistry {
    /// 새 레지스트리 생성
    pub fn new() -> Self {
        Self {
            plugins: Mutex::new(HashMap::new()),
        }
    }

    /// 플러그인 등록 - 이미 있으면 false (기존 항목 유지)
    pub fn register(&self, name: impl Into<String>, descriptor: PluginDescriptor) -> bool {
        let name = name.into();
        let mut plugins = self.plugins.lock();

        if plugins.contains_key(&name) {
            warn!("Plugin {} is already registered", name);
            return false;
        }

        info!("Registered plugin: {} (v{})", name, descriptor.version);
        plugins.insert(name, descriptor);
        true
    }

    /// 플러그인 등록 해제
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.plugins.lock().remove(name).is_some();
        if removed {
            info!("Unregistered plugin: {}", name);
        }
        removed
    }

    /// 플러그인 조회
    pub fn get(&self, name: &str) -> Option<PluginDescriptor> {
        self.plugins.lock().get(name).cloned()
    }

    /// 플러그인 존재 여부
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.lock().contains_key(name)
    }

    /// 전체 복사본 (반복 중 변경이 보이지 않음)
    pub fn list_all(&self) -> HashMap<String, PluginDescriptor> {
        self.plugins.lock().clone()
    }

    /// 등록된 이름 (정렬)
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.plugins.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.lock().is_empty()
    }

    /// 전체 제거
    pub fn clear(&self) {
        self.plugins.lock().clear();
        debug!("Plugin registry cleared");
    }

    /// 한 번의 lock 안에서 교체 (없으면 추가). 이전 항목을 반환
    ///
    /// reload 는 이 경로만 사용하므로 중간에 "없음" 상태가 관측되지 않는다.
    pub fn replace(
        &self,
        name: impl Into<String>,
        descriptor: PluginDescriptor,
    ) -> Option<PluginDescriptor> {
        let name = name.into();
        let mut plugins = self.plugins.lock();
        let version = descriptor.version;
        let previous = plugins.insert(name.clone(), descriptor);
        info!("Replaced plugin: {} (v{})", name, version);
        previous
    }

    /// 메타데이터 값으로 검색
    pub fn find_by_metadata(&self, key: &str, value: &str) -> Vec<String> {
        let mut found: Vec<String> = self
            .plugins
            .lock()
            .iter()
            .filter(|(_, d)| d.metadata.get(key).map(String::as_str) == Some(value))
            .map(|(name, _)| name.clone())
            .collect();
        found.sort();
        found
    }

    /// 디스크립터 검증 (사유 포함)
    ///
    /// 네 가지 capability 와 {name, version, author, description} 이 모두 있어야 한다.
    pub fn check(&self, descriptor: &PluginDescriptor) -> Result<(), PluginLoadError> {
        let unit = descriptor.name.clone();

        let missing = descriptor.missing_capabilities();
        if !missing.is_empty() {
            return Err(PluginLoadError::MissingCapability { unit, missing });
        }

        let mut absent = Vec::new();
        if descriptor.name.trim().is_empty() {
            absent.push("name");
        }
        if descriptor.author.trim().is_empty() {
            absent.push("author");
        }
        if descriptor.description.trim().is_empty() {
            absent.push("description");
        }
        if !absent.is_empty() {
            return Err(PluginLoadError::malformed(
                unit,
                format!("missing metadata: {}", absent.join(", ")),
            ));
        }

        Ok(())
    }

    /// 디스크립터 검증
    pub fn validate(&self, descriptor: &PluginDescriptor) -> bool {
        match self.check(descriptor) {
            Ok(()) => true,
            Err(e) => {
                debug!("Plugin validation failed: {}", e);
                false
            }
        }
    }

    /// 특정 capability 를 선언한 플러그인 이름
    pub fn with_capability(&self, capability: Capability) -> Vec<String> {
        let mut found: Vec<String> = self
            .plugins
            .lock()
            .iter()
            .filter(|(_, d)| d.required_capabilities.contains(&capability))
            .map(|(name, _)| name.clone())
            .collect();
        found.sort();
        found
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
