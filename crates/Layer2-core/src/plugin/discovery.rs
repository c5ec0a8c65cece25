//! Plugin Discovery - 플러그인 unit 발견
//!
//! 플러그인 디렉토리 한 곳을 스캔합니다.
//!
//! ```text
//! plugins/custom/
//! ├── local-llm.json        # 파일 unit (manifest)
//! ├── my-vendor/            # 디렉토리 unit
//! │   ├── plugin.json       # (선택)
//! │   └── provider          # 실행 파일
//! └── _disabled.json        # `_` / `.` 로 시작하면 무시
//! ```

use super::manifest::{DEFAULT_COMMAND, MANIFEST_FILE};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// ============================================================================
// DiscoveredUnit - 발견된 unit
// ============================================================================

/// unit 형태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitLayout {
    /// `<name>.json`
    File,
    /// `<name>/`
    Directory,
}

/// 발견된 플러그인 unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredUnit {
    /// unit 이름 (파일 stem 또는 디렉토리 이름) - 레지스트리 키
    pub name: String,

    pub layout: UnitLayout,

    /// manifest 파일 또는 디렉토리 경로
    pub path: PathBuf,

    /// 디렉토리 unit 에 plugin.json 이 있는지
    pub has_manifest: bool,
}

impl DiscoveredUnit {
    /// 디렉토리 unit 의 manifest 경로
    pub fn manifest_path(&self) -> PathBuf {
        match self.layout {
            UnitLayout::File => self.path.clone(),
            UnitLayout::Directory => self.path.join(MANIFEST_FILE),
        }
    }
}

// ============================================================================
// PluginDiscovery - 발견 시스템
// ============================================================================

/// 플러그인 디렉토리 스캐너
#[derive(Debug, Clone)]
pub struct PluginDiscovery {
    directory: PathBuf,
}

impl PluginDiscovery {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// 모든 unit 발견 (이름 순)
    ///
    /// 디렉토리가 없으면 경고 후 빈 목록. 읽을 수 없는 항목은 건너뛴다.
    pub fn discover(&self) -> Vec<DiscoveredUnit> {
        if !self.directory.is_dir() {
            warn!(
                "Plugin directory does not exist: {}",
                self.directory.display()
            );
            return Vec::new();
        }

        let entries = match std::fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Failed to read plugin directory {}: {}",
                    self.directory.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut units: Vec<DiscoveredUnit> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Self::analyze(&entry.path()),
                Err(e) => {
                    debug!("Skipping unreadable plugin entry: {}", e);
                    None
                }
            })
            .collect();
        units.sort_by(|a, b| a.name.cmp(&b.name));

        info!("Discovered {} plugins", units.len());
        units
    }

    /// 이름으로 unit 찾기
    pub fn find(&self, name: &str) -> Option<DiscoveredUnit> {
        let file = self.directory.join(format!("{}.json", name));
        if let Some(unit) = Self::analyze(&file) {
            return Some(unit);
        }
        Self::analyze(&self.directory.join(name))
    }

    fn analyze(path: &Path) -> Option<DiscoveredUnit> {
        let file_name = path.file_name()?.to_str()?;
        if file_name.starts_with('_') || file_name.starts_with('.') {
            return None;
        }

        if path.is_file() {
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                return None;
            }
            let name = path.file_stem()?.to_str()?.to_string();
            return Some(DiscoveredUnit {
                name,
                layout: UnitLayout::File,
                path: path.to_path_buf(),
                has_manifest: true,
            });
        }

        if path.is_dir() {
            let has_manifest = path.join(MANIFEST_FILE).is_file();
            let has_command = path.join(DEFAULT_COMMAND).is_file();
            if !has_manifest && !has_command {
                debug!("Skipping {}: no {} or {}", path.display(), MANIFEST_FILE, DEFAULT_COMMAND);
                return None;
            }
            return Some(DiscoveredUnit {
                name: file_name.to_string(),
                layout: UnitLayout::Directory,
                path: path.to_path_buf(),
                has_manifest,
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        std::fs::write(root.join("local.json"), "{}").unwrap();
        std::fs::write(root.join("_hidden.json"), "{}").unwrap();
        std::fs::write(root.join(".dot.json"), "{}").unwrap();
        std::fs::write(root.join("notes.txt"), "ignored").unwrap();

        std::fs::create_dir(root.join("scripted")).unwrap();
        std::fs::write(root.join("scripted").join(DEFAULT_COMMAND), "#!/bin/sh").unwrap();

        std::fs::create_dir(root.join("described")).unwrap();
        std::fs::write(root.join("described").join(MANIFEST_FILE), "{}").unwrap();

        std::fs::create_dir(root.join("empty")).unwrap();
        dir
    }

    #[test]
    fn test_discover_units() {
        let dir = setup();
        let units = PluginDiscovery::new(dir.path()).discover();

        let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["described", "local", "scripted"]);

        let local = &units[1];
        assert_eq!(local.layout, UnitLayout::File);
        assert_eq!(local.manifest_path(), dir.path().join("local.json"));

        assert!(units[0].has_manifest);
        assert!(!units[2].has_manifest);
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let discovery = PluginDiscovery::new(dir.path().join("absent"));
        assert!(discovery.discover().is_empty());
    }

    #[test]
    fn test_find() {
        let dir = setup();
        let discovery = PluginDiscovery::new(dir.path());
        assert_eq!(discovery.find("local").map(|u| u.layout), Some(UnitLayout::File));
        assert_eq!(
            discovery.find("scripted").map(|u| u.layout),
            Some(UnitLayout::Directory)
        );
        assert!(discovery.find("_hidden").is_none());
        assert!(discovery.find("empty").is_none());
    }
}
