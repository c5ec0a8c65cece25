//! JSON 파일 저장소
//!
//! 단일 JSON 파일에 대한 load / save. 파일 잠금은 하지 않는다
//! (read-modify-write 는 호출자 책임).

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

/// 경로 하나에 묶인 JSON 파일
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 파일 존재 여부
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Storage(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }
        Ok(())
    }

    /// JSON 로드
    pub fn load<T: DeserializeOwned>(&self) -> Result<T> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::Storage(format!("Failed to read {}: {}", self.path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Storage(format!("Failed to parse {}: {}", self.path.display(), e)))
    }

    /// JSON 로드 (Optional) - 파일이 없으면 None
    pub fn load_optional<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        if !self.exists() {
            return Ok(None);
        }
        self.load().map(Some)
    }

    /// JSON 저장 (pretty-print)
    pub fn save<T: Serialize>(&self, data: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| Error::Storage(format!("Failed to serialize: {}", e)))?;
        self.write(content)
    }

    /// JSON 저장 (한 줄)
    pub fn save_compact<T: Serialize>(&self, data: &T) -> Result<()> {
        let content = serde_json::to_string(data)
            .map_err(|e| Error::Storage(format!("Failed to serialize: {}", e)))?;
        self.write(content)
    }

    fn write(&self, content: String) -> Result<()> {
        self.ensure_parent()?;
        std::fs::write(&self.path, content)
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", self.path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::new(dir.path().join("absent.json"));

        assert!(!file.exists());
        assert!(file.load_optional::<Vec<String>>().unwrap().is_none());
        assert!(file.load::<Vec<String>>().is_err());
    }

    #[test]
    fn test_save_creates_parent_and_pretty_prints() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::new(dir.path().join("nested/data.json"));

        let mut map = HashMap::new();
        map.insert("key".to_string(), vec!["a".to_string()]);
        file.save(&map).unwrap();

        let raw = std::fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains('\n'));

        let loaded: HashMap<String, Vec<String>> = file.load().unwrap();
        assert_eq!(loaded, map);
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonFile::new(&path).load::<Vec<String>>().unwrap_err();
        assert!(err.is_storage());
    }
}
