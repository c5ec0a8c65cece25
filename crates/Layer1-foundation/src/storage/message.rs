//! MessageStore - 지금까지 생성된 메시지의 영속 목록
//!
//! - 파일 형식: pretty-print 된 JSON 문자열 배열
//! - 저장 시 마지막 `max_size` 개만 유지 (가장 오래된 것부터 제거)
//! - 읽기 실패/손상 파일은 빈 목록으로 취급

use super::json::JsonFile;
use super::keep_last;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 기본 최대 보관 개수
pub const DEFAULT_MAX_CACHE_SIZE: usize = 200;

/// 기본 파일명
pub const MESSAGE_CACHE_FILE: &str = "message_cache.json";

/// 크기 제한이 있는 메시지 저장소
#[derive(Debug, Clone)]
pub struct MessageStore {
    file: JsonFile,
    max_size: usize,
}

impl MessageStore {
    pub fn new(path: impl Into<PathBuf>, max_size: usize) -> Self {
        Self {
            file: JsonFile::new(path),
            max_size: max_size.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// 저장된 메시지 로드 (삽입 순서)
    pub fn load(&self) -> Vec<String> {
        match self.file.load_optional::<Vec<String>>() {
            Ok(Some(messages)) => messages,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Message store unreadable, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// 마지막 `max_size` 개만 남기고 저장
    pub fn save(&self, messages: &[String]) -> Result<()> {
        let kept = keep_last(messages, self.max_size);
        self.file.save(&kept)?;
        debug!("Saved {} messages to {}", kept.len(), self.path().display());
        Ok(())
    }

    /// 새 메시지를 추가하고 저장된 목록을 반환
    pub fn append(&self, message: impl Into<String>) -> Result<Vec<String>> {
        let mut messages = self.load();
        messages.push(message.into());
        self.save(&messages)?;
        Ok(keep_last(&messages, self.max_size).to_vec())
    }

    /// 현재 저장된 개수
    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
