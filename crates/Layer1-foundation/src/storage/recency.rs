//! RecencyTracker - 최근 제공된 메시지 FIFO
//!
//! 파일 형식: `{"last": [string, ...]}`. 캐시 경로에서 같은 메시지가
//! 연달아 나오지 않도록 하는 약한 선호도일 뿐, 보장은 아니다.

use super::json::JsonFile;
use super::keep_last;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 기본 보관 개수
pub const DEFAULT_LAST_LIMIT: usize = 3;

/// 기본 파일명
pub const LAST_MESSAGES_FILE: &str = "last_messages.json";

/// 파일 구조
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RecencyFile {
    #[serde(default)]
    last: Vec<String>,
}

/// 최근 제공 메시지 추적기
#[derive(Debug, Clone)]
pub struct RecencyTracker {
    file: JsonFile,
    limit: usize,
}

impl RecencyTracker {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            file: JsonFile::new(path),
            limit: limit.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 최근 메시지 로드 (오래된 것 → 최신)
    pub fn load(&self) -> Vec<String> {
        match self.file.load_optional::<RecencyFile>() {
            Ok(Some(file)) => file.last,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Recency file unreadable, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// 마지막 `limit` 개만 남기고 저장
    pub fn save(&self, messages: &[String]) -> Result<()> {
        let file = RecencyFile {
            last: keep_last(messages, self.limit).to_vec(),
        };
        self.file.save_compact(&file)?;
        debug!("Saved {} recent messages", file.last.len());
        Ok(())
    }

    /// 방금 제공한 메시지를 기록
    pub fn record(&self, message: impl Into<String>) -> Result<Vec<String>> {
        let mut recent = self.load();
        recent.push(message.into());
        self.save(&recent)?;
        Ok(keep_last(&recent, self.limit).to_vec())
    }
}
