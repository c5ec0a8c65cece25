//! Storage module for Ticker
//!
//! - `json`: 단일 JSON 파일 load/save
//! - `message`: MessageStore (생성된 메시지, 크기 제한)
//! - `recency`: RecencyTracker (최근 제공된 메시지)
//!
//! 두 저장소 모두 호출마다 새로 읽고, 변경 후 다시 쓴다.
//! 프로세스 간 잠금은 없으므로 동시 writer 는 서로의 갱신을 덮어쓸 수 있다.

mod json;
mod message;
mod recency;

// JSON Storage (범용)
pub use json::JsonFile;

pub use message::{MessageStore, DEFAULT_MAX_CACHE_SIZE, MESSAGE_CACHE_FILE};
pub use recency::{RecencyTracker, DEFAULT_LAST_LIMIT, LAST_MESSAGES_FILE};

/// 마지막 n 개 (keep-last-N)
pub(crate) fn keep_last<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::keep_last;

    #[test]
    fn test_keep_last() {
        assert_eq!(keep_last(&[1, 2, 3, 4], 2), &[3, 4]);
        assert_eq!(keep_last(&[1, 2], 5), &[1, 2]);
        assert!(keep_last::<i32>(&[], 3).is_empty());
    }
}
