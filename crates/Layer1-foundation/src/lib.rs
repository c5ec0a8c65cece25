//! # ticker-foundation
//!
//! Foundation layer for Ticker:
//! - Error: 중앙 에러 타입 (Error, Result)
//! - Config: TickerConfig (환경 변수), Prompt profile
//! - Storage: JsonFile, MessageStore, RecencyTracker
//! - Similarity: fuzzy 유사도 (0–100)
//! - Logging: tracing subscriber 초기화
//!
//! ## 아키텍처
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Orchestrator (ticker-core)                  │
//! │        │                 │                   │
//! │        ▼                 ▼                   │
//! │  MessageStore     RecencyTracker             │
//! │  (message_cache)  (last_messages)            │
//! │        │                 │                   │
//! │        └──── JsonFile ───┘                   │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod similarity;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{PromptPair, PromptProfiles, TickerConfig};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{JsonFile, MessageStore, RecencyTracker};

// ============================================================================
// Logging
// ============================================================================
pub use logging::init_tracing;
