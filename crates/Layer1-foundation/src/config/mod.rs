//! Config - 통합 설정 관리
//!
//! - `ticker.rs` - TickerConfig (환경 변수 기반)
//! - `prompts.rs` - Prompt profile 파일

mod prompts;
mod ticker;

pub use prompts::{
    PromptPair, PromptProfiles, DEFAULT_PROFILE, DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT,
    PROMPTS_FILE,
};
pub use ticker::*;
