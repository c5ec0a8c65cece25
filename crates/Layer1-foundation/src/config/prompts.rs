//! Prompt profiles
//!
//! `prompts.json`: `{ "<profile>": { "system": "...", "user": "..." } }`

use crate::storage::JsonFile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// 기본 파일명
pub const PROMPTS_FILE: &str = "prompts.json";

/// 기본 프로필 이름
pub const DEFAULT_PROFILE: &str = "default";

/// 기본 system prompt
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant. Provide a short, interesting, or thought-provoking statement about AI, technology, or the future.";

/// 기본 user prompt
pub const DEFAULT_USER_PROMPT: &str = "Tell me something about AI.";

/// system / user prompt 쌍
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

impl Default for PromptPair {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT)
    }
}

/// 프로필 파일 내용
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptProfiles {
    profiles: HashMap<String, PromptPair>,
}

impl PromptProfiles {
    /// 파일에서 로드. 없거나 손상되면 빈 프로필 집합
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let file = JsonFile::new(path);
        match file.load_optional::<PromptProfiles>() {
            Ok(Some(profiles)) => profiles,
            Ok(None) => {
                debug!("Prompt file {} not found, using defaults", file.path().display());
                Self::default()
            }
            Err(e) => {
                warn!("Failed to load prompt profiles: {}", e);
                Self::default()
            }
        }
    }

    pub fn get(&self, profile: &str) -> Option<&PromptPair> {
        self.profiles.get(profile)
    }

    pub fn insert(&mut self, profile: impl Into<String>, prompts: PromptPair) {
        self.profiles.insert(profile.into(), prompts);
    }

    /// 프로필 조회, 없으면 기본값
    pub fn resolve(&self, profile: &str) -> PromptPair {
        match self.get(profile) {
            Some(prompts) => prompts.clone(),
            None => {
                if !self.profiles.is_empty() {
                    warn!("Prompt profile '{}' not found, using defaults", profile);
                }
                PromptPair::default()
            }
        }
    }
}
