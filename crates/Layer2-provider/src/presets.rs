//! Built-in vendor presets
//!
//! Most built-in backends speak the chat-completions wire format, so a
//! preset is just endpoint defaults plus metadata for the shared
//! [`OpenAiCompatProvider`](crate::providers::OpenAiCompatProvider).
//! You.com uses its own Smart API and gets [`YouComProvider`](crate::providers::YouComProvider).

/// Request/response format spoken by a vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// `POST {base}/chat/completions`, bearer auth
    ChatCompletions,
    /// `POST {base}/smart`, `X-API-Key` auth
    YouSmart,
}

/// Defaults for one built-in vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorPreset {
    /// Plugin key (e.g. "openrouter")
    pub key: &'static str,

    /// Provider name reported by instances (e.g. "OpenRouter")
    pub display_name: &'static str,

    /// Environment variables holding the API key, first match wins
    pub api_key_env: &'static [&'static str],

    pub base_url: &'static str,
    pub default_model: &'static str,
    pub supported_models: &'static [&'static str],
    pub description: &'static str,
    pub wire_format: WireFormat,
}

impl VendorPreset {
    pub fn supported_models(&self) -> Vec<String> {
        self.supported_models.iter().map(|m| m.to_string()).collect()
    }
}

pub const OPENROUTER: VendorPreset = VendorPreset {
    key: "openrouter",
    display_name: "OpenRouter",
    api_key_env: &["OPENROUTER_API_KEY"],
    base_url: "https://openrouter.ai/api/v1",
    default_model: "openai/gpt-4o",
    supported_models: &[
        "openai/gpt-4o",
        "openai/gpt-4o-mini",
        "openai/gpt-4-turbo",
        "anthropic/claude-3.5-sonnet",
        "anthropic/claude-3-opus",
        "anthropic/claude-3-haiku",
        "meta-llama/llama-3.1-405b-instruct",
        "meta-llama/llama-3.1-70b-instruct",
        "meta-llama/llama-3.1-8b-instruct",
        "google/gemini-pro-1.5",
        "cohere/command-r-plus",
        "mistralai/mistral-large",
    ],
    description: "OpenRouter unified API for many hosted models",
    wire_format: WireFormat::ChatCompletions,
};

pub const TOGETHER: VendorPreset = VendorPreset {
    key: "together",
    display_name: "Together AI",
    api_key_env: &["TOGETHER_API_KEY"],
    base_url: "https://api.together.xyz/v1",
    default_model: "meta-llama/Llama-3.1-70B-Instruct-Turbo",
    supported_models: &[
        "meta-llama/Llama-3.1-405B-Instruct-Turbo",
        "meta-llama/Llama-3.1-70B-Instruct-Turbo",
        "meta-llama/Llama-3.1-8B-Instruct-Turbo",
        "meta-llama/Llama-3-70b-chat-hf",
        "meta-llama/Llama-3-8b-chat-hf",
        "mistralai/Mixtral-8x7B-Instruct-v0.1",
        "mistralai/Mixtral-8x22B-Instruct-v0.1",
        "mistralai/Mistral-7B-Instruct-v0.3",
        "Qwen/Qwen2-72B-Instruct",
    ],
    description: "Together AI hosted open models",
    wire_format: WireFormat::ChatCompletions,
};

pub const DEEPINFRA: VendorPreset = VendorPreset {
    key: "deepinfra",
    display_name: "DeepInfra",
    api_key_env: &["DEEPINFRA_API_KEY"],
    base_url: "https://api.deepinfra.com/v1/openai",
    default_model: "meta-llama/Meta-Llama-3.1-70B-Instruct",
    supported_models: &[
        "meta-llama/Meta-Llama-3.1-405B-Instruct",
        "meta-llama/Meta-Llama-3.1-70B-Instruct",
        "meta-llama/Meta-Llama-3.1-8B-Instruct",
        "mistralai/Mixtral-8x7B-Instruct-v0.1",
        "mistralai/Mistral-7B-Instruct-v0.3",
        "microsoft/WizardLM-2-8x22B",
        "Qwen/Qwen2-72B-Instruct",
        "google/gemma-1.1-7b-it",
    ],
    description: "DeepInfra OpenAI-compatible inference",
    wire_format: WireFormat::ChatCompletions,
};

pub const GROQ: VendorPreset = VendorPreset {
    key: "groq",
    display_name: "Groq",
    api_key_env: &["GROQ_API_KEY"],
    base_url: "https://api.groq.com/openai/v1",
    default_model: "llama-3.1-70b-versatile",
    supported_models: &[
        "llama-3.1-405b-reasoning",
        "llama-3.1-70b-versatile",
        "llama-3.1-8b-instant",
        "llama3-70b-8192",
        "llama3-8b-8192",
        "mixtral-8x7b-32768",
        "gemma2-9b-it",
        "gemma-7b-it",
    ],
    description: "Groq low-latency inference",
    wire_format: WireFormat::ChatCompletions,
};

pub const MISTRAL: VendorPreset = VendorPreset {
    key: "mistral",
    display_name: "Mistral AI",
    api_key_env: &["MISTRAL_API_KEY"],
    base_url: "https://api.mistral.ai/v1",
    default_model: "mistral-large-latest",
    supported_models: &[
        "mistral-large-latest",
        "mistral-large-2407",
        "mistral-medium-latest",
        "mistral-small-latest",
        "mistral-small-2409",
        "codestral-latest",
        "open-mistral-7b",
        "open-mixtral-8x7b",
        "open-mixtral-8x22b",
    ],
    description: "Mistral AI platform",
    wire_format: WireFormat::ChatCompletions,
};

pub const ANTHROPIC: VendorPreset = VendorPreset {
    key: "anthropic",
    display_name: "Anthropic",
    api_key_env: &["ANTHROPIC_API_KEY"],
    base_url: "https://api.anthropic.com/v1",
    default_model: "claude-3-5-sonnet-20241022",
    supported_models: &[
        "claude-3-5-sonnet-20241022",
        "claude-3-5-haiku-20241022",
        "claude-3-opus-20240229",
        "claude-3-sonnet-20240229",
        "claude-3-haiku-20240307",
    ],
    description: "Anthropic Claude via the OpenAI-compatible endpoint",
    wire_format: WireFormat::ChatCompletions,
};

pub const GEMINI: VendorPreset = VendorPreset {
    key: "gemini",
    display_name: "Google Gemini",
    api_key_env: &["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"],
    base_url: "https://generativelanguage.googleapis.com/v1beta/openai",
    default_model: "gemini-1.5-pro",
    supported_models: &[
        "gemini-1.5-pro",
        "gemini-1.5-pro-latest",
        "gemini-1.5-flash",
        "gemini-1.5-flash-latest",
        "gemini-1.0-pro",
    ],
    description: "Google Gemini via the OpenAI-compatible endpoint",
    wire_format: WireFormat::ChatCompletions,
};

pub const YOUCOM: VendorPreset = VendorPreset {
    key: "youcom",
    display_name: "You.com",
    api_key_env: &["YOUCOM_API_KEY"],
    base_url: "https://chat-api.you.com",
    default_model: "smart",
    supported_models: &["smart", "research", "default"],
    description: "You.com Smart API with web-grounded answers",
    wire_format: WireFormat::YouSmart,
};

/// All built-in presets, in registration order
pub const BUILTIN_PRESETS: &[VendorPreset] = &[
    OPENROUTER, TOGETHER, DEEPINFRA, GROQ, MISTRAL, ANTHROPIC, GEMINI, YOUCOM,
];

/// Look up a preset by plugin key
pub fn preset(key: &str) -> Option<&'static VendorPreset> {
    BUILTIN_PRESETS.iter().find(|p| p.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_lookup() {
        assert_eq!(preset("groq").map(|p| p.display_name), Some("Groq"));
        assert!(preset("unknown").is_none());
        assert_eq!(preset("youcom").map(|p| p.wire_format), Some(WireFormat::YouSmart));
        assert_eq!(preset("groq").map(|p| p.wire_format), Some(WireFormat::ChatCompletions));
    }

    #[test]
    fn test_presets_are_consistent() {
        for p in BUILTIN_PRESETS {
            assert!(p.base_url.starts_with("https://"), "{}", p.key);
            assert!(p.supported_models.contains(&p.default_model), "{}", p.key);
            assert!(!p.api_key_env.is_empty(), "{}", p.key);
        }
    }
}
