//! # ticker-provider
//!
//! Message provider abstraction layer for Ticker.
//! Every backend implements one [`Provider`] trait.
//!
//! ## Features
//! - One OpenAI-compatible HTTP transport shared by the chat-completions vendors
//! - A dedicated transport for the You.com Smart API
//! - Subprocess providers for runtime-loaded plugins
//! - Failures are logged and surfaced only as an absent response

pub mod config;
pub mod error;
pub mod presets;
pub mod providers;
pub mod r#trait;

// Core traits and types
pub use config::ProviderConfig;
pub use r#trait::{Provider, ProviderInfo, ProviderResponse, TokenUsage};

// Error
pub use error::ProviderError;

// Built-in vendors
pub use presets::{preset, VendorPreset, WireFormat, BUILTIN_PRESETS};

// Provider implementations
pub use providers::openai_compat::OpenAiCompatProvider;
pub use providers::process::ProcessProvider;
pub use providers::youcom::YouComProvider;
