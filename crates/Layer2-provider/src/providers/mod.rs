//! Provider implementations
//!
//! - `openai_compat`: HTTP chat-completions transport (most built-in vendors)
//! - `process`: subprocess boundary for runtime-loaded plugins
//! - `youcom`: You.com Smart API

pub mod openai_compat;
pub mod process;
pub mod youcom;

pub use openai_compat::OpenAiCompatProvider;
pub use process::ProcessProvider;
pub use youcom::YouComProvider;
