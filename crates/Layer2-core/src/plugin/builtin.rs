//! Built-in plugins
//!
//! 내장 vendor 마다 하나의 디스크립터를 만든다. 프로세스 시작 시
//! `PluginManager::register_builtins` 가 등록한다.

use super::descriptor::{PluginDescriptor, PluginSource, META_API_KEY_ENV, META_DISPLAY_NAME};
use ticker_provider::{
    OpenAiCompatProvider, Provider, VendorPreset, WireFormat, YouComProvider, BUILTIN_PRESETS,
};

/// 내장 플러그인 작성자
pub const BUILTIN_AUTHOR: &str = "Ticker";

/// preset 하나에 대한 디스크립터
pub fn descriptor(preset: &'static VendorPreset) -> PluginDescriptor {
    PluginDescriptor::new(preset.key, move |config| -> Box<dyn Provider> {
        match preset.wire_format {
            WireFormat::ChatCompletions => {
                Box::new(OpenAiCompatProvider::from_preset(preset, config))
            }
            WireFormat::YouSmart => Box::new(YouComProvider::from_preset(preset, config)),
        }
    })
    .with_author(BUILTIN_AUTHOR)
    .with_description(preset.description)
    .with_source(PluginSource::Builtin)
    .with_metadata(META_DISPLAY_NAME, preset.display_name)
    .with_metadata(META_API_KEY_ENV, preset.api_key_env.join(","))
}

/// 모든 내장 디스크립터 (등록 순서)
pub fn descriptors() -> Vec<PluginDescriptor> {
    BUILTIN_PRESETS.iter().map(descriptor).collect()
}
