//! Plugin Loader - 발견된 unit 을 `PluginDescriptor` 로 변환
//!
//! 외부 코드는 프로세스 안에서 실행하지 않는다. unit 은
//! - chat-completions 호환 endpoint 설정 (`openai_compatible`), 또는
//! - 별도 실행 파일 (`process`)
//!
//! 중 하나로 Provider 를 제공한다.

use super::descriptor::{PluginDescriptor, PluginSource, META_API_KEY_ENV, META_DISPLAY_NAME};
use super::discovery::{DiscoveredUnit, UnitLayout};
use super::error::PluginLoadError;
use super::manifest::{PluginManifest, UnitKind, DEFAULT_COMMAND};
use std::path::{Path, PathBuf};
use ticker_provider::{OpenAiCompatProvider, ProcessProvider, ProviderConfig};
use tracing::debug;

/// 메타데이터 키: unit 종류
pub const META_KIND: &str = "kind";

/// process unit 이 모델을 지정하지 않았을 때 사용하는 모델 id
pub const DEFAULT_PROCESS_MODEL: &str = "default";

/// unit 하나를 디스크립터로 변환
pub fn resolve(unit: &DiscoveredUnit) -> Result<PluginDescriptor, PluginLoadError> {
    let manifest = read_manifest(unit)?;

    let version = manifest
        .parsed_version()
        .map_err(|reason| PluginLoadError::malformed(&unit.name, reason))?;
    let capabilities = manifest
        .capabilities()
        .map_err(|reason| PluginLoadError::malformed(&unit.name, reason))?;

    let kind = manifest.kind.unwrap_or(match unit.layout {
        UnitLayout::File => UnitKind::OpenaiCompatible,
        UnitLayout::Directory => UnitKind::Process,
    });

    let display_name = manifest
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&unit.name)
        .to_string();

    let descriptor = match kind {
        UnitKind::OpenaiCompatible => http_descriptor(unit, &manifest, &display_name)?,
        UnitKind::Process => process_descriptor(unit, &manifest, &display_name)?,
    };

    let mut descriptor = descriptor
        .with_version(version)
        .with_author(manifest.author_or_default())
        .with_description(manifest.description_or_default())
        .with_capabilities(capabilities)
        .with_source(source_of(unit))
        .with_metadata(META_DISPLAY_NAME, display_name)
        .with_metadata(
            META_KIND,
            match kind {
                UnitKind::OpenaiCompatible => "openai_compatible",
                UnitKind::Process => "process",
            },
        );

    let key_env = manifest.api_key_env();
    if !key_env.is_empty() {
        descriptor = descriptor.with_metadata(META_API_KEY_ENV, key_env.join(","));
    }

    debug!("Resolved plugin unit {} ({:?})", unit.name, unit.layout);
    Ok(descriptor)
}

/// unit 에서 로드된 디스크립터의 출처
pub fn source_of(unit: &DiscoveredUnit) -> PluginSource {
    match unit.layout {
        UnitLayout::File => PluginSource::File(unit.path.clone()),
        UnitLayout::Directory => PluginSource::Directory(unit.path.clone()),
    }
}

fn read_manifest(unit: &DiscoveredUnit) -> Result<PluginManifest, PluginLoadError> {
    if unit.layout == UnitLayout::Directory && !unit.has_manifest {
        return Ok(PluginManifest::default());
    }

    let path = unit.manifest_path();
    let raw = std::fs::read_to_string(&path).map_err(|e| PluginLoadError::Io {
        unit: unit.name.clone(),
        reason: format!("{}: {}", path.display(), e),
    })?;
    PluginManifest::from_json(&raw).map_err(|reason| PluginLoadError::malformed(&unit.name, reason))
}

/// unit 기준 디렉토리 (파일 unit 은 부모 디렉토리)
fn base_dir(unit: &DiscoveredUnit) -> PathBuf {
    match unit.layout {
        UnitLayout::Directory => unit.path.clone(),
        UnitLayout::File => unit
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    }
}

fn http_descriptor(
    unit: &DiscoveredUnit,
    manifest: &PluginManifest,
    display_name: &str,
) -> Result<PluginDescriptor, PluginLoadError> {
    let base_url = manifest
        .base_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| PluginLoadError::MissingImplementation {
            unit: unit.name.clone(),
            reason: "openai_compatible unit requires base_url".to_string(),
        })?
        .to_string();

    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(PluginLoadError::invalid(
            &unit.name,
            format!("base_url must start with http:// or https://, got '{}'", base_url),
        ));
    }

    let default_model = manifest.default_model.clone().unwrap_or_default();
    let supported_models = manifest.supported_models.clone();
    let keyless = manifest.api_key_env().is_empty();
    let display_name = display_name.to_string();

    Ok(PluginDescriptor::new(&unit.name, move |mut config: ProviderConfig| {
        if config.base_url.trim().is_empty() {
            config.base_url = base_url.clone();
        }
        if config.model.trim().is_empty() {
            config.model = default_model.clone();
        }

        let provider = OpenAiCompatProvider::new(config)
            .with_display_name(&display_name)
            .with_supported_models(supported_models.clone());
        if keyless {
            Box::new(provider.with_optional_api_key())
        } else {
            Box::new(provider)
        }
    }))
}

fn process_descriptor(
    unit: &DiscoveredUnit,
    manifest: &PluginManifest,
    display_name: &str,
) -> Result<PluginDescriptor, PluginLoadError> {
    let base = base_dir(unit);
    let command = resolve_command(unit, manifest, &base)?;

    let args = manifest.args.clone();
    let default_model = manifest
        .default_model
        .clone()
        .unwrap_or_else(|| DEFAULT_PROCESS_MODEL.to_string());
    let supported_models = manifest.supported_models.clone();
    let display_name = display_name.to_string();

    Ok(PluginDescriptor::new(&unit.name, move |mut config: ProviderConfig| {
        if config.model.trim().is_empty() {
            config.model = default_model.clone();
        }

        Box::new(
            ProcessProvider::new(config, &command)
                .with_args(args.clone())
                .with_working_dir(&base)
                .with_display_name(&display_name)
                .with_supported_models(supported_models.clone()),
        )
    }))
}

/// 실행 파일 결정
///
/// unit 디렉토리 안에 있으면 그 경로, 경로 구분자가 없는 이름이면 PATH 검색에 맡긴다.
fn resolve_command(
    unit: &DiscoveredUnit,
    manifest: &PluginManifest,
    base: &Path,
) -> Result<PathBuf, PluginLoadError> {
    let declared = manifest
        .command
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let name = declared.unwrap_or(DEFAULT_COMMAND);

    let local = base.join(name);
    if local.is_file() {
        return Ok(local);
    }

    let bare = Path::new(name).components().count() == 1;
    if declared.is_some() && bare {
        return Ok(PathBuf::from(name));
    }

    Err(PluginLoadError::MissingImplementation {
        unit: unit.name.clone(),
        reason: format!("executable not found: {}", local.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::descriptor::{Capability, PluginVersion, DEFAULT_AUTHOR, DEFAULT_DESCRIPTION};
    use crate::plugin::discovery::PluginDiscovery;
    use crate::plugin::manifest::MANIFEST_FILE;
    use tempfile::TempDir;

    fn unit(dir: &TempDir, name: &str) -> DiscoveredUnit {
        PluginDiscovery::new(dir.path()).find(name).expect("unit")
    }

    #[test]
    fn test_resolve_http_file_unit() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("local.json"),
            r#"{"name": "Local LLM", "version": "2.1.0", "author": "me",
                "base_url": "http://127.0.0.1:9/v1", "default_model": "llama"}"#,
        )
        .unwrap();

        let descriptor = resolve(&unit(&dir, "local")).unwrap();
        assert_eq!(descriptor.name, "local");
        assert_eq!(descriptor.version, PluginVersion::new(2, 1, 0));
        assert_eq!(descriptor.author, "me");
        assert_eq!(descriptor.display_name(), "Local LLM");
        assert!(matches!(descriptor.source, PluginSource::File(_)));

        let provider = descriptor.create(ProviderConfig::new("local"));
        assert_eq!(provider.provider_name(), "Local LLM");
        assert_eq!(provider.config().model, "llama");
        assert_eq!(provider.config().base_url, "http://127.0.0.1:9/v1");
        assert!(!provider.requires_api_key());
    }

    #[test]
    fn test_resolve_directory_without_manifest() {
        let dir = TempDir::new().unwrap();
        let unit_dir = dir.path().join("scripted");
        std::fs::create_dir(&unit_dir).unwrap();
        std::fs::write(unit_dir.join(DEFAULT_COMMAND), "#!/bin/sh\n").unwrap();

        let descriptor = resolve(&unit(&dir, "scripted")).unwrap();
        assert_eq!(descriptor.version, PluginVersion::default());
        assert_eq!(descriptor.author, DEFAULT_AUTHOR);
        assert_eq!(descriptor.description, DEFAULT_DESCRIPTION);
        assert_eq!(descriptor.metadata.get(META_KIND).map(String::as_str), Some("process"));

        let provider = descriptor.create(ProviderConfig::new("scripted"));
        assert_eq!(provider.config().model, DEFAULT_PROCESS_MODEL);
        assert!(!provider.requires_api_key());
    }

    #[test]
    fn test_malformed_units() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("garbage.json"), "{ nope").unwrap();
        std::fs::write(dir.path().join("nourl.json"), r#"{"version": "1.0"}"#).unwrap();
        std::fs::write(
            dir.path().join("badcap.json"),
            r#"{"base_url": "https://x.test", "requires": ["teleport"]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("ftp.json"), r#"{"base_url": "ftp://x.test"}"#).unwrap();

        let unit_dir = dir.path().join("nobin");
        std::fs::create_dir(&unit_dir).unwrap();
        std::fs::write(unit_dir.join(MANIFEST_FILE), r#"{"command": "./run.sh"}"#).unwrap();

        assert!(matches!(
            resolve(&unit(&dir, "garbage")),
            Err(PluginLoadError::MalformedMetadata { .. })
        ));
        assert!(matches!(
            resolve(&unit(&dir, "nourl")),
            Err(PluginLoadError::MissingImplementation { .. })
        ));
        assert!(matches!(
            resolve(&unit(&dir, "badcap")),
            Err(PluginLoadError::MalformedMetadata { .. })
        ));
        assert!(matches!(
            resolve(&unit(&dir, "ftp")),
            Err(PluginLoadError::Invalid { .. })
        ));
        let err = resolve(&unit(&dir, "nobin")).unwrap_err();
        assert_eq!(err.unit(), "nobin");
        assert!(matches!(err, PluginLoadError::MissingImplementation { .. }));
    }

    #[test]
    fn test_partial_capabilities_are_kept() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("partial.json"),
            r#"{"base_url": "https://x.test", "requires": ["generate_message"],
                "api_key_env": ["PARTIAL_KEY", "PARTIAL_TOKEN"]}"#,
        )
        .unwrap();

        let descriptor = resolve(&unit(&dir, "partial")).unwrap();
        assert_eq!(descriptor.required_capabilities, vec![Capability::GenerateMessage]);
        assert_eq!(descriptor.api_key_env(), vec!["PARTIAL_KEY", "PARTIAL_TOKEN"]);
        assert!(descriptor.create(ProviderConfig::new("partial")).requires_api_key());
    }
}
