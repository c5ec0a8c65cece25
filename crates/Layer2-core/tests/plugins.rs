//! 플러그인 디렉토리 → Provider → Orchestrator 통합 테스트
//!
//! `cargo test -p ticker-core --test plugins`

#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use ticker_core::{
    Acquisition, AcquisitionConfig, EnvDefaults, Orchestrator, PluginLoadError, PluginManager,
    PluginRegistry, PluginSettingsStore, PluginSource, ProviderIntegration, ProviderSource,
};
use ticker_foundation::{MessageStore, PromptPair, RecencyTracker};

const SCRIPT: &str = r#"read line
case "$line" in
  *'"action":"health"'*) echo '{"healthy": true}' ;;
  *) echo '{"content": "Beep boop from the script."}' ;;
esac
"#;

fn write_units(plugins: &Path) {
    std::fs::create_dir_all(plugins).unwrap();

    // 정상 process unit
    let bot = plugins.join("bot");
    std::fs::create_dir(&bot).unwrap();
    std::fs::write(
        bot.join("plugin.json"),
        r#"{"name": "Script Bot", "version": "0.3.1", "author": "tests",
            "command": "sh", "args": ["provider.sh"]}"#,
    )
    .unwrap();
    std::fs::write(bot.join("provider.sh"), SCRIPT).unwrap();

    // 정상 HTTP unit (키 필요)
    std::fs::write(
        plugins.join("local.json"),
        r#"{"base_url": "http://127.0.0.1:9/v1", "api_key_env": "LOCAL_KEY",
            "default_model": "tiny"}"#,
    )
    .unwrap();

    // 손상된 unit
    std::fs::write(plugins.join("broken.json"), "{ not json").unwrap();

    // 무시되는 unit
    std::fs::write(plugins.join("_draft.json"), "{}").unwrap();
}

fn manager(dir: &TempDir) -> Arc<PluginManager> {
    let plugins = dir.path().join("plugins");
    write_units(&plugins);
    Arc::new(PluginManager::new(
        Arc::new(PluginRegistry::new()),
        PluginSettingsStore::open(dir.path().join("plugin_config.json")),
        plugins,
    ))
}

#[test]
fn test_load_all_reports_each_unit() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);

    assert_eq!(manager.register_builtins(), 8);
    let report = manager.load_all();

    assert_eq!(report.loaded, vec!["bot", "local"]);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        &report.failed[0],
        PluginLoadError::MalformedMetadata { unit, .. } if unit == "broken"
    ));
    assert!(!report.is_clean());

    let bot = manager.registry().get("bot").unwrap();
    assert_eq!(bot.display_name(), "Script Bot");
    assert_eq!(bot.version.to_string(), "0.3.1");
    assert!(matches!(bot.source, PluginSource::Directory(_)));
    assert!(!manager.registry().contains("_draft"));

    // 두 번째 호출은 같은 출처의 unit 을 건너뛴다
    let again = manager.load_all();
    assert!(again.loaded.is_empty());
    assert!(again.skipped.contains(&"bot".to_string()));
}

#[test]
fn test_disabled_unit_survives_restart() {
    let dir = TempDir::new().unwrap();
    let first = manager(&dir);
    first.load_all();
    first.disable("bot").unwrap();
    assert!(!first.registry().contains("bot"));

    let second = Arc::new(PluginManager::new(
        Arc::new(PluginRegistry::new()),
        PluginSettingsStore::open(dir.path().join("plugin_config.json")),
        dir.path().join("plugins"),
    ));
    let report = second.load_all();
    assert!(report.skipped.contains(&"bot".to_string()));
    assert!(!second.registry().contains("bot"));

    second.enable("bot").unwrap();
    second.load_all();
    assert!(second.registry().contains("bot"));
}

#[tokio::test]
async fn test_process_unit_serves_messages() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);
    manager.register_builtins();
    manager.load_all();

    // 키 없는 환경: 키가 필요 없는 process unit 만 구성된다
    let integration = Arc::new(ProviderIntegration::with_env(
        Arc::clone(&manager),
        ProviderSource::Environment,
        EnvDefaults::default()
            .with_lookup(|_| None)
            .with_timeout_secs(10),
    ));
    assert_eq!(integration.provider_names(), vec!["script bot"]);

    let health = integration.health_check_all().await;
    assert_eq!(health.get("script bot"), Some(&true));

    let orchestrator = Orchestrator::new(
        integration,
        MessageStore::new(dir.path().join("message_cache.json"), 10),
        RecencyTracker::new(dir.path().join("last_messages.json"), 3),
        PromptPair::default(),
        AcquisitionConfig::new(0.0, 85).unwrap(),
    );

    assert_eq!(
        orchestrator.acquire().await,
        Acquisition::Generated {
            content: "Beep boop from the script.".to_string(),
            provider: "script bot".to_string(),
        }
    );
    assert_eq!(orchestrator.cache_size(), 1);

    // 같은 응답은 중복이므로 archive 로 대체된다
    assert_eq!(
        orchestrator.acquire_message().await,
        "Beep boop from the script. (from archive)"
    );
}

#[test]
fn test_keyed_units_join_when_key_present() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);
    manager.register_builtins();
    manager.load_all();

    let integration = ProviderIntegration::with_env(
        manager,
        ProviderSource::Environment,
        EnvDefaults::default().with_lookup(|var| match var {
            "LOCAL_KEY" | "GROQ_API_KEY" => Some("secret".to_string()),
            _ => None,
        }),
    );

    let names = integration.provider_names();
    assert!(names.contains(&"local".to_string()));
    assert!(names.contains(&"groq".to_string()));
    assert!(names.contains(&"script bot".to_string()));
    assert!(!names.contains(&"openrouter".to_string()));
    assert_eq!(integration.provider("local").unwrap().config().model, "tiny");
}
