//! 메시지 획득 파이프라인 통합 테스트
//!
//! `cargo test -p ticker-core --test acquisition`

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use ticker_core::{
    Acquisition, AcquisitionConfig, Orchestrator, PluginDescriptor, PluginManager, PluginRegistry,
    PluginSettingsStore, ProviderIntegration, ProviderRecord, ProviderSource, ARCHIVE_SUFFIX,
    UNAVAILABLE_MESSAGE,
};
use ticker_foundation::similarity;
use ticker_foundation::{MessageStore, PromptPair, RecencyTracker};
use ticker_provider::{Provider, ProviderConfig, ProviderResponse};

// ============================================================================
// Scripted provider
// ============================================================================

#[derive(Clone)]
enum Reply {
    /// 항상 같은 문자열
    Fixed(&'static str),
    /// 호출마다 다른 문자열
    Counter,
    /// 항상 실패
    Silent,
}

struct Scripted {
    config: ProviderConfig,
    reply: Reply,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Provider for Scripted {
    fn provider_name(&self) -> &str {
        &self.config.name
    }

    fn supported_models(&self) -> &[String] {
        &[]
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    fn initialize(&mut self) -> bool {
        true
    }

    async fn generate_message(&self, _: &str, _: &str) -> Option<ProviderResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let content = match &self.reply {
            Reply::Fixed(text) => text.to_string(),
            Reply::Counter => format!("{} reply #{} {}", self.config.name, n, "~".repeat(n % 7)),
            Reply::Silent => return None,
        };
        Some(ProviderResponse::new(content, &self.config.name, &self.config.model))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    _dir: TempDir,
    orchestrator: Orchestrator,
    store: MessageStore,
    recency: RecencyTracker,
    calls: Vec<Arc<AtomicUsize>>,
}

struct Setup<'a> {
    providers: Vec<(&'a str, Reply)>,
    cache: &'a [&'a str],
    recent: &'a [&'a str],
    cache_probability: f64,
    threshold: u8,
    max_size: usize,
    limit: usize,
}

impl Default for Setup<'_> {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            cache: &[],
            recent: &[],
            cache_probability: 0.0,
            threshold: 85,
            max_size: 200,
            limit: 3,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn harness(setup: Setup<'_>) -> Harness {
    let dir = TempDir::new().unwrap();
    let manager = Arc::new(PluginManager::new(
        Arc::new(PluginRegistry::new()),
        PluginSettingsStore::open(dir.path().join("plugin_config.json")),
        dir.path().join("plugins"),
    ));

    let mut records = Vec::new();
    let mut calls = Vec::new();
    for (name, reply) in setup.providers {
        let counter = Arc::new(AtomicUsize::new(0));
        calls.push(Arc::clone(&counter));
        manager
            .register(PluginDescriptor::new(name, move |config| {
                Box::new(Scripted {
                    config,
                    reply: reply.clone(),
                    calls: Arc::clone(&counter),
                })
            }))
            .unwrap();
        records.push(ProviderRecord::new(name).with_model("m").with_plugin(name));
    }

    let integration = ProviderIntegration::new(manager, ProviderSource::Records(records));

    let store = MessageStore::new(dir.path().join("message_cache.json"), setup.max_size);
    let recency = RecencyTracker::new(dir.path().join("last_messages.json"), setup.limit);
    if !setup.cache.is_empty() {
        store.save(&strings(setup.cache)).unwrap();
    }
    if !setup.recent.is_empty() {
        recency.save(&strings(setup.recent)).unwrap();
    }

    let orchestrator = Orchestrator::new(
        Arc::new(integration),
        store.clone(),
        recency.clone(),
        PromptPair::default(),
        AcquisitionConfig::new(setup.cache_probability, setup.threshold).unwrap(),
    );

    Harness {
        _dir: dir,
        orchestrator,
        store,
        recency,
        calls,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_stores_stay_bounded() {
    let h = harness(Setup {
        providers: vec![("alpha", Reply::Counter), ("beta", Reply::Counter)],
        cache_probability: 0.5,
        threshold: 100,
        max_size: 5,
        limit: 2,
        ..Setup::default()
    });

    for _ in 0..25 {
        h.orchestrator.acquire().await;
        assert!(h.store.load().len() <= 5);
        assert!(h.recency.load().len() <= 2);
    }
    assert!(!h.store.load().is_empty());
}

#[tokio::test]
async fn test_empty_cache_and_failing_providers_is_unavailable() {
    let h = harness(Setup {
        providers: vec![("alpha", Reply::Silent), ("beta", Reply::Silent)],
        ..Setup::default()
    });

    assert_eq!(h.orchestrator.acquire().await, Acquisition::Unavailable);
    assert_eq!(h.orchestrator.acquire_message().await, UNAVAILABLE_MESSAGE);
    assert_eq!(h.calls[0].load(Ordering::SeqCst), 2);
    assert_eq!(h.calls[1].load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failing_providers_fall_back_to_archive() {
    let h = harness(Setup {
        providers: vec![("alpha", Reply::Silent)],
        cache: &["A", "B"],
        ..Setup::default()
    });

    let message = h.orchestrator.acquire_message().await;
    let original = message
        .strip_suffix(ARCHIVE_SUFFIX)
        .expect("archive marker");
    assert!(["A", "B"].contains(&original));
    assert_eq!(h.recency.load().last().map(String::as_str), Some(original));
    assert_eq!(h.store.load().len(), 2);
}

#[tokio::test]
async fn test_threshold_100_rejects_identical_reply() {
    let h = harness(Setup {
        providers: vec![("copycat", Reply::Fixed("Alpha")), ("fresh", Reply::Fixed("Fresh"))],
        cache: &["Alpha"],
        threshold: 100,
        ..Setup::default()
    });

    for _ in 0..10 {
        let outcome = h.orchestrator.acquire().await;
        match outcome {
            Acquisition::Generated { content, provider } => {
                assert_eq!(content, "Fresh");
                assert_eq!(provider, "fresh");
            }
            other => {
                // "Fresh" 가 이미 저장된 뒤에는 두 응답 모두 중복
                assert!(matches!(other, Acquisition::Fallback(_)), "{:?}", other);
            }
        }
    }
    assert_eq!(h.store.load(), strings(&["Alpha", "Fresh"]));
}

#[tokio::test]
async fn test_threshold_100_accepts_near_duplicate() {
    let h = harness(Setup {
        providers: vec![("close", Reply::Fixed("Alpha!"))],
        cache: &["Alpha"],
        threshold: 100,
        ..Setup::default()
    });

    assert!(h.orchestrator.acquire().await.is_fresh());
}

#[tokio::test]
async fn test_threshold_0_rejects_everything() {
    let empty = harness(Setup {
        providers: vec![("alpha", Reply::Counter), ("beta", Reply::Fixed("anything"))],
        threshold: 0,
        ..Setup::default()
    });
    assert_eq!(empty.orchestrator.acquire().await, Acquisition::Unavailable);
    assert!(empty.store.load().is_empty());

    let seeded = harness(Setup {
        providers: vec![("alpha", Reply::Counter)],
        cache: &["X"],
        threshold: 0,
        ..Setup::default()
    });
    assert_eq!(
        seeded.orchestrator.acquire().await,
        Acquisition::Fallback("X".to_string())
    );
    assert_eq!(seeded.calls[0].load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cache_path_avoids_recent() {
    for _ in 0..20 {
        let h = harness(Setup {
            providers: vec![("alpha", Reply::Counter)],
            cache: &["A", "B", "C"],
            recent: &["A"],
            cache_probability: 1.0,
            limit: 3,
            ..Setup::default()
        });

        let outcome = h.orchestrator.acquire().await;
        let content = match &outcome {
            Acquisition::Cached(content) => content.clone(),
            other => panic!("expected cache hit, got {:?}", other),
        };
        assert!(content == "B" || content == "C");

        let recent = h.recency.load();
        assert!(recent.len() <= 3);
        assert_eq!(recent.last(), Some(&content));
        assert_eq!(h.calls[0].load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_cache_path_reuses_recent_when_all_recent() {
    let h = harness(Setup {
        cache: &["A", "B"],
        recent: &["A", "B"],
        cache_probability: 1.0,
        ..Setup::default()
    });

    let outcome = h.orchestrator.acquire().await;
    assert!(matches!(outcome, Acquisition::Cached(ref c) if c == "A" || c == "B"));
}

#[tokio::test]
async fn test_no_providers_and_empty_store_writes_nothing() {
    let h = harness(Setup::default());

    assert_eq!(h.orchestrator.acquire_message().await, UNAVAILABLE_MESSAGE);
    assert!(!h.store.path().exists());
    assert!(!h.recency.path().exists());

    // 빈 파일이 있어도 내용은 바뀌지 않는다
    h.store.save(&[]).unwrap();
    h.recency.save(&[]).unwrap();
    let before = (
        std::fs::read_to_string(h.store.path()).unwrap(),
        std::fs::read_to_string(h.recency.path()).unwrap(),
    );
    assert_eq!(h.orchestrator.acquire().await, Acquisition::Unavailable);
    let after = (
        std::fs::read_to_string(h.store.path()).unwrap(),
        std::fs::read_to_string(h.recency.path()).unwrap(),
    );
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_near_duplicate_skipped_for_fresh_reply() {
    let cached = "The quick brown fox jumps over the lazy dog";
    let near = "The quick brown fox jumps over the lazy cat";
    let fresh = "Robots dream of electric sheep at midnight.";
    assert!(similarity::ratio(near, cached) >= 85.0);
    assert!(similarity::ratio(fresh, cached) < 85.0);

    // 순서가 섞이므로 "near" 가 먼저 호출된 경우가 나올 때까지 반복
    let mut near_tried = false;
    for _ in 0..64 {
        let h = harness(Setup {
            providers: vec![("near", Reply::Fixed(near)), ("fresh", Reply::Fixed(fresh))],
            cache: &[cached],
            threshold: 85,
            ..Setup::default()
        });

        let outcome = h.orchestrator.acquire().await;
        assert_eq!(
            outcome,
            Acquisition::Generated {
                content: fresh.to_string(),
                provider: "fresh".to_string()
            }
        );
        assert_eq!(h.store.load(), strings(&[cached, fresh]));
        assert_eq!(h.recency.load().last().map(String::as_str), Some(fresh));
        assert_eq!(h.calls[1].load(Ordering::SeqCst), 1);

        if h.calls[0].load(Ordering::SeqCst) >= 1 {
            near_tried = true;
            break;
        }
    }
    assert!(near_tried);
}

#[tokio::test]
async fn test_provider_order_is_shuffled() {
    let h = harness(Setup {
        providers: vec![("alpha", Reply::Counter), ("beta", Reply::Counter)],
        threshold: 100,
        max_size: 10,
        ..Setup::default()
    });

    let mut served = std::collections::HashMap::new();
    for _ in 0..60 {
        if let Acquisition::Generated { provider, .. } = h.orchestrator.acquire().await {
            *served.entry(provider).or_insert(0) += 1;
        }
    }
    assert!(served.get("alpha").copied().unwrap_or(0) > 0);
    assert!(served.get("beta").copied().unwrap_or(0) > 0);
}

#[tokio::test]
async fn test_collaborator_operations() {
    let h = harness(Setup {
        providers: vec![("alpha", Reply::Fixed("hello")), ("beta", Reply::Silent)],
        cache: &["A", "B", "C"],
        ..Setup::default()
    });

    assert_eq!(h.orchestrator.list_providers(), vec!["alpha", "beta"]);
    assert_eq!(h.orchestrator.provider_info().len(), 2);
    assert_eq!(h.orchestrator.cache_size(), 3);
    assert_eq!(h.orchestrator.list_plugins().len(), 2);

    let health = h.orchestrator.health_check_all().await;
    assert!(health.values().all(|ok| *ok));

    assert_eq!(h.orchestrator.reload_providers(), 2);
    assert_eq!(h.orchestrator.list_providers().len(), 2);
}
