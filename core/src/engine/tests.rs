use super::*;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::plugin::{Plugin, PluginMetadata, PluginRegistry};
use crate::query::{Query, QueryId};
use crate::result::ResultItem;
use crate::storage::RecordStores;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Answers with one result titled `<id>:<search>`
struct EchoPlugin {
    metadata: PluginMetadata,
    calls: Arc<AtomicUsize>,
    slow_text: Option<&'static str>,
    delay: Duration,
}

impl EchoPlugin {
    fn new(metadata: PluginMetadata) -> Self {
        Self {
            metadata,
            calls: Arc::new(AtomicUsize::new(0)),
            slow_text: None,
            delay: Duration::ZERO,
        }
    }

    fn slow_on(mut self, text: &'static str, delay: Duration) -> Self {
        self.slow_text = Some(text);
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Plugin for EchoPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    async fn query(&self, query: &Query) -> Result<Vec<ResultItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.slow_text == Some(query.raw()) {
            tokio::time::sleep(self.delay).await;
        }
        Ok(vec![ResultItem::new(format!(
            "{}:{}",
            self.metadata.id,
            query.search()
        ))
        .with_score(10)])
    }
}

struct Harness {
    dispatcher: QueryDispatcher,
    display: watch::Receiver<DisplaySnapshot>,
}

fn harness(plugins: Vec<Arc<dyn Plugin>>) -> Harness {
    let config = EngineConfig::default();
    let mut registry = PluginRegistry::new();
    for plugin in plugins {
        registry.register(plugin).unwrap();
    }

    let (sender, receiver) = mpsc::channel(config.queue_capacity);
    let engine = ResultMergeEngine::new(MergeSettings::from(&config), RecordStores::in_memory());
    let display = engine.subscribe();
    UpdateCoalescer::new(receiver, engine, &config).spawn(None);

    Harness {
        dispatcher: QueryDispatcher::new(Arc::new(registry), sender, &config),
        display,
    }
}

fn titles(snapshot: &DisplaySnapshot) -> Vec<String> {
    snapshot.results().map(|r| r.title.clone()).collect()
}

async fn wait_for_display(
    display: &mut watch::Receiver<DisplaySnapshot>,
    predicate: impl FnMut(&DisplaySnapshot) -> bool,
) -> DisplaySnapshot {
    tokio::time::timeout(Duration::from_secs(2), display.wait_for(predicate))
        .await
        .expect("display did not reach the expected state")
        .expect("display channel closed")
        .clone()
}

#[tokio::test]
async fn test_superseded_round_never_reaches_display() {
    let echo = EchoPlugin::new(PluginMetadata::new("echo", "Echo"))
        .slow_on("a", Duration::from_millis(300));
    let mut harness = harness(vec![Arc::new(echo)]);

    let slow = harness.dispatcher.dispatch("a").await.unwrap().unwrap();
    let fast = harness.dispatcher.dispatch("ab").await.unwrap().unwrap();

    assert!(fast.finished().await);
    assert!(!slow.finished().await);
    assert!(slow.is_cancelled());

    let snapshot = wait_for_display(&mut harness.display, |s| !s.is_empty()).await;
    assert_eq!(titles(&snapshot), vec!["echo:ab"]);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(titles(&harness.display.borrow()), vec!["echo:ab"]);
}

#[tokio::test]
async fn test_keyword_plugins_only_see_their_keyword() {
    let google = EchoPlugin::new(PluginMetadata::new("google", "Google").with_keyword("g"));
    let youtube = EchoPlugin::new(PluginMetadata::new("youtube", "YouTube").with_keyword("y"));
    let calc = EchoPlugin::new(PluginMetadata::new("calc", "Calculator"));
    let (google_calls, youtube_calls, calc_calls) = (
        google.calls.clone(),
        youtube.calls.clone(),
        calc.calls.clone(),
    );
    let mut harness = harness(vec![Arc::new(google), Arc::new(youtube), Arc::new(calc)]);

    let round = harness.dispatcher.dispatch("g test").await.unwrap().unwrap();
    assert_eq!(round.plugin_count(), 2);
    assert!(round.finished().await);
    assert_eq!(google_calls.load(Ordering::SeqCst), 1);
    assert_eq!(youtube_calls.load(Ordering::SeqCst), 0);
    assert_eq!(calc_calls.load(Ordering::SeqCst), 1);
    let mut shown = titles(&harness.display.borrow());
    shown.sort();
    assert_eq!(shown, vec!["calc:test", "google:test"]);

    let round = harness.dispatcher.dispatch("y test").await.unwrap().unwrap();
    assert!(round.finished().await);
    assert_eq!(google_calls.load(Ordering::SeqCst), 1);
    assert_eq!(youtube_calls.load(Ordering::SeqCst), 1);
    let snapshot = wait_for_display(&mut harness.display, |s| {
        s.results().all(|r| r.plugin_id != "google")
    })
    .await;
    let mut shown = titles(&snapshot);
    shown.sort();
    assert_eq!(shown, vec!["calc:test", "youtube:test"]);
}

#[tokio::test]
async fn test_queued_batches_coalesce_into_one_snapshot() {
    let config = EngineConfig::default();
    let (sender, receiver) = mpsc::channel(config.queue_capacity);
    let engine = ResultMergeEngine::new(MergeSettings::from(&config), RecordStores::in_memory());
    let mut display = engine.subscribe();

    let query = Arc::new(Query::plain(QueryId(1), "burst"));
    let token = CancellationToken::new();
    let completion = RoundCompletion::new(10);
    for i in 0..10 {
        let plugin = format!("p{}", i);
        sender
            .send(EngineEvent::Results(ResultBatch {
                plugin: Arc::new(PluginMetadata::new(plugin.clone(), plugin)),
                query: query.clone(),
                results: vec![ResultItem::new(format!("r{}", i)).with_score(i)],
                token: token.clone(),
                completion: completion.clone(),
            }))
            .await
            .unwrap();
    }

    let handle = UpdateCoalescer::new(receiver, engine, &config).spawn(None);
    let snapshot = wait_for_display(&mut display, |s| !s.is_empty()).await;
    assert_eq!(snapshot.revision, 1);
    assert_eq!(snapshot.len(), 10);
    assert!(completion.is_complete());

    drop(sender);
    handle.join().await.unwrap();
    assert_eq!(display.borrow().revision, 1);
}

#[tokio::test]
async fn test_empty_text_clears_display() {
    let mut harness = harness(vec![Arc::new(EchoPlugin::new(PluginMetadata::new(
        "echo", "Echo",
    )))]);

    let round = harness.dispatcher.dispatch("hello").await.unwrap().unwrap();
    assert!(round.finished().await);
    assert!(!harness.display.borrow().is_empty());

    assert!(harness.dispatcher.dispatch("   ").await.unwrap().is_none());
    let snapshot = wait_for_display(&mut harness.display, |s| s.is_empty()).await;
    assert!(!snapshot.visible);
    assert!(round.is_cancelled());
}

#[tokio::test]
async fn test_progress_shown_only_for_slow_rounds() {
    let echo = EchoPlugin::new(PluginMetadata::new("echo", "Echo"))
        .slow_on("slow", Duration::from_millis(500));
    let harness = harness(vec![Arc::new(echo)]);
    let mut progress = harness.dispatcher.progress();

    let round = harness.dispatcher.dispatch("fast").await.unwrap().unwrap();
    assert!(round.finished().await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!progress.borrow().visible);

    let round = harness.dispatcher.dispatch("slow").await.unwrap().unwrap();
    let query_id = round.query().id();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!progress.borrow().visible);

    tokio::time::timeout(Duration::from_secs(2), progress.wait_for(|s| s.visible))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(progress.borrow().query_id, Some(query_id));

    assert!(round.finished().await);
    tokio::time::timeout(Duration::from_secs(2), progress.wait_for(|s| !s.visible))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_updater_accepts_only_current_query() {
    let mut harness = harness(vec![Arc::new(EchoPlugin::new(PluginMetadata::new(
        "echo", "Echo",
    )))]);
    assert!(harness.dispatcher.updater("missing").is_none());
    let updater = harness.dispatcher.updater("echo").unwrap();

    let first = harness.dispatcher.dispatch("one").await.unwrap().unwrap();
    let stale_id = first.query().id();
    let round = harness.dispatcher.dispatch("two").await.unwrap().unwrap();
    assert!(round.finished().await);

    assert!(!updater.push(stale_id, vec![ResultItem::new("late")]).await);
    assert!(
        updater
            .push(round.query().id(), vec![ResultItem::new("pushed").with_score(99)])
            .await
    );

    let snapshot = wait_for_display(&mut harness.display, |s| {
        s.results().any(|r| r.title == "pushed")
    })
    .await;
    assert_eq!(snapshot.get(0).map(|r| r.plugin_id.as_str()), Some("echo"));
    assert!(snapshot.results().all(|r| r.title != "late"));
}

#[tokio::test]
async fn test_cycles_are_paced_and_applied_in_order() {
    let config = EngineConfig::default();
    let (sender, receiver) = mpsc::channel(config.queue_capacity);
    let engine = ResultMergeEngine::new(MergeSettings::from(&config), RecordStores::in_memory());
    let mut display = engine.subscribe();
    let handle = UpdateCoalescer::new(receiver, engine, &config).spawn(None);

    let query = Arc::new(Query::plain(QueryId(1), "paced"));
    let token = CancellationToken::new();
    let completion = RoundCompletion::new(2);
    let batch = |plugin: &str, title: &str| {
        EngineEvent::Results(ResultBatch {
            plugin: Arc::new(PluginMetadata::new(plugin, plugin)),
            query: query.clone(),
            results: vec![ResultItem::new(title).with_score(5)],
            token: token.clone(),
            completion: completion.clone(),
        })
    };

    let sent = tokio::time::Instant::now();
    sender.send(batch("first", "one")).await.unwrap();
    let snapshot = wait_for_display(&mut display, |s| s.revision == 1).await;
    assert_eq!(titles(&snapshot), vec!["one"]);

    tokio::time::sleep(config.drain_window() * 2).await;
    sender.send(batch("second", "two")).await.unwrap();
    let snapshot = wait_for_display(&mut display, |s| s.revision == 2).await;
    assert!(sent.elapsed() >= config.refresh_cycle());
    assert_eq!(titles(&snapshot), vec!["one", "two"]);
    assert!(completion.is_complete());

    drop(sender);
    handle.join().await.unwrap();
}
