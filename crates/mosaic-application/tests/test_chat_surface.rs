use async_trait::async_trait;
use chrono::Utc;
use mosaic_application::{ChatSurface, SurfaceCache};
use mosaic_core::error::{MosaicError, Result};
use mosaic_core::feed::{FeedHub, LiveFeed, LiveHandler, LiveItem, Subscription};
use mosaic_core::history::{HistoryLoader, HistoryPage, HistoryQuery, HistorySource};
use mosaic_core::message::{MessageRole, MessageType, WireMessage};
use mosaic_core::reconcile::{LoadOutcome, Phase};
use mosaic_core::session::{
    ComposerState, OutgoingMessage, RuntimeStatus, Session, SessionCommands, SessionKey,
    SessionLifecycle,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Test doubles
// ============================================================================

fn row(session_id: &str, sequence: u64, message_type: MessageType) -> WireMessage {
    WireMessage {
        id: Some(format!("{session_id}-m{sequence}")),
        session_id: Some(session_id.to_string()),
        sequence,
        role: MessageRole::Assistant,
        message_type,
        payload: json!(format!("message {sequence}")),
        created_at: Utc::now(),
    }
}

struct Gate {
    session_id: String,
    started: Arc<Notify>,
    release: Arc<Notify>,
}

/// History keyed by session id, with an optional gate that holds fetches of
/// one session until released.
#[derive(Default)]
struct ScriptedHistory {
    logs: Mutex<HashMap<String, Vec<WireMessage>>>,
    gate: Mutex<Option<Gate>>,
    fetches: AtomicUsize,
}

impl ScriptedHistory {
    fn set_log(&self, session_id: &str, sequences: std::ops::RangeInclusive<u64>) {
        let rows = sequences
            .map(|sequence| row(session_id, sequence, MessageType::Text))
            .collect();
        self.logs.lock().unwrap().insert(session_id.to_string(), rows);
    }

    fn hold(&self, session_id: &str) -> (Arc<Notify>, Arc<Notify>) {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Gate {
            session_id: session_id.to_string(),
            started: started.clone(),
            release: release.clone(),
        });
        (started, release)
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistorySource for ScriptedHistory {
    async fn fetch_page(&self, query: &HistoryQuery) -> Result<HistoryPage> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let gate = self
            .gate
            .lock()
            .unwrap()
            .as_ref()
            .filter(|gate| gate.session_id == query.session_id)
            .map(|gate| (gate.started.clone(), gate.release.clone()));
        if let Some((started, release)) = gate {
            started.notify_one();
            release.notified().await;
        }

        let messages = self
            .logs
            .lock()
            .unwrap()
            .get(&query.session_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|row| serde_json::to_value(row).unwrap())
            .collect::<Vec<_>>();
        Ok(HistoryPage {
            total: messages.len() as u64,
            total_pages: 1,
            messages,
        })
    }
}

#[derive(Default)]
struct RecordingCommands {
    sent: Mutex<Vec<(SessionKey, OutgoingMessage)>>,
    interrupts: Mutex<Vec<SessionKey>>,
}

#[async_trait]
impl SessionCommands for RecordingCommands {
    async fn send_message(&self, key: &SessionKey, message: &OutgoingMessage) -> Result<()> {
        self.sent.lock().unwrap().push((key.clone(), message.clone()));
        Ok(())
    }

    async fn interrupt(&self, key: &SessionKey) -> Result<()> {
        self.interrupts.lock().unwrap().push(key.clone());
        Ok(())
    }
}

/// Wraps a hub and records subscribe/release order.
struct RecordingFeed {
    hub: FeedHub,
    events: Arc<Mutex<Vec<String>>>,
}

impl LiveFeed for RecordingFeed {
    fn subscribe(&self, session_id: &str, handler: LiveHandler) -> Subscription {
        self.events
            .lock()
            .unwrap()
            .push(format!("subscribe {session_id}"));
        let inner = self.hub.subscribe(session_id, handler);
        let events = self.events.clone();
        let owned = session_id.to_string();
        Subscription::new(session_id, move || {
            drop(inner);
            events.lock().unwrap().push(format!("release {owned}"));
        })
    }
}

struct Fixture {
    history: Arc<ScriptedHistory>,
    hub: FeedHub,
    commands: Arc<RecordingCommands>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            history: Arc::new(ScriptedHistory::default()),
            hub: FeedHub::new(),
            commands: Arc::new(RecordingCommands::default()),
        }
    }

    fn loader(&self) -> HistoryLoader {
        HistoryLoader::new(self.history.clone())
    }

    fn surface(&self) -> ChatSurface {
        ChatSurface::new(
            self.loader(),
            Arc::new(self.hub.clone()),
            self.commands.clone(),
        )
    }
}

fn key(session_id: &str) -> SessionKey {
    SessionKey::new("mosaic-1", "node-1", session_id)
}

fn live(session_id: &str, sequence: u64) -> LiveItem {
    serde_json::from_value(json!({
        "kind": "message",
        "session_id": session_id,
        "message_id": format!("{session_id}-m{sequence}"),
        "sequence": sequence,
        "role": "assistant",
        "message_type": "text",
        "payload": format!("message {sequence}"),
    }))
    .unwrap()
}

fn runtime(session_id: &str, status: &str) -> LiveItem {
    serde_json::from_value(json!({
        "kind": "notification",
        "session_id": session_id,
        "message_type": "runtime_status_changed",
        "payload": { "status": status },
    }))
    .unwrap()
}

fn sequences(surface: &ChatSurface) -> Vec<u64> {
    surface.messages().iter().map(|m| m.sequence).collect()
}

// ============================================================================
// Reconciliation through the surface
// ============================================================================

#[tokio::test]
async fn test_history_live_duplicate_gap_scenario() {
    let fx = Fixture::new();
    fx.history.set_log("s-1", 1..=3);
    let surface = fx.surface();

    let outcome = surface.select(key("s-1")).await;
    assert_eq!(outcome, LoadOutcome::Applied { count: 3, cursor: 3 });

    fx.hub.dispatch(live("s-1", 4));
    assert_eq!(sequences(&surface), vec![1, 2, 3, 4]);
    assert_eq!(surface.cursor(), 4);

    fx.hub.dispatch(live("s-1", 4));
    assert_eq!(surface.messages().len(), 4);

    fx.history.set_log("s-1", 1..=6);
    fx.hub.dispatch(live("s-1", 7));
    surface.settle().await;

    assert_eq!(sequences(&surface), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(surface.cursor(), 6);
    assert_eq!(surface.phase(), Phase::Bound);
}

#[tokio::test]
async fn test_single_reload_in_flight_per_surface() {
    let fx = Fixture::new();
    fx.history.set_log("s-1", 1..=2);
    let surface = fx.surface();
    surface.select(key("s-1")).await;
    assert_eq!(fx.history.fetches(), 1);

    let (started, release) = fx.history.hold("s-1");
    fx.history.set_log("s-1", 1..=9);
    fx.hub.dispatch(live("s-1", 5));
    started.notified().await;
    fx.hub.dispatch(live("s-1", 8));
    fx.hub.dispatch(live("s-1", 9));
    release.notify_one();
    surface.settle().await;

    assert_eq!(fx.history.fetches(), 2);
    assert_eq!(surface.cursor(), 9);
    assert_eq!(surface.messages().len(), 9);
}

#[tokio::test]
async fn test_stale_history_discarded_after_switch() {
    let fx = Fixture::new();
    fx.history.set_log("a", 1..=5);
    fx.history.set_log("b", 1..=2);
    let (started, release) = fx.history.hold("a");
    let surface = Arc::new(fx.surface());

    let first = tokio::spawn({
        let surface = surface.clone();
        async move { surface.select(key("a")).await }
    });
    started.notified().await;

    let second = surface.select(key("b")).await;
    release.notify_one();
    let first = first.await.unwrap();

    assert_eq!(first, LoadOutcome::Stale);
    assert_eq!(second, LoadOutcome::Applied { count: 2, cursor: 2 });
    assert!(surface.messages().iter().all(|m| m.session_id == "b"));
    assert_eq!(surface.session_key(), Some(key("b")));
}

#[tokio::test]
async fn test_switch_releases_before_subscribing() {
    let fx = Fixture::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let surface = ChatSurface::new(
        fx.loader(),
        Arc::new(RecordingFeed {
            hub: fx.hub.clone(),
            events: events.clone(),
        }),
        fx.commands.clone(),
    );

    surface.select(key("a")).await;
    surface.select(key("b")).await;

    assert_eq!(
        *events.lock().unwrap(),
        vec!["subscribe a", "release a", "subscribe b"]
    );
    assert_eq!(fx.hub.subscriber_count("a"), 0);
    assert_eq!(fx.hub.subscriber_count("b"), 1);
}

#[tokio::test]
async fn test_items_of_previous_session_ignored_after_switch() {
    let fx = Fixture::new();
    fx.history.set_log("a", 1..=3);
    let surface = fx.surface();
    surface.select(key("a")).await;
    surface.select(key("b")).await;

    assert_eq!(fx.hub.dispatch(live("a", 4)), 0);
    assert!(surface.messages().is_empty());
    assert_eq!(surface.cursor(), 0);
}

#[tokio::test]
async fn test_close_unbinds_and_releases() {
    let fx = Fixture::new();
    fx.history.set_log("s-1", 1..=2);
    let surface = fx.surface();
    surface.select(key("s-1")).await;
    surface.set_draft("half typed");

    surface.close();

    assert_eq!(fx.hub.subscriber_count("s-1"), 0);
    assert_eq!(surface.phase(), Phase::Unbound);
    assert!(surface.messages().is_empty());
    assert!(surface.draft().is_empty());
    assert_eq!(surface.session_key(), None);
}

// ============================================================================
// Status and composer
// ============================================================================

#[tokio::test]
async fn test_runtime_notification_gates_send() {
    let fx = Fixture::new();
    fx.history.set_log("s-1", 1..=1);
    let surface = fx.surface();
    surface.select(key("s-1")).await;
    let mut composer = surface.watch_composer();

    fx.hub.dispatch(runtime("s-1", "busy"));

    assert_eq!(surface.runtime_status(), RuntimeStatus::Busy);
    assert!(composer.has_changed().unwrap());
    assert_eq!(*composer.borrow_and_update(), ComposerState::Busy);
    assert_eq!(surface.messages().len(), 1);
    let err = surface.send("hello").await.unwrap_err();
    assert_eq!(err, MosaicError::SessionBusy("s-1".to_string()));

    fx.hub.dispatch(runtime("s-1", "idle"));
    assert_eq!(*composer.borrow(), ComposerState::Ready);

    surface.set_draft("hello");
    let client_id = surface.send("hello").await.unwrap();

    let sent = fx.commands.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, key("s-1"));
    assert_eq!(sent[0].1.content, "hello");
    assert_eq!(sent[0].1.client_message_id, client_id);
    assert!(uuid::Uuid::parse_str(&client_id).is_ok());
    assert!(surface.draft().is_empty());
}

#[tokio::test]
async fn test_send_rejections() {
    let fx = Fixture::new();
    let surface = fx.surface();

    assert_eq!(
        surface.send("hi").await.unwrap_err(),
        MosaicError::NoSessionSelected
    );

    surface.select(key("s-1")).await;
    assert_eq!(
        surface.send("   ").await.unwrap_err(),
        MosaicError::EmptyMessage
    );

    let closed = Session {
        id: "s-2".to_string(),
        scope_id: "mosaic-1".to_string(),
        node_id: "node-1".to_string(),
        title: "done".to_string(),
        lifecycle: SessionLifecycle::Closed,
        runtime: RuntimeStatus::Idle,
    };
    surface.open(&closed).await;
    assert_eq!(surface.composer_state(), ComposerState::Closed);
    let err = surface.send("hi").await.unwrap_err();
    assert!(err.is_rejected_input());
    assert_eq!(err, MosaicError::SessionClosed("s-2".to_string()));

    assert!(fx.commands.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_interrupt_forwarded() {
    let fx = Fixture::new();
    let surface = fx.surface();
    assert!(surface.interrupt().await.is_err());

    surface.select(key("s-1")).await;
    surface.interrupt().await.unwrap();

    assert_eq!(*fx.commands.interrupts.lock().unwrap(), vec![key("s-1")]);
}

#[tokio::test]
async fn test_default_collapse_and_toggle() {
    let fx = Fixture::new();
    fx.history.logs.lock().unwrap().insert(
        "s-1".to_string(),
        vec![
            row("s-1", 1, MessageType::Text),
            row("s-1", 2, MessageType::Thinking),
            row("s-1", 3, MessageType::ToolUse),
        ],
    );
    let surface = fx.surface();
    surface.select(key("s-1")).await;

    assert!(!surface.is_collapsed("s-1-m1"));
    assert!(surface.is_collapsed("s-1-m2"));
    assert!(surface.is_collapsed("s-1-m3"));

    assert!(!surface.toggle_collapse("s-1-m2"));
    assert!(!surface.is_collapsed("s-1-m2"));
}

// ============================================================================
// Surface cache
// ============================================================================

fn cache(fx: &Fixture, max_alive: usize) -> SurfaceCache {
    SurfaceCache::new(
        fx.loader(),
        Arc::new(fx.hub.clone()),
        fx.commands.clone(),
        max_alive,
    )
}

#[tokio::test]
async fn test_cache_reuses_surface_and_keeps_draft() {
    let fx = Fixture::new();
    fx.history.set_log("a", 1..=3);
    let cache = cache(&fx, 4);

    let first = cache.activate(key("a")).await;
    first.set_draft("unsent");
    let again = cache.activate(key("a")).await;

    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(again.draft(), "unsent");
    assert_eq!(fx.history.fetches(), 1);
    assert_eq!(fx.hub.subscriber_count("a"), 1);
}

#[tokio::test]
async fn test_cache_evicts_least_recently_activated() {
    let fx = Fixture::new();
    let cache = cache(&fx, 2);

    cache.activate(key("a")).await;
    cache.activate(key("b")).await;
    cache.activate(key("a")).await;
    cache.activate(key("c")).await;

    assert_eq!(cache.session_ids().await, vec!["a", "c"]);
    assert!(cache.get("b").await.is_none());
    assert_eq!(fx.hub.subscriber_count("b"), 0);
    assert_eq!(fx.hub.subscriber_count("a"), 1);
}

#[tokio::test]
async fn test_cache_remove_and_clear() {
    let fx = Fixture::new();
    let cache = cache(&fx, 3);
    cache.activate(key("a")).await;
    cache.activate(key("b")).await;

    assert!(cache.remove("a").await);
    assert!(!cache.remove("a").await);
    assert_eq!(fx.hub.subscriber_count("a"), 0);

    cache.clear().await;
    assert!(cache.is_empty().await);
    assert_eq!(fx.hub.subscriber_count("b"), 0);
}
