//! Chat surface: the per-session view model behind one chat pane.
//!
//! A surface owns one [`Reconciler`] and wires it to the outside world:
//! history loads through a [`HistoryLoader`], live items through a
//! [`LiveFeed`] subscription, and user actions through [`SessionCommands`].

use mosaic_core::error::{MosaicError, Result};
use mosaic_core::feed::{LiveFeed, LiveHandler, LiveItem, Subscription};
use mosaic_core::history::HistoryLoader;
use mosaic_core::message::Message;
use mosaic_core::reconcile::{LiveOutcome, LoadOutcome, LoadTicket, Phase, Reconciler};
use mosaic_core::session::{
    ComposerState, OutgoingMessage, RuntimeStatus, Session, SessionCommands, SessionKey,
    SessionLifecycle,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the surface and its live handler / reload task.
struct SurfaceCore {
    reconciler: Mutex<Reconciler>,
    key: Mutex<Option<SessionKey>>,
    history: HistoryLoader,
    reload: Mutex<Option<JoinHandle<()>>>,
    composer: watch::Sender<ComposerState>,
}

impl SurfaceCore {
    fn current_key(&self) -> Option<SessionKey> {
        lock(&self.key).clone()
    }

    /// Called from the feed for every item of the bound session. Never blocks
    /// on I/O.
    fn on_live(self: &Arc<Self>, item: LiveItem) {
        let outcome = lock(&self.reconciler).apply_live(item);
        match outcome {
            LiveOutcome::ResyncRequired(ticket) => self.spawn_reload(ticket),
            LiveOutcome::Signal(_) => self.publish_composer(),
            LiveOutcome::Appended { .. } | LiveOutcome::Ignored(_) => {}
        }
    }

    fn spawn_reload(self: &Arc<Self>, ticket: LoadTicket) {
        let mut slot = lock(&self.reload);
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            tracing::debug!(
                session_id = ticket.session_id(),
                "Reload already in flight; gap left to it"
            );
            return;
        }

        let Some(key) = self
            .current_key()
            .filter(|key| key.session_id == ticket.session_id())
        else {
            return;
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(
                session_id = ticket.session_id(),
                "No async runtime available; reload skipped"
            );
            return;
        };

        tracing::info!(session = %key, "Reloading history after sequence gap");
        let core = Arc::clone(self);
        *slot = Some(runtime.spawn(async move {
            let result = core.history.load(&key).await;
            core.apply_load(&ticket, result);
        }));
    }

    fn apply_load(&self, ticket: &LoadTicket, result: Result<Vec<Message>>) -> LoadOutcome {
        let outcome = lock(&self.reconciler).complete_load(ticket, result);
        self.publish_composer();
        outcome
    }

    fn publish_composer(&self) {
        let state = lock(&self.reconciler).composer_state();
        self.composer.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }

    fn abort_reload(&self) {
        if let Some(task) = lock(&self.reload).take() {
            task.abort();
        }
    }
}

/// The chat view model of one session at a time.
///
/// Switching sessions with [`select`](Self::select) releases the previous
/// live subscription before the new one is acquired, and a history result
/// that arrives for a session no longer selected is discarded.
pub struct ChatSurface {
    core: Arc<SurfaceCore>,
    feed: Arc<dyn LiveFeed>,
    commands: Arc<dyn SessionCommands>,
    subscription: Mutex<Option<Subscription>>,
    draft: Mutex<String>,
}

impl ChatSurface {
    pub fn new(
        history: HistoryLoader,
        feed: Arc<dyn LiveFeed>,
        commands: Arc<dyn SessionCommands>,
    ) -> Self {
        let (composer, _) = watch::channel(ComposerState::Ready);
        Self {
            core: Arc::new(SurfaceCore {
                reconciler: Mutex::new(Reconciler::new()),
                key: Mutex::new(None),
                history,
                reload: Mutex::new(None),
                composer,
            }),
            feed,
            commands,
            subscription: Mutex::new(None),
            draft: Mutex::new(String::new()),
        }
    }

    // ============================================================================
    // Session switching
    // ============================================================================

    /// Binds the surface to `key` and loads its history.
    ///
    /// Live items arriving while the load is in flight are merged and then
    /// overwritten by the loaded history.
    pub async fn select(&self, key: SessionKey) -> LoadOutcome {
        self.bind(key, SessionLifecycle::default(), RuntimeStatus::default())
            .await
    }

    /// Like [`select`](Self::select), seeding lifecycle and runtime status
    /// from a session record.
    pub async fn open(&self, session: &Session) -> LoadOutcome {
        self.bind(session.key(), session.lifecycle, session.runtime)
            .await
    }

    async fn bind(
        &self,
        key: SessionKey,
        lifecycle: SessionLifecycle,
        runtime: RuntimeStatus,
    ) -> LoadOutcome {
        self.release_subscription();
        self.core.abort_reload();

        let ticket = {
            let mut reconciler = lock(&self.core.reconciler);
            let ticket = reconciler.select(key.session_id.clone());
            reconciler.set_lifecycle(lifecycle);
            reconciler.set_runtime_status(runtime);
            ticket
        };
        let previous = lock(&self.core.key).replace(key.clone());
        if previous.as_ref() != Some(&key) {
            lock(&self.draft).clear();
        }
        self.core.publish_composer();

        let weak = Arc::downgrade(&self.core);
        let handler: LiveHandler = Arc::new(move |item: LiveItem| {
            if let Some(core) = weak.upgrade() {
                core.on_live(item);
            }
        });
        let subscription = self.feed.subscribe(&key.session_id, handler);
        *lock(&self.subscription) = Some(subscription);
        tracing::info!(session = %key, "Chat surface bound");

        let result = self.core.history.load(&key).await;
        self.core.apply_load(&ticket, result)
    }

    /// Releases the live subscription and unbinds.
    pub fn close(&self) {
        self.release_subscription();
        self.core.abort_reload();
        lock(&self.core.reconciler).unbind();
        if let Some(key) = lock(&self.core.key).take() {
            tracing::info!(session = %key, "Chat surface closed");
        }
        lock(&self.draft).clear();
        self.core.publish_composer();
    }

    fn release_subscription(&self) {
        if let Some(mut subscription) = lock(&self.subscription).take() {
            subscription.release();
        }
    }

    /// Waits for an in-flight gap reload to finish.
    pub async fn settle(&self) {
        let task = lock(&self.core.reload).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::error!(error = %e, "Reload task failed");
                }
            }
        }
    }

    // ============================================================================
    // View state
    // ============================================================================

    pub fn session_key(&self) -> Option<SessionKey> {
        self.core.current_key()
    }

    /// Snapshot of the reconciled messages in sequence order.
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.core.reconciler).messages().to_vec()
    }

    pub fn cursor(&self) -> u64 {
        lock(&self.core.reconciler).cursor()
    }

    pub fn phase(&self) -> Phase {
        lock(&self.core.reconciler).phase()
    }

    pub fn toggle_collapse(&self, message_id: &str) -> bool {
        lock(&self.core.reconciler).toggle_collapse(message_id)
    }

    pub fn is_collapsed(&self, message_id: &str) -> bool {
        lock(&self.core.reconciler).is_collapsed(message_id)
    }

    pub fn runtime_status(&self) -> RuntimeStatus {
        lock(&self.core.reconciler).runtime_status()
    }

    pub fn composer_state(&self) -> ComposerState {
        lock(&self.core.reconciler).composer_state()
    }

    /// Observes composer state changes driven by status notifications.
    pub fn watch_composer(&self) -> watch::Receiver<ComposerState> {
        self.core.composer.subscribe()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        *lock(&self.draft) = text.into();
    }

    pub fn draft(&self) -> String {
        lock(&self.draft).clone()
    }

    // ============================================================================
    // Commands
    // ============================================================================

    /// Sends `text` to the bound session and clears the draft.
    ///
    /// Returns the client message id attached to the request.
    ///
    /// # Errors
    ///
    /// - `NoSessionSelected` when unbound
    /// - `SessionClosed` / `SessionBusy` when the composer is not ready
    /// - `EmptyMessage` for blank text
    /// - any error of the command backend
    pub async fn send(&self, text: &str) -> Result<String> {
        let key = self
            .core
            .current_key()
            .ok_or(MosaicError::NoSessionSelected)?;

        match self.composer_state() {
            ComposerState::Closed => return Err(MosaicError::SessionClosed(key.session_id)),
            ComposerState::Busy => return Err(MosaicError::SessionBusy(key.session_id)),
            ComposerState::Ready => {}
        }
        if text.trim().is_empty() {
            return Err(MosaicError::EmptyMessage);
        }

        let message = OutgoingMessage {
            content: text.to_string(),
            client_message_id: Uuid::new_v4().to_string(),
        };
        self.commands.send_message(&key, &message).await?;
        lock(&self.draft).clear();
        Ok(message.client_message_id)
    }

    /// Asks the node to stop the running turn of the bound session.
    pub async fn interrupt(&self) -> Result<()> {
        let key = self
            .core
            .current_key()
            .ok_or(MosaicError::NoSessionSelected)?;
        self.commands.interrupt(&key).await
    }
}

impl Drop for ChatSurface {
    fn drop(&mut self) {
        self.core.abort_reload();
    }
}
