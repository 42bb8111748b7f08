use super::store::{CollapseSet, ReconciledStore};
use crate::error::MosaicError;
use crate::feed::{LiveItem, LiveNotification, SessionSignal};
use crate::message::{Message, MessageType};
use crate::session::{ComposerState, RuntimeStatus, SessionLifecycle};

/// Binding state of a reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No session selected.
    Unbound,
    /// A history load for the bound session is in flight.
    Loading,
    /// The store reflects the bound session (possibly stale after a failed load).
    Bound,
}

/// Identifies one history load.
///
/// A result is only applied while the ticket still matches the bound session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    session_id: String,
    epoch: u64,
}

impl LoadTicket {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Why a live item did not change the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Unbound,
    ErrorEnvelope,
    ForeignSession,
    TransportOutput,
    /// A notification without a recognised signal.
    Notification,
    Malformed,
    Duplicate,
}

/// Result of [`Reconciler::apply_live`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveOutcome {
    Appended { id: String, sequence: u64 },
    Signal(SessionSignal),
    /// A gap was detected; the item was not merged and a full reload is due.
    ResyncRequired(LoadTicket),
    Ignored(IgnoreReason),
}

/// Result of [`Reconciler::complete_load`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Applied { count: usize, cursor: u64 },
    /// Load failed; previous state kept.
    Failed(MosaicError),
    /// The ticket belongs to a superseded binding; result discarded.
    Stale,
}

/// Reconciles history loads and live deliveries into one ordered message list.
///
/// Owns the reconciled store, the cursor, and the collapse set of exactly one
/// bound session. All mutation goes through [`select`](Self::select),
/// [`complete_load`](Self::complete_load) and [`apply_live`](Self::apply_live).
#[derive(Debug)]
pub struct Reconciler {
    phase: Phase,
    session_id: Option<String>,
    epoch: u64,
    cursor: u64,
    store: ReconciledStore,
    collapsed: CollapseSet,
    runtime: RuntimeStatus,
    lifecycle: SessionLifecycle,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            phase: Phase::Unbound,
            session_id: None,
            epoch: 0,
            cursor: 0,
            store: ReconciledStore::new(),
            collapsed: CollapseSet::new(),
            runtime: RuntimeStatus::default(),
            lifecycle: SessionLifecycle::default(),
        }
    }

    // ============================================================================
    // Session switching
    // ============================================================================

    /// Binds `session_id`, discarding all state of the previous binding.
    ///
    /// Returns the ticket for the initial history load.
    pub fn select(&mut self, session_id: impl Into<String>) -> LoadTicket {
        self.reset();
        self.epoch += 1;
        let session_id = session_id.into();
        tracing::debug!(session_id = %session_id, epoch = self.epoch, "Session selected");
        self.session_id = Some(session_id.clone());
        self.phase = Phase::Loading;
        LoadTicket {
            session_id,
            epoch: self.epoch,
        }
    }

    /// Drops the binding. Any in-flight load becomes stale.
    pub fn unbind(&mut self) {
        self.reset();
        self.epoch += 1;
        self.session_id = None;
        self.phase = Phase::Unbound;
    }

    /// Starts a full reload of the bound session.
    ///
    /// Returns `None` when no session is bound.
    pub fn begin_reload(&mut self) -> Option<LoadTicket> {
        let session_id = self.session_id.clone()?;
        self.phase = Phase::Loading;
        Some(LoadTicket {
            session_id,
            epoch: self.epoch,
        })
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.store.clear();
        self.collapsed.clear();
        self.runtime = RuntimeStatus::default();
        self.lifecycle = SessionLifecycle::default();
    }

    fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.epoch == self.epoch && self.session_id.as_deref() == Some(ticket.session_id.as_str())
    }

    // ============================================================================
    // History path
    // ============================================================================

    /// Applies the result of the history load identified by `ticket`.
    ///
    /// On success the store is replaced wholesale, the cursor set to the
    /// highest sequence, and default-collapsed messages seeded into the
    /// collapse set. On failure the previous state is kept.
    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Vec<Message>, MosaicError>,
    ) -> LoadOutcome {
        if !self.is_current(ticket) {
            tracing::debug!(
                session_id = %ticket.session_id,
                "Discarding history result of superseded session"
            );
            return LoadOutcome::Stale;
        }

        self.phase = Phase::Bound;
        match result {
            Ok(messages) => {
                self.store.replace(messages);
                self.cursor = self.store.max_sequence();
                self.collapsed.clear();
                for message in self.store.messages() {
                    self.collapsed.observe(message);
                }
                tracing::debug!(
                    session_id = %ticket.session_id,
                    count = self.store.len(),
                    cursor = self.cursor,
                    "History applied"
                );
                LoadOutcome::Applied {
                    count: self.store.len(),
                    cursor: self.cursor,
                }
            }
            Err(err) => {
                tracing::warn!(
                    session_id = %ticket.session_id,
                    error = %err,
                    "History load failed; keeping previous messages"
                );
                LoadOutcome::Failed(err)
            }
        }
    }

    // ============================================================================
    // Live path
    // ============================================================================

    /// Merges one live item.
    ///
    /// Never fails: every problem is logged and reported as an outcome.
    pub fn apply_live(&mut self, item: LiveItem) -> LiveOutcome {
        let Some(bound) = self.session_id.as_deref() else {
            return LiveOutcome::Ignored(IgnoreReason::Unbound);
        };

        if let LiveItem::Error { message } = &item {
            tracing::warn!(session_id = %bound, error = %message, "Live feed reported an error");
            return LiveOutcome::Ignored(IgnoreReason::ErrorEnvelope);
        }

        if item.session_id() != Some(bound) {
            return LiveOutcome::Ignored(IgnoreReason::ForeignSession);
        }

        if let Some(sequence) = item.sequence() {
            if self.cursor != 0 && sequence > self.cursor.saturating_add(1) {
                tracing::info!(
                    session_id = %bound,
                    cursor = self.cursor,
                    sequence,
                    "Sequence gap detected; full reload required"
                );
                // begin_reload only fails when unbound, which was ruled out above
                return match self.begin_reload() {
                    Some(ticket) => LiveOutcome::ResyncRequired(ticket),
                    None => LiveOutcome::Ignored(IgnoreReason::Unbound),
                };
            }
            self.cursor = self.cursor.max(sequence);
        }

        match item {
            LiveItem::Message(live) => {
                if live.message_type.is_transport_output() {
                    return LiveOutcome::Ignored(IgnoreReason::TransportOutput);
                }
                let message = match live.into_message() {
                    Ok(message) => message,
                    Err(err) => {
                        tracing::error!(error = %err, "Dropping malformed live message");
                        return LiveOutcome::Ignored(IgnoreReason::Malformed);
                    }
                };
                self.merge(message)
            }
            LiveItem::Notification(notification) => self.interpret(notification),
            LiveItem::Error { .. } => LiveOutcome::Ignored(IgnoreReason::ErrorEnvelope),
        }
    }

    fn merge(&mut self, message: Message) -> LiveOutcome {
        if self.store.contains(&message.id) {
            tracing::debug!(id = %message.id, "Duplicate live message dropped");
            return LiveOutcome::Ignored(IgnoreReason::Duplicate);
        }
        self.collapsed.observe(&message);
        let outcome = LiveOutcome::Appended {
            id: message.id.clone(),
            sequence: message.sequence,
        };
        self.store.push(message);
        outcome
    }

    fn interpret(&mut self, notification: LiveNotification) -> LiveOutcome {
        let Some(signal) = notification.signal() else {
            if matches!(
                notification.message_type,
                MessageType::RuntimeStatusChanged | MessageType::SessionStatusChanged
            ) {
                tracing::warn!(payload = %notification.payload, "Unrecognised status notification");
            }
            return LiveOutcome::Ignored(IgnoreReason::Notification);
        };

        match signal {
            SessionSignal::RuntimeStatus(status) => self.runtime = status,
            SessionSignal::Lifecycle(lifecycle) => self.lifecycle = lifecycle,
        }
        LiveOutcome::Signal(signal)
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    /// Messages in storage order (ascending sequence).
    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn toggle_collapse(&mut self, message_id: &str) -> bool {
        self.collapsed.toggle(message_id)
    }

    pub fn is_collapsed(&self, message_id: &str) -> bool {
        self.collapsed.contains(message_id)
    }

    pub fn collapsed_count(&self) -> usize {
        self.collapsed.len()
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn runtime_status(&self) -> RuntimeStatus {
        self.runtime
    }

    pub fn lifecycle(&self) -> SessionLifecycle {
        self.lifecycle
    }

    /// Seeds the lifecycle from the session record (e.g. a closed session
    /// selected from a list).
    pub fn set_lifecycle(&mut self, lifecycle: SessionLifecycle) {
        self.lifecycle = lifecycle;
    }

    pub fn set_runtime_status(&mut self, status: RuntimeStatus) {
        self.runtime = status;
    }

    pub fn composer_state(&self) -> ComposerState {
        ComposerState::derive(self.lifecycle, self.runtime)
    }
}
