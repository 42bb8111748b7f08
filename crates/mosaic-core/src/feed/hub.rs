//! In-process live feed multiplexer.

use super::envelope::LiveItem;
use super::subscription::{LiveFeed, LiveHandler, Subscription};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type HandlerTable = HashMap<String, Vec<(u64, LiveHandler)>>;

#[derive(Default)]
struct HubInner {
    handlers: Mutex<HandlerTable>,
    next_id: AtomicU64,
}

impl HubInner {
    fn remove(&self, session_id: &str, id: u64) {
        let mut table = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entries) = table.get_mut(session_id) {
            entries.retain(|(entry_id, _)| *entry_id != id);
            if entries.is_empty() {
                table.remove(session_id);
            }
        }
    }
}

/// Routes items from one shared transport to per-session handlers.
///
/// - Items addressed to a session reach only that session's handlers.
/// - Error envelopes reach every handler.
/// - A panicking handler is logged and stays registered.
#[derive(Clone, Default)]
pub struct FeedHub {
    inner: Arc<HubInner>,
}

impl FeedHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `item` and returns how many handlers received it.
    pub fn dispatch(&self, item: LiveItem) -> usize {
        let targets: Vec<LiveHandler> = {
            let table = self
                .inner
                .handlers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match item.session_id() {
                Some(session_id) => table
                    .get(session_id)
                    .map(|entries| entries.iter().map(|(_, h)| h.clone()).collect())
                    .unwrap_or_default(),
                None => table
                    .values()
                    .flat_map(|entries| entries.iter().map(|(_, h)| h.clone()))
                    .collect(),
            }
        };

        if targets.is_empty() {
            tracing::trace!(session_id = ?item.session_id(), "No subscriber for live item");
        }

        for handler in &targets {
            let delivered = item.clone();
            if catch_unwind(AssertUnwindSafe(|| handler(delivered))).is_err() {
                tracing::error!(
                    session_id = ?item.session_id(),
                    "Live handler panicked; subscription kept"
                );
            }
        }

        targets.len()
    }

    /// Number of live handlers registered for `session_id`.
    pub fn subscriber_count(&self, session_id: &str) -> usize {
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .map_or(0, Vec::len)
    }
}

impl LiveFeed for FeedHub {
    fn subscribe(&self, session_id: &str, handler: LiveHandler) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(session_id.to_string())
            .or_default()
            .push((id, handler));

        tracing::debug!(session_id, subscription = id, "Live feed subscribed");

        let weak: Weak<HubInner> = Arc::downgrade(&self.inner);
        let owned_session = session_id.to_string();
        Subscription::new(session_id, move || {
            if let Some(inner) = weak.upgrade() {
                inner.remove(&owned_session, id);
                tracing::debug!(session_id = %owned_session, subscription = id, "Live feed released");
            }
        })
    }
}
