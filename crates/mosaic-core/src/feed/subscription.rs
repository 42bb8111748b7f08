use super::envelope::LiveItem;
use std::sync::Arc;

/// Callback invoked once per inbound live item.
pub type LiveHandler = Arc<dyn Fn(LiveItem) + Send + Sync>;

/// Source of per-session live items.
///
/// Implementations must stop invoking `handler` once the returned
/// [`Subscription`] is released or dropped.
pub trait LiveFeed: Send + Sync {
    fn subscribe(&self, session_id: &str, handler: LiveHandler) -> Subscription;
}

/// Registration handle returned by [`LiveFeed::subscribe`].
///
/// Releasing is idempotent; dropping the handle releases it.
pub struct Subscription {
    session_id: String,
    disposer: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(
        session_id: impl Into<String>,
        disposer: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            disposer: Some(Box::new(disposer)),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_active(&self) -> bool {
        self.disposer.is_some()
    }

    /// Unregisters the handler now.
    pub fn release(&mut self) {
        if let Some(dispose) = self.disposer.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("session_id", &self.session_id)
            .field("active", &self.is_active())
            .finish()
    }
}
