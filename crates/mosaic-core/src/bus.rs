//! Typed event bus for cross-session notifications.
//!
//! Per-session chat logic consumes only its own live feed. Anything that
//! cares about every session (session lists, node cards) subscribes to a
//! topic here instead.

use crate::session::{RuntimeStatus, SessionLifecycle};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const DEFAULT_TOPIC_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStatusChanged {
    pub session_id: String,
    pub status: RuntimeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLifecycleChanged {
    pub session_id: String,
    pub lifecycle: SessionLifecycle,
}

/// A broadcast channel carrying one event type.
#[derive(Debug, Clone)]
pub struct Topic<E: Clone> {
    sender: broadcast::Sender<E>,
}

impl<E: Clone> Topic<E> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes `event`; returns the number of receivers.
    ///
    /// Publishing without receivers is not an error.
    pub fn publish(&self, event: E) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// The set of typed topics shared by transport and surfaces.
#[derive(Debug, Clone)]
pub struct EventBus {
    pub runtime_status: Topic<RuntimeStatusChanged>,
    pub lifecycle: Topic<SessionLifecycleChanged>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TOPIC_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            runtime_status: Topic::new(capacity),
            lifecycle: Topic::new(capacity),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
