use crate::message::Message;
use std::collections::HashSet;

/// Ordered, deduplicated message list of one session.
///
/// Storage order equals ascending sequence order.
#[derive(Debug, Default)]
pub struct ReconciledStore {
    messages: Vec<Message>,
    ids: HashSet<String>,
}

impl ReconciledStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole content.
    ///
    /// Input is sorted by sequence and duplicate ids are dropped (first wins).
    pub fn replace(&mut self, mut messages: Vec<Message>) {
        messages.sort_by_key(|m| m.sequence);
        self.ids.clear();
        self.messages.clear();
        for message in messages {
            if self.ids.insert(message.id.clone()) {
                self.messages.push(message);
            }
        }
    }

    /// Appends `message` unless its id is already present.
    ///
    /// A late message with a lower sequence than the tail is inserted at its
    /// ordered position. Returns `false` for duplicates.
    pub fn push(&mut self, message: Message) -> bool {
        if !self.ids.insert(message.id.clone()) {
            return false;
        }
        let out_of_order = self
            .messages
            .last()
            .is_some_and(|last| last.sequence > message.sequence);
        if out_of_order {
            let at = self
                .messages
                .partition_point(|m| m.sequence <= message.sequence);
            self.messages.insert(at, message);
        } else {
            self.messages.push(message);
        }
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn max_sequence(&self) -> u64 {
        self.messages.iter().map(|m| m.sequence).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.ids.clear();
    }
}

/// Message ids the view renders collapsed.
#[derive(Debug, Default)]
pub struct CollapseSet {
    ids: HashSet<String>,
}

impl CollapseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership and returns the new collapsed state.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Adds `message` if its type is collapsed by default.
    pub fn observe(&mut self, message: &Message) {
        if message.is_collapsed_by_default() {
            self.ids.insert(message.id.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
