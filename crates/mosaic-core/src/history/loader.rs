use super::source::{HistoryQuery, HistorySource};
use crate::error::{MosaicError, Result};
use crate::message::{Message, WireMessage};
use crate::session::SessionKey;
use std::collections::HashSet;
use std::sync::Arc;

/// Page size large enough to fetch a complete session log in one request.
pub const FULL_HISTORY_PAGE_SIZE: u32 = 10_000;

/// Fetches and decodes the complete message log of a session.
#[derive(Clone)]
pub struct HistoryLoader {
    source: Arc<dyn HistorySource>,
    page_size: u32,
}

impl HistoryLoader {
    pub fn new(source: Arc<dyn HistorySource>) -> Self {
        Self {
            source,
            page_size: FULL_HISTORY_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Loads every message of `key`, sorted by sequence.
    ///
    /// Asks for one oversized page first and follows further pages only if
    /// the source reports them. Rows that fail to decode are skipped, as are
    /// transport output rows, which the live path never shows either.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error; nothing is returned partially.
    pub async fn load(&self, key: &SessionKey) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        let mut page = 1;

        loop {
            let query = HistoryQuery::new(key, page, self.page_size);
            let result = self.source.fetch_page(&query).await?;
            let fetched = result.messages.len();

            for row in result.messages {
                let decoded = serde_json::from_value::<WireMessage>(row)
                    .map_err(MosaicError::from)
                    .and_then(|wire| wire.into_message(&key.session_id));
                match decoded {
                    Ok(message) if message.kind.is_transport_output() => {
                        tracing::debug!(session = %key, id = %message.id, "Skipping transport output row");
                    }
                    Ok(message) => messages.push(message),
                    Err(err) => {
                        tracing::warn!(session = %key, error = %err, "Skipping history row")
                    }
                }
            }

            if fetched == 0 || page >= result.total_pages {
                break;
            }
            page += 1;
        }

        messages.sort_by_key(|m| m.sequence);
        let mut seen = HashSet::new();
        messages.retain(|m| seen.insert(m.id.clone()));

        tracing::debug!(session = %key, count = messages.len(), pages = page, "History loaded");
        Ok(messages)
    }
}
