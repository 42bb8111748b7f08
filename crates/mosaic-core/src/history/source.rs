//! History source trait.
//!
//! Defines the interface for fetching a session's persisted message log.

use crate::error::Result;
use crate::session::SessionKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page request against the history API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub scope_id: String,
    pub node_id: String,
    pub session_id: String,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl HistoryQuery {
    pub fn new(key: &SessionKey, page: u32, page_size: u32) -> Self {
        Self {
            scope_id: key.scope_id.clone(),
            node_id: key.node_id.clone(),
            session_id: key.session_id.clone(),
            page,
            page_size,
        }
    }
}

/// One page of history, ordered by sequence.
///
/// Rows stay undecoded here; the loader decodes them one at a time so that a
/// single bad row does not fail the page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default)]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

/// An abstract source of persisted session history.
///
/// This trait decouples the loader from the concrete transport
/// (HTTP API, fixtures in tests).
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Fetches one page of the session's message log.
    ///
    /// # Returns
    ///
    /// - `Ok(HistoryPage)`: The requested page (possibly empty)
    /// - `Err(_)`: Transport or decoding failure
    async fn fetch_page(&self, query: &HistoryQuery) -> Result<HistoryPage>;
}
