//! HTTP client for the mosaic REST API.
//!
//! Serves as the [`HistorySource`] of chat surfaces and as their
//! [`SessionCommands`] backend.

use async_trait::async_trait;
use mosaic_core::error::{MosaicError, Result};
use mosaic_core::history::{HistoryPage, HistoryQuery, HistorySource};
use mosaic_core::session::{OutgoingMessage, Session, SessionCommands, SessionKey};
use reqwest::{Client, Response, Url};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpMosaicClient {
    client: Client,
    base_url: Url,
}

impl HttpMosaicClient {
    /// Creates a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns a config error if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| MosaicError::config(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(MosaicError::config(format!(
                "base URL '{base_url}' cannot carry a path"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MosaicError::transport(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MosaicError::config(format!("base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn session_url(&self, key: &SessionKey, tail: &str) -> Result<Url> {
        self.url(&[
            "scopes",
            key.scope_id.as_str(),
            "nodes",
            key.node_id.as_str(),
            "sessions",
            key.session_id.as_str(),
            tail,
        ])
    }

    /// Lists the sessions of a node.
    pub async fn list_sessions(&self, scope_id: &str, node_id: &str) -> Result<Vec<Session>> {
        let url = self.url(&["scopes", scope_id, "nodes", node_id, "sessions"])?;
        let response = self.client.get(url).send().await.map_err(map_reqwest)?;
        let body = ensure_success(response).await?.bytes().await.map_err(map_reqwest)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl HistorySource for HttpMosaicClient {
    async fn fetch_page(&self, query: &HistoryQuery) -> Result<HistoryPage> {
        let key = SessionKey::new(&query.scope_id, &query.node_id, &query.session_id);
        let url = self.session_url(&key, "messages")?;
        tracing::debug!(%url, page = query.page, page_size = query.page_size, "Fetching history");

        let response = self
            .client
            .get(url)
            .query(&[("page", query.page), ("page_size", query.page_size)])
            .send()
            .await
            .map_err(map_reqwest)?;
        let body = ensure_success(response).await?.bytes().await.map_err(map_reqwest)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl SessionCommands for HttpMosaicClient {
    async fn send_message(&self, key: &SessionKey, message: &OutgoingMessage) -> Result<()> {
        let url = self.session_url(key, "messages")?;
        let response = self
            .client
            .post(url)
            .json(message)
            .send()
            .await
            .map_err(map_reqwest)?;
        ensure_success(response).await?;
        tracing::info!(session = %key, client_message_id = %message.client_message_id, "Message sent");
        Ok(())
    }

    async fn interrupt(&self, key: &SessionKey) -> Result<()> {
        let url = self.session_url(key, "interrupt")?;
        let response = self.client.post(url).send().await.map_err(map_reqwest)?;
        ensure_success(response).await?;
        tracing::info!(session = %key, "Interrupt requested");
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body
    };
    Err(MosaicError::http(status.as_u16(), message))
}

fn map_reqwest(err: reqwest::Error) -> MosaicError {
    if err.is_decode() {
        MosaicError::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    } else if let Some(status) = err.status() {
        MosaicError::http(status.as_u16(), err.to_string())
    } else {
        MosaicError::transport(err.to_string())
    }
}
