pub mod config;
pub mod history;
pub mod send;
pub mod sessions;
pub mod tail;

use anyhow::Result;
use clap::Args;
use mosaic_core::history::HistoryLoader;
use mosaic_core::session::SessionKey;
use mosaic_infrastructure::{HttpMosaicClient, MosaicConfig};
use std::sync::Arc;
use std::time::Duration;

/// Positional address of one session.
#[derive(Args, Debug, Clone)]
pub struct SessionTarget {
    /// Conversation scope id
    pub scope: String,
    /// Node id
    pub node: String,
    /// Session id
    pub session: String,
}

impl SessionTarget {
    pub fn key(&self) -> SessionKey {
        SessionKey::new(&self.scope, &self.node, &self.session)
    }
}

/// Shared state of one CLI invocation.
pub struct Context {
    pub config: MosaicConfig,
    pub client: Arc<HttpMosaicClient>,
}

impl Context {
    pub fn new(config: MosaicConfig) -> Result<Self> {
        let client = HttpMosaicClient::new(
            &config.server.base_url,
            Duration::from_secs(config.server.request_timeout_secs),
        )?;
        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    pub fn loader(&self) -> HistoryLoader {
        HistoryLoader::new(self.client.clone()).with_page_size(self.config.history.page_size)
    }
}
