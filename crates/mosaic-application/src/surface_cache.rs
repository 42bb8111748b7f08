use crate::chat_surface::ChatSurface;
use mosaic_core::feed::LiveFeed;
use mosaic_core::history::HistoryLoader;
use mosaic_core::session::{SessionCommands, SessionKey};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps the chat surfaces of recently viewed sessions alive.
///
/// A multi-session view switches between panes without losing drafts or
/// reloading history. At most `max_alive` surfaces are kept; the least
/// recently activated one is closed when the cap is exceeded.
pub struct SurfaceCache {
    history: HistoryLoader,
    feed: Arc<dyn LiveFeed>,
    commands: Arc<dyn SessionCommands>,
    max_alive: usize,
    /// Least recently activated first.
    surfaces: RwLock<Vec<(String, Arc<ChatSurface>)>>,
}

impl SurfaceCache {
    pub fn new(
        history: HistoryLoader,
        feed: Arc<dyn LiveFeed>,
        commands: Arc<dyn SessionCommands>,
        max_alive: usize,
    ) -> Self {
        Self {
            history,
            feed,
            commands,
            max_alive: max_alive.max(1),
            surfaces: RwLock::new(Vec::new()),
        }
    }

    /// Returns the surface of `key`, creating and binding it if needed.
    ///
    /// A new surface is inserted before its history is loaded, so a
    /// concurrent activation of the same session reuses it.
    pub async fn activate(&self, key: SessionKey) -> Arc<ChatSurface> {
        let (surface, evicted) = {
            let mut surfaces = self.surfaces.write().await;
            if let Some(pos) = surfaces.iter().position(|(id, _)| *id == key.session_id) {
                let entry = surfaces.remove(pos);
                let surface = entry.1.clone();
                surfaces.push(entry);
                return surface;
            }

            let surface = Arc::new(ChatSurface::new(
                self.history.clone(),
                self.feed.clone(),
                self.commands.clone(),
            ));
            surfaces.push((key.session_id.clone(), surface.clone()));
            let excess = surfaces.len().saturating_sub(self.max_alive);
            let evicted: Vec<_> = surfaces.drain(..excess).collect();
            (surface, evicted)
        };

        for (session_id, stale) in evicted {
            tracing::debug!(session_id = %session_id, "Evicting chat surface");
            stale.close();
        }

        surface.select(key).await;
        surface
    }

    /// Gets a cached surface without touching its recency.
    pub async fn get(&self, session_id: &str) -> Option<Arc<ChatSurface>> {
        let surfaces = self.surfaces.read().await;
        surfaces
            .iter()
            .find(|(id, _)| id == session_id)
            .map(|(_, surface)| surface.clone())
    }

    /// Closes and forgets the surface of `session_id`.
    pub async fn remove(&self, session_id: &str) -> bool {
        let removed = {
            let mut surfaces = self.surfaces.write().await;
            let pos = surfaces.iter().position(|(id, _)| id == session_id);
            pos.map(|pos| surfaces.remove(pos))
        };
        match removed {
            Some((_, surface)) => {
                surface.close();
                true
            }
            None => false,
        }
    }

    /// Closes every cached surface.
    pub async fn clear(&self) {
        let drained: Vec<_> = self.surfaces.write().await.drain(..).collect();
        for (_, surface) in drained {
            surface.close();
        }
    }

    /// Cached session ids, least recently activated first.
    pub async fn session_ids(&self) -> Vec<String> {
        let surfaces = self.surfaces.read().await;
        surfaces.iter().map(|(id, _)| id.clone()).collect()
    }

    pub async fn len(&self) -> usize {
        self.surfaces.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.surfaces.read().await.is_empty()
    }
}
