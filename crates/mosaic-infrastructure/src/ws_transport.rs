//! WebSocket live transport.
//!
//! One socket carries the live items of every session in a scope. Frames are
//! routed into a [`FeedHub`] (per-session subscribers) and every status
//! notification is also published on the [`EventBus`] for cross-session
//! listeners.

use futures_util::StreamExt;
use mosaic_core::bus::{EventBus, RuntimeStatusChanged, SessionLifecycleChanged};
use mosaic_core::error::{MosaicError, Result};
use mosaic_core::feed::{FeedHub, LiveItem, SessionSignal};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// What happened to one inbound text frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Number of feed handlers that received the item.
    Dispatched(usize),
    /// The frame was not a valid live item.
    Unparseable,
}

/// Parses one text frame and routes it.
pub fn route_frame(hub: &FeedHub, bus: &EventBus, text: &str) -> FrameOutcome {
    let item: LiveItem = match serde_json::from_str(text) {
        Ok(item) => item,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping unparseable live frame");
            return FrameOutcome::Unparseable;
        }
    };

    if let LiveItem::Notification(notification) = &item {
        match notification.signal() {
            Some(SessionSignal::RuntimeStatus(status)) => {
                bus.runtime_status.publish(RuntimeStatusChanged {
                    session_id: notification.session_id.clone(),
                    status,
                });
            }
            Some(SessionSignal::Lifecycle(lifecycle)) => {
                bus.lifecycle.publish(SessionLifecycleChanged {
                    session_id: notification.session_id.clone(),
                    lifecycle,
                });
            }
            None => {}
        }
    }

    FrameOutcome::Dispatched(hub.dispatch(item))
}

/// A connected WebSocket feeding a [`FeedHub`].
///
/// The reader task stops when the server closes the socket, on a socket
/// error, or when the transport is shut down or dropped.
pub struct WsLiveTransport {
    hub: FeedHub,
    bus: EventBus,
    reader: JoinHandle<()>,
}

impl WsLiveTransport {
    /// Connects to `url` and starts routing frames.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the handshake fails.
    pub async fn connect(url: &str, hub: FeedHub, bus: EventBus) -> Result<Self> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| MosaicError::transport(format!("failed to connect to {url}: {e}")))?;
        tracing::info!(url, "Live transport connected");

        let (_, mut frames) = stream.split();
        let reader_hub = hub.clone();
        let reader_bus = bus.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = frames.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        route_frame(&reader_hub, &reader_bus, text.as_str());
                    }
                    Ok(Message::Close(reason)) => {
                        tracing::info!(?reason, "Live transport closed by server");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Live transport failed");
                        reader_hub.dispatch(LiveItem::Error {
                            message: e.to_string(),
                        });
                        break;
                    }
                }
            }
        });

        Ok(Self { hub, bus, reader })
    }

    /// The per-session feed served by this transport.
    pub fn hub(&self) -> &FeedHub {
        &self.hub
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn is_connected(&self) -> bool {
        !self.reader.is_finished()
    }

    /// Waits until the server closes the socket.
    pub async fn closed(&mut self) {
        if let Err(e) = (&mut self.reader).await {
            if !e.is_cancelled() {
                tracing::error!(error = %e, "Live transport reader failed");
            }
        }
    }

    pub fn shutdown(&self) {
        self.reader.abort();
    }
}

impl Drop for WsLiveTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::feed::{LiveFeed, LiveHandler};
    use mosaic_core::session::RuntimeStatus;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_route_message_frame_to_subscriber() {
        let hub = FeedHub::new();
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: LiveHandler =
            Arc::new(move |item: LiveItem| sink.lock().unwrap().push(item));
        let _sub = hub.subscribe("s-1", handler);

        let outcome = route_frame(
            &hub,
            &bus,
            r#"{"kind":"message","session_id":"s-1","message_id":"m-1","sequence":1,
                "role":"user","message_type":"text","payload":"hello"}"#,
        );

        assert_eq!(outcome, FrameOutcome::Dispatched(1));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_notification_reaches_bus_even_without_subscriber() {
        let hub = FeedHub::new();
        let bus = EventBus::new();
        let mut runtime = bus.runtime_status.subscribe();

        let outcome = route_frame(
            &hub,
            &bus,
            r#"{"kind":"notification","session_id":"s-7","message_type":"runtime_status_changed",
                "payload":{"status":"busy"}}"#,
        );

        assert_eq!(outcome, FrameOutcome::Dispatched(0));
        let event = runtime.try_recv().unwrap();
        assert_eq!(event.session_id, "s-7");
        assert_eq!(event.status, RuntimeStatus::Busy);
    }

    #[test]
    fn test_garbage_frame() {
        let hub = FeedHub::new();
        let bus = EventBus::new();
        assert_eq!(route_frame(&hub, &bus, "not json"), FrameOutcome::Unparseable);
    }
}
