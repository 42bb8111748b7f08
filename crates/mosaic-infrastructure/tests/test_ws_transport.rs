use futures_util::SinkExt;
use mosaic_core::bus::EventBus;
use mosaic_core::feed::{FeedHub, LiveFeed, LiveHandler, LiveItem, Subscription};
use mosaic_core::session::RuntimeStatus;
use mosaic_infrastructure::WsLiveTransport;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

const MESSAGE_FRAME: &str = r#"{"kind":"message","session_id":"s-1","message_id":"m-1",
    "sequence":1,"role":"user","message_type":"text","payload":"hello"}"#;

const STATUS_FRAME: &str = r#"{"kind":"notification","session_id":"s-1",
    "message_type":"runtime_status_changed","payload":{"status":"busy"}}"#;

/// Accepts one socket, sends `frames`, then either closes cleanly or just
/// drops the connection.
async fn serve(frames: Vec<&'static str>, clean_close: bool) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
        for frame in frames {
            socket.send(Message::Text(frame.into())).await.unwrap();
        }
        if clean_close {
            socket.send(Message::Close(None)).await.unwrap();
        }
    });
    (url, server)
}

fn recorder(hub: &FeedHub, session_id: &str) -> (Arc<Mutex<Vec<LiveItem>>>, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler: LiveHandler = Arc::new(move |item: LiveItem| sink.lock().unwrap().push(item));
    (seen, hub.subscribe(session_id, handler))
}

async fn wait_closed(transport: &mut WsLiveTransport) {
    tokio::time::timeout(Duration::from_secs(5), transport.closed())
        .await
        .expect("reader task did not stop");
}

#[tokio::test]
async fn test_reader_routes_frames_and_reports_dropped_socket() {
    let (url, server) = serve(vec![MESSAGE_FRAME, "garbage", STATUS_FRAME], false).await;
    let hub = FeedHub::new();
    let bus = EventBus::new();
    let mut runtime = bus.runtime_status.subscribe();
    let (seen, _sub) = recorder(&hub, "s-1");

    let mut transport = WsLiveTransport::connect(&url, hub, bus).await.unwrap();
    server.await.unwrap();
    wait_closed(&mut transport).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3, "unexpected items: {seen:?}");
    assert!(matches!(&seen[0], LiveItem::Message(m) if m.sequence == Some(1)));
    assert!(matches!(&seen[1], LiveItem::Notification(_)));
    assert!(matches!(&seen[2], LiveItem::Error { .. }));
    assert!(!transport.is_connected());

    let event = runtime.try_recv().unwrap();
    assert_eq!(event.session_id, "s-1");
    assert_eq!(event.status, RuntimeStatus::Busy);
}

#[tokio::test]
async fn test_clean_close_stops_reader_without_error() {
    let (url, server) = serve(vec![MESSAGE_FRAME], true).await;
    let hub = FeedHub::new();
    let (seen, _sub) = recorder(&hub, "s-1");

    let mut transport = WsLiveTransport::connect(&url, hub, EventBus::new())
        .await
        .unwrap();
    server.await.unwrap();
    wait_closed(&mut transport).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1, "unexpected items: {seen:?}");
    assert!(matches!(&seen[0], LiveItem::Message(_)));
    assert!(!transport.is_connected());
}
