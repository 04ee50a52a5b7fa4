// Shared primitives for one-time server bootstrapping and websocket access across integration tests.
#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::{
    // `Arc` shares data between threads; `OnceLock` writes a value only once.
    sync::{Arc, OnceLock},
    // Sleep durations are used in readiness polling loops.
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

// Client side of one websocket connection to the test server.
pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Longest wait for any single server frame before a test fails.
const RECV_TIMEOUT: Duration = Duration::from_secs(3);
// Frames skipped while looking for a specific event (room list broadcasts are noisy).
const MAX_SKIPPED_EVENTS: usize = 200;

// Global base URL used by all tests after the server publishes its bound address.
static SERVER_URL: OnceLock<String> = OnceLock::new();
// One-time guard that ensures the server bootstrap path runs only once.
static SERVER_READY: OnceLock<()> = OnceLock::new();

// Ensure the test server is running and return the shared base URL.
pub fn ensure_server() -> &'static str {
    // Run initialization exactly once even if multiple tests call this function.
    SERVER_READY.get_or_init(|| {
        // Local one-time slot where the server thread publishes its selected URL.
        let published_url = Arc::new(OnceLock::<String>::new());
        // Clone so the spawned thread can write into the same shared slot.
        let published_url_thread = Arc::clone(&published_url);
        // Spawn an OS thread so the server outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            // Each server thread owns its own Tokio runtime.
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            // Run async server startup and serving on this dedicated runtime.
            runtime.block_on(async move {
                // Bind to an ephemeral port to avoid collisions with local services.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                // Capture the exact address that was assigned by the OS.
                let addr = listener.local_addr().expect("get local addr");
                // Publish the final base URL so test code can target the right server.
                let _ = published_url_thread.set(format!("http://{}", addr));
                // Start serving requests until the test process exits.
                arena_server::run(listener).await.expect("server failed");
            });
        });
        // Block until URL is published and the bound port starts accepting connections.
        wait_for_server_url_and_readiness(published_url);
    });

    // Return the stable shared URL used by all tests in this binary.
    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

// Wait for URL publication and then wait for the server socket to accept TCP connections.
fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    // Poll until the server thread publishes the base URL.
    let base_url = loop {
        // If the URL is published, clone it and stop waiting.
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        // Avoid a tight loop while waiting for the background thread.
        std::thread::sleep(Duration::from_millis(10));
    };

    // Persist the URL globally so every test gets the same endpoint.
    let _ = SERVER_URL.set(base_url.clone());

    // Strip the scheme so we can use host:port for raw TCP readiness checks.
    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    // Retry for a short period to avoid racing server bind/accept.
    for _ in 0..100 {
        // Successful connect means the server socket is accepting connections.
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        // Wait briefly before the next readiness probe.
        std::thread::sleep(Duration::from_millis(20));
    }

    // Fail fast if startup never reached an accepting state.
    panic!("server did not become ready in time");
}

// Open a websocket against the shared test server.
pub async fn connect_ws() -> WsClient {
    let base_url = ensure_server();
    // Same host and port, websocket scheme.
    let url = format!("{}/ws", base_url.replacen("http://", "ws://", 1));
    let (ws, _response) = tokio_tungstenite::connect_async(url)
        .await
        .expect("websocket handshake");
    ws
}

// Send one `{event, data}` frame; `data` is omitted when `None`.
pub async fn send_event(ws: &mut WsClient, event: &str, data: Option<Value>) {
    let frame = match data {
        Some(data) => serde_json::json!({ "event": event, "data": data }),
        None => serde_json::json!({ "event": event }),
    };
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .expect("send frame");
}

// Next text frame, decoded as JSON. Control frames are skipped.
pub async fn next_event(ws: &mut WsClient) -> Value {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("server frame before timeout")
            .expect("stream still open")
            .expect("valid frame");
        match frame {
            Message::Text(text) => return serde_json::from_str(text.as_str()).expect("json frame"),
            Message::Close(frame) => panic!("server closed the socket: {frame:?}"),
            _ => continue,
        }
    }
}

// Skip frames until `event` arrives and return its `data`.
pub async fn wait_for(ws: &mut WsClient, event: &str) -> Value {
    for _ in 0..MAX_SKIPPED_EVENTS {
        let mut frame = next_event(ws).await;
        if frame["event"] == event {
            return frame["data"].take();
        }
    }
    panic!("`{event}` never arrived");
}

// Skip frames until one matches `event` and satisfies `accept`.
pub async fn wait_for_matching(
    ws: &mut WsClient,
    event: &str,
    accept: impl Fn(&Value) -> bool,
) -> Value {
    for _ in 0..MAX_SKIPPED_EVENTS {
        let data = wait_for(ws, event).await;
        if accept(&data) {
            return data;
        }
    }
    panic!("no matching `{event}` arrived");
}

// Create a custom room and return its id.
pub async fn create_room(ws: &mut WsClient, name: &str, max_players: u32) -> String {
    send_event(
        ws,
        "create_room",
        Some(serde_json::json!({ "name": name, "maxPlayers": max_players })),
    )
    .await;
    let created = wait_for(ws, "room_created").await;
    created["roomId"]
        .as_str()
        .expect("room id string")
        .to_string()
}

// Join `room_id` and return the `join_room_result` payload.
pub async fn join_room(ws: &mut WsClient, room_id: &str, name: &str) -> Value {
    send_event(
        ws,
        "join_room",
        Some(serde_json::json!({ "roomId": room_id, "name": name })),
    )
    .await;
    wait_for(ws, "join_room_result").await
}
