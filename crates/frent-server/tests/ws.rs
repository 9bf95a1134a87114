//! End-to-end tests for `/ws` using a real WebSocket client.

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use frent_core::{Identity, user::Role};
use frent_notify::Delivery;
use frent_server::{AppState, ServerConfig};
use frent_store_sqlite::SqliteStore;
use futures::StreamExt;
use tokio::{net::TcpListener, time::timeout};
use tokio_tungstenite::{
  connect_async,
  tungstenite::{Message, client::IntoClientRequest, protocol::frame::coding::CloseCode},
};

const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream =
  tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn boot() -> (SocketAddr, AppState<SqliteStore>) {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let state = AppState::new(Arc::new(store), ServerConfig {
    host:                "127.0.0.1".to_string(),
    port:                0,
    store_path:          PathBuf::from(":memory:"),
    jwt_secret:          B64.encode(b"frent-ws-test-key"),
    token_ttl_hours:     1,
    sweep_interval_secs: 3600,
    session_queue_depth: 8,
  })
  .unwrap();

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  let app = frent_server::router(state.clone());
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  (addr, state)
}

fn token_for(state: &AppState<SqliteStore>, username: &str) -> String {
  state.issuer.issue(&Identity::new(username), Role::Member).unwrap()
}

async fn wait_until(mut done: impl FnMut() -> bool) {
  timeout(TIMEOUT, async {
    while !done() {
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
  })
  .await
  .expect("condition not reached in time");
}

async fn next_message(ws: &mut WsStream) -> Option<Message> {
  timeout(TIMEOUT, ws.next()).await.unwrap().map(|m| m.unwrap())
}

async fn assert_policy_close(ws: &mut WsStream) {
  match next_message(ws).await {
    Some(Message::Close(Some(frame))) => assert_eq!(frame.code, CloseCode::Policy),
    other => panic!("expected a policy close frame, got {other:?}"),
  }
}

#[tokio::test]
async fn invalid_token_is_closed_without_a_session() {
  let (addr, state) = boot().await;
  let (mut ws, _) = connect_async(format!("ws://{addr}/ws?token=not-a-jwt")).await.unwrap();

  assert_policy_close(&mut ws).await;
  assert!(state.connections.registry().is_empty());
}

#[tokio::test]
async fn missing_token_is_closed_without_a_session() {
  let (addr, state) = boot().await;
  let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();

  assert_policy_close(&mut ws).await;
  assert!(state.connections.registry().is_empty());
}

#[tokio::test]
async fn header_token_registers_and_receives() {
  let (addr, state) = boot().await;
  let mut req = format!("ws://{addr}/ws").into_client_request().unwrap();
  req.headers_mut().insert(
    "authorization",
    format!("Bearer {}", token_for(&state, "alice")).parse().unwrap(),
  );
  let (mut ws, _) = connect_async(req).await.unwrap();

  let registry = state.connections.registry().clone();
  wait_until(|| registry.lookup("alice").is_some()).await;

  assert_eq!(state.dispatcher.send_to("alice", "hello"), Delivery::Delivered);
  match next_message(&mut ws).await {
    Some(Message::Text(text)) => assert_eq!(text.as_str(), "hello"),
    other => panic!("expected text, got {other:?}"),
  }

  // Client hang-up removes the session.
  ws.close(None).await.unwrap();
  wait_until(|| registry.lookup("alice").is_none()).await;
}

#[tokio::test]
async fn reconnect_supersedes_the_old_connection() {
  let (addr, state) = boot().await;
  let url = format!("ws://{addr}/ws?token={}", token_for(&state, "alice"));
  let registry = state.connections.registry().clone();

  let (mut first, _) = connect_async(url.as_str()).await.unwrap();
  wait_until(|| registry.lookup("alice").is_some()).await;
  let first_id = registry.lookup("alice").unwrap().id();

  let (mut second, _) = connect_async(url.as_str()).await.unwrap();
  wait_until(|| registry.lookup("alice").is_some_and(|h| h.id() != first_id)).await;

  // The server hangs up on the superseded socket.
  match next_message(&mut first).await {
    Some(Message::Close(_)) | None => {}
    other => panic!("expected the old socket to close, got {other:?}"),
  }

  // Its teardown leaves the newer session in place.
  tokio::time::sleep(Duration::from_millis(50)).await;
  assert_eq!(registry.len(), 1);
  assert_eq!(state.dispatcher.send_to("alice", "still here"), Delivery::Delivered);
  match next_message(&mut second).await {
    Some(Message::Text(text)) => assert_eq!(text.as_str(), "still here"),
    other => panic!("expected text, got {other:?}"),
  }
}
