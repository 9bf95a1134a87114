//! `GET /ws`: the live notification channel.
//!
//! The credential is taken from `Authorization: Bearer ...` or, for browser
//! clients that cannot set headers, a `?token=` query parameter. An invalid
//! credential still completes the upgrade and is then closed with a policy
//! violation frame.

use std::sync::Arc;

use axum::{
  extract::{
    Query, State,
    ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
  },
  http::{HeaderMap, header},
  response::Response,
};
use frent_core::store::RentalStore;
use frent_notify::{Connection, ConnectionManager, token::bearer_token};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
  pub token: Option<String>,
}

pub async fn upgrade<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Query(params): Query<WsParams>,
  ws: WebSocketUpgrade,
) -> Response
where
  S: RentalStore,
{
  let credential = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(bearer_token)
    .map(str::to_owned)
    .or(params.token);

  let connections = state.connections.clone();
  ws.on_upgrade(move |socket| serve(socket, connections, credential))
}

async fn serve(mut socket: WebSocket, connections: Arc<ConnectionManager>, credential: Option<String>) {
  let Connection { identity, handle_id, mut outbound } =
    match connections.on_connect(credential.as_deref()) {
      Ok(conn) => conn,
      Err(e) => {
        warn!(error = %e, "rejecting websocket connection");
        let frame = CloseFrame {
          code:   close_code::POLICY,
          reason: Utf8Bytes::from_static("invalid credential"),
        };
        let _ = socket.send(Message::Close(Some(frame))).await;
        return;
      }
    };

  let (mut sink, mut stream) = socket.split();

  // Writer: drain the session queue into the socket. Ends when the handle is
  // dropped from the registry or the peer goes away.
  let mut writer = tokio::spawn(async move {
    while let Some(text) = outbound.recv().await {
      if sink.send(Message::Text(text.into())).await.is_err() {
        break;
      }
    }
    let _ = sink.close().await;
  });

  let reader_identity = identity.clone();
  let mut reader = tokio::spawn(async move {
    while let Some(Ok(msg)) = stream.next().await {
      match msg {
        Message::Text(text) => {
          debug!(identity = %reader_identity, message = %text.as_str(), "inbound message");
        }
        Message::Close(_) => break,
        _ => {}
      }
    }
  });

  tokio::select! {
    _ = &mut writer => reader.abort(),
    _ = &mut reader => writer.abort(),
  }

  connections.on_disconnect(&identity, handle_id);
  debug!(%identity, conn_id = %handle_id, "websocket closed");
}
