//! Staff-triggered pushes over the live session registry.

use axum::{
  extract::{Path, State},
  http::StatusCode,
  Json,
};
use frent_core::store::RentalStore;
use serde::Deserialize;
use tracing::info;

use crate::{AppState, auth::StaffUser, error::Error};

#[derive(Debug, Deserialize)]
pub struct MessageBody {
  pub message: String,
}

/// `POST /api/notifications/broadcast`
pub async fn broadcast<S>(
  State(state): State<AppState<S>>,
  StaffUser(sender): StaffUser,
  Json(body): Json<MessageBody>,
) -> Result<StatusCode, Error>
where
  S: RentalStore,
{
  let summary = state.dispatcher.broadcast(&body.message);
  info!(
    sender = %sender.identity,
    delivered = summary.delivered,
    evicted = summary.evicted,
    "broadcast sent"
  );
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/notifications/send-to/{username}`
///
/// Answers `204` whether or not the recipient is connected.
pub async fn send_to<S>(
  State(state): State<AppState<S>>,
  StaffUser(sender): StaffUser,
  Path(username): Path<String>,
  Json(body): Json<MessageBody>,
) -> Result<StatusCode, Error>
where
  S: RentalStore,
{
  let delivery = state.dispatcher.send_to(&username, &body.message);
  info!(sender = %sender.identity, recipient = %username, ?delivery, "message sent");
  Ok(StatusCode::NO_CONTENT)
}
