//! Lifecycle hooks for the transport layer.
//!
//! The transport calls [`ConnectionManager::on_connect`] right after the
//! handshake with whatever credential it received, pumps the returned
//! receiver into the socket, and calls [`ConnectionManager::on_disconnect`]
//! when the socket ends.

use std::sync::Arc;

use frent_core::Identity;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  session::{SessionHandle, SessionRegistry},
  token::{TokenError, TokenValidator},
};

/// Default capacity of each connection's outbound queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// An accepted, registered connection.
#[derive(Debug)]
pub struct Connection {
  pub identity: Identity,
  pub handle_id: Uuid,
  /// Messages addressed to this connection, in dispatch order.
  pub outbound: mpsc::Receiver<String>,
}

pub struct ConnectionManager {
  validator:   Arc<TokenValidator>,
  registry:    Arc<SessionRegistry>,
  queue_depth: usize,
}

impl ConnectionManager {
  pub fn new(
    validator:   Arc<TokenValidator>,
    registry:    Arc<SessionRegistry>,
    queue_depth: usize,
  ) -> Self {
    Self { validator, registry, queue_depth }
  }

  /// Authenticate and register a new connection.
  ///
  /// On error nothing is registered and the transport must close the socket.
  pub fn on_connect(&self, credential: Option<&str>) -> Result<Connection, TokenError> {
    let credential = credential.ok_or(TokenError::Missing)?;
    let identity = self.validator.validate(credential)?;

    let (handle, outbound) = SessionHandle::channel(self.queue_depth);
    let handle_id = handle.id();
    if let Some(previous) = self.registry.register(identity.clone(), handle) {
      debug!(%identity, superseded = %previous.id(), "session superseded by new connection");
    }
    info!(%identity, conn_id = %handle_id, "session created");

    Ok(Connection { identity, handle_id, outbound })
  }

  /// Forget a connection. Leaves a newer connection for the same identity
  /// untouched.
  pub fn on_disconnect(&self, identity: &Identity, handle_id: Uuid) {
    if self.registry.remove_if_current(identity.as_str(), handle_id) {
      info!(%identity, conn_id = %handle_id, "session closed");
    } else {
      debug!(%identity, conn_id = %handle_id, "closed connection was already superseded");
    }
  }

  pub fn registry(&self) -> &Arc<SessionRegistry> { &self.registry }
}
