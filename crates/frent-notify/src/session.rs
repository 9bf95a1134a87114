//! Identity → live connection registry.
//!
//! The registry owns the mapping, not the connections. A [`SessionHandle`] is
//! the sending half of a connection's outbound queue; the transport owns the
//! receiving half and the socket itself. Writes through a handle never block
//! and never happen while a map shard is locked.

use dashmap::DashMap;
use frent_core::Identity;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Why a write through a [`SessionHandle`] did not enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
  /// The connection's writer has gone away; the handle is dead.
  Closed,
  /// The outbound queue is full; the message was dropped.
  Full,
}

/// A reference to one live connection's outbound queue.
///
/// Two handles are equal when they refer to the same connection.
#[derive(Debug, Clone)]
pub struct SessionHandle {
  id: Uuid,
  tx: mpsc::Sender<String>,
}

impl SessionHandle {
  pub fn new(tx: mpsc::Sender<String>) -> Self { Self { id: Uuid::new_v4(), tx } }

  /// A fresh handle plus the receiver its connection should drain.
  pub fn channel(depth: usize) -> (Self, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(depth.max(1));
    (Self::new(tx), rx)
  }

  /// Identifies the underlying connection.
  pub fn id(&self) -> Uuid { self.id }

  pub fn try_write(&self, message: String) -> Result<(), WriteError> {
    self.tx.try_send(message).map_err(|e| match e {
      TrySendError::Closed(_) => WriteError::Closed,
      TrySendError::Full(_) => WriteError::Full,
    })
  }
}

impl PartialEq for SessionHandle {
  fn eq(&self, other: &Self) -> bool { self.id == other.id }
}

impl Eq for SessionHandle {}

/// Concurrent map from identity to its current connection.
///
/// Mutations lock only the shard holding the key, so unrelated identities
/// never contend. At most one handle is stored per identity.
#[derive(Debug, Default)]
pub struct SessionRegistry {
  sessions: DashMap<Identity, SessionHandle>,
}

impl SessionRegistry {
  pub fn new() -> Self { Self::default() }

  /// Map `identity` to `handle`, replacing (but not closing) any previous
  /// connection. Returns the superseded handle.
  pub fn register(&self, identity: Identity, handle: SessionHandle) -> Option<SessionHandle> {
    self.sessions.insert(identity, handle)
  }

  /// Drop the entry for `identity`. Removing an absent identity is a no-op.
  pub fn remove(&self, identity: &str) -> Option<SessionHandle> {
    self.sessions.remove(identity).map(|(_, h)| h)
  }

  /// Drop the entry for `identity` only if it still points at connection
  /// `handle_id`. A newer connection for the same identity is left alone.
  pub fn remove_if_current(&self, identity: &str, handle_id: Uuid) -> bool {
    self
      .sessions
      .remove_if(identity, |_, h| h.id == handle_id)
      .is_some()
  }

  pub fn lookup(&self, identity: &str) -> Option<SessionHandle> {
    self.sessions.get(identity).map(|h| h.value().clone())
  }

  /// Copy of the current entries. No shard stays locked once this returns.
  pub fn snapshot(&self) -> Vec<(Identity, SessionHandle)> {
    self
      .sessions
      .iter()
      .map(|e| (e.key().clone(), e.value().clone()))
      .collect()
  }

  /// Visit a snapshot of the entries. `visit` may freely call back into the
  /// registry, including removing the entry it is looking at.
  pub fn for_each(&self, mut visit: impl FnMut(&Identity, &SessionHandle)) {
    for (identity, handle) in self.snapshot() {
      visit(&identity, &handle);
    }
  }

  pub fn len(&self) -> usize { self.sessions.len() }

  pub fn is_empty(&self) -> bool { self.sessions.is_empty() }
}
