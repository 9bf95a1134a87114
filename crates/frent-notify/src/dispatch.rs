//! Targeted and broadcast delivery.
//!
//! Delivery is best effort. A recipient without a session is skipped, a dead
//! handle is evicted from the registry, and nothing here ever returns an error
//! to the caller.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::session::{SessionHandle, SessionRegistry, WriteError};

/// What happened to one message for one recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
  /// Enqueued on the recipient's connection.
  Delivered,
  /// No session for the recipient; the message is gone.
  NotConnected,
  /// The recipient's queue was full; the message is gone, the session stays.
  Dropped,
  /// The connection was dead; the message is gone and the session removed.
  Evicted,
}

impl Delivery {
  pub fn is_delivered(self) -> bool { matches!(self, Self::Delivered) }
}

/// Tally of a [`NotificationDispatcher::broadcast`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastSummary {
  pub delivered: usize,
  pub dropped:   usize,
  pub evicted:   usize,
}

/// Writes text payloads to live sessions.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
  registry: Arc<SessionRegistry>,
}

impl NotificationDispatcher {
  pub fn new(registry: Arc<SessionRegistry>) -> Self { Self { registry } }

  pub fn registry(&self) -> &Arc<SessionRegistry> { &self.registry }

  /// Deliver `message` to `identity` if it is connected.
  pub fn send_to(&self, identity: &str, message: &str) -> Delivery {
    let Some(handle) = self.registry.lookup(identity) else {
      debug!(identity, "recipient not connected, dropping message");
      return Delivery::NotConnected;
    };
    self.write(identity, &handle, message)
  }

  /// Deliver `message` to every registered session.
  pub fn broadcast(&self, message: &str) -> BroadcastSummary {
    let mut summary = BroadcastSummary::default();
    self.registry.for_each(|identity, handle| {
      match self.write(identity.as_str(), handle, message) {
        Delivery::Delivered => summary.delivered += 1,
        Delivery::Dropped => summary.dropped += 1,
        Delivery::Evicted => summary.evicted += 1,
        Delivery::NotConnected => {}
      }
    });
    debug!(
      delivered = summary.delivered,
      dropped = summary.dropped,
      evicted = summary.evicted,
      "broadcast"
    );
    summary
  }

  fn write(&self, identity: &str, handle: &SessionHandle, message: &str) -> Delivery {
    match handle.try_write(message.to_owned()) {
      Ok(()) => Delivery::Delivered,
      Err(WriteError::Full) => {
        warn!(identity, conn_id = %handle.id(), "send queue full, dropping message");
        Delivery::Dropped
      }
      Err(WriteError::Closed) => {
        // Only the dead connection is evicted; if the identity reconnected in
        // the meantime the new entry survives.
        self.registry.remove_if_current(identity, handle.id());
        debug!(identity, conn_id = %handle.id(), "evicted closed session");
        Delivery::Evicted
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use frent_core::Identity;

  use super::*;

  fn dispatcher() -> NotificationDispatcher {
    NotificationDispatcher::new(Arc::new(SessionRegistry::new()))
  }

  #[test]
  fn send_to_unconnected_identity_is_a_no_op() {
    let d = dispatcher();
    assert_eq!(d.send_to("ghost", "hello"), Delivery::NotConnected);
    assert!(d.registry().is_empty());
  }

  #[test]
  fn send_to_connected_identity_enqueues_once() {
    let d = dispatcher();
    let (h, mut rx) = SessionHandle::channel(4);
    d.registry().register(Identity::new("alice"), h);

    assert_eq!(d.send_to("alice", "hello"), Delivery::Delivered);
    assert_eq!(rx.try_recv().unwrap(), "hello");
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn dead_handle_is_evicted_on_send() {
    let d = dispatcher();
    let (h, rx) = SessionHandle::channel(4);
    d.registry().register(Identity::new("alice"), h);
    drop(rx);

    assert_eq!(d.send_to("alice", "hello"), Delivery::Evicted);
    assert!(d.registry().lookup("alice").is_none());
    // Subsequent sends are plain misses.
    assert_eq!(d.send_to("alice", "hello"), Delivery::NotConnected);
  }

  #[test]
  fn full_queue_drops_without_evicting() {
    let d = dispatcher();
    let (h, _rx) = SessionHandle::channel(1);
    d.registry().register(Identity::new("alice"), h);

    assert_eq!(d.send_to("alice", "one"), Delivery::Delivered);
    assert_eq!(d.send_to("alice", "two"), Delivery::Dropped);
    assert!(d.registry().lookup("alice").is_some());
  }

  #[test]
  fn broadcast_continues_past_dead_recipients() {
    let d = dispatcher();
    let (alive_a, mut rx_a) = SessionHandle::channel(4);
    let (dead, rx_dead) = SessionHandle::channel(4);
    let (alive_b, mut rx_b) = SessionHandle::channel(4);
    d.registry().register(Identity::new("a"), alive_a);
    d.registry().register(Identity::new("dead"), dead);
    d.registry().register(Identity::new("b"), alive_b);
    drop(rx_dead);

    let summary = d.broadcast("maintenance at noon");
    assert_eq!(summary, BroadcastSummary { delivered: 2, dropped: 0, evicted: 1 });
    assert_eq!(rx_a.try_recv().unwrap(), "maintenance at noon");
    assert_eq!(rx_b.try_recv().unwrap(), "maintenance at noon");
    assert!(d.registry().lookup("dead").is_none());
    assert_eq!(d.registry().len(), 2);
  }

  #[test]
  fn broadcast_to_empty_registry() {
    assert_eq!(dispatcher().broadcast("hi"), BroadcastSummary::default());
  }
}
