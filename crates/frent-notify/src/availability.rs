//! Wishlist notifications for availability and price changes.

use std::{collections::BTreeSet, sync::Arc};

use frent_core::{Identity, movie::Movie, store::RentalStore};
use tracing::{debug, warn};

use crate::dispatch::NotificationDispatcher;

pub struct AvailabilityNotifier<S> {
  store:      Arc<S>,
  dispatcher: NotificationDispatcher,
}

impl<S: RentalStore> AvailabilityNotifier<S> {
  pub fn new(store: Arc<S>, dispatcher: NotificationDispatcher) -> Self {
    Self { store, dispatcher }
  }

  /// Tell everyone with `movie` on their wishlist that it can be rented.
  ///
  /// Returns how many connected sessions received the message.
  pub async fn on_became_available(&self, movie: &Movie) -> usize {
    self.notify_wishers(movie, &available_message(&movie.title)).await
  }

  /// Tell everyone with `movie` on their wishlist about its new price.
  ///
  /// The caller only invokes this when `old_price != new_price`.
  pub async fn on_price_changed(&self, movie: &Movie, old_price: f64, new_price: f64) -> usize {
    self
      .notify_wishers(movie, &price_message(&movie.title, old_price, new_price))
      .await
  }

  async fn notify_wishers(&self, movie: &Movie, message: &str) -> usize {
    let identities: BTreeSet<Identity> =
      match self.store.identities_with_movie_in_wishlist(movie.movie_id).await {
        Ok(ids) => ids.into_iter().collect(),
        Err(e) => {
          warn!(movie_id = %movie.movie_id, error = %e, "wishlist lookup failed");
          return 0;
        }
      };

    let delivered = identities
      .iter()
      .filter(|id| self.dispatcher.send_to(id.as_str(), message).is_delivered())
      .count();
    debug!(
      movie_id = %movie.movie_id,
      wishers = identities.len(),
      delivered,
      "wishlist notification"
    );
    delivered
  }
}

pub fn available_message(title: &str) -> String {
  format!("{title} from your wishlist is now available!")
}

pub fn price_message(title: &str, old_price: f64, new_price: f64) -> String {
  if new_price < old_price {
    format!(
      "{title} is now on sale! Original price: {old_price:.2}, Discounted price: {new_price:.2}"
    )
  } else {
    format!(
      "{title} from your wishlist has a new price! Original price: {old_price:.2}, New price: \
       {new_price:.2}"
    )
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::Ordering;

  use tokio::sync::mpsc::Receiver;

  use super::*;
  use crate::{SessionRegistry, session::SessionHandle, testutil::MemoryStore};

  fn setup() -> (Arc<MemoryStore>, NotificationDispatcher, AvailabilityNotifier<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let dispatcher = NotificationDispatcher::new(Arc::new(SessionRegistry::new()));
    let notifier = AvailabilityNotifier::new(store.clone(), dispatcher.clone());
    (store, dispatcher, notifier)
  }

  fn connect(dispatcher: &NotificationDispatcher, who: &str) -> Receiver<String> {
    let (handle, rx) = SessionHandle::channel(8);
    dispatcher.registry().register(Identity::new(who), handle);
    rx
  }

  #[tokio::test]
  async fn one_message_per_wisher() {
    let (store, dispatcher, notifier) = setup();
    let movie = store.movie("Heat");
    store.wish("alice", movie.movie_id);
    store.wish("bob", movie.movie_id);
    let mut alice = connect(&dispatcher, "alice");
    let mut bob = connect(&dispatcher, "bob");
    let mut carol = connect(&dispatcher, "carol");

    assert_eq!(notifier.on_became_available(&movie).await, 2);
    assert_eq!(alice.try_recv().unwrap(), "Heat from your wishlist is now available!");
    assert!(alice.try_recv().is_err());
    assert_eq!(bob.try_recv().unwrap(), "Heat from your wishlist is now available!");
    assert!(carol.try_recv().is_err());
  }

  #[tokio::test]
  async fn empty_wishlist_sends_nothing() {
    let (store, dispatcher, notifier) = setup();
    let movie = store.movie("Heat");
    let mut alice = connect(&dispatcher, "alice");

    assert_eq!(notifier.on_became_available(&movie).await, 0);
    assert!(alice.try_recv().is_err());
  }

  #[tokio::test]
  async fn offline_wishers_are_skipped() {
    let (store, dispatcher, notifier) = setup();
    let movie = store.movie("Heat");
    store.wish("alice", movie.movie_id);
    store.wish("bob", movie.movie_id);
    let mut bob = connect(&dispatcher, "bob");

    assert_eq!(notifier.on_became_available(&movie).await, 1);
    assert!(bob.try_recv().is_ok());
  }

  #[tokio::test]
  async fn price_drop_reads_as_a_sale() {
    let (store, dispatcher, notifier) = setup();
    let movie = store.movie("Heat");
    store.wish("alice", movie.movie_id);
    let mut alice = connect(&dispatcher, "alice");

    assert_eq!(notifier.on_price_changed(&movie, 4.0, 3.0).await, 1);
    assert_eq!(
      alice.try_recv().unwrap(),
      "Heat is now on sale! Original price: 4.00, Discounted price: 3.00"
    );
  }

  #[test]
  fn price_rise_is_neutral() {
    let msg = price_message("Heat", 3.0, 4.5);
    assert!(!msg.contains("on sale"));
    assert!(msg.contains("Original price: 3.00, New price: 4.50"));
  }

  #[tokio::test]
  async fn lookup_failure_sends_nothing() {
    let (store, dispatcher, notifier) = setup();
    let movie = store.movie("Heat");
    store.wish("alice", movie.movie_id);
    store.fail_wishlist.store(true, Ordering::SeqCst);
    let mut alice = connect(&dispatcher, "alice");

    assert_eq!(notifier.on_price_changed(&movie, 4.0, 3.0).await, 0);
    assert!(alice.try_recv().is_err());
  }
}
