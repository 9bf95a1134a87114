//! The `RentalStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `frent-store-sqlite`).
//! The notification engine and the HTTP surface depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  identity::Identity,
  movie::{Movie, NewMovie},
  rental::{NewRental, Rental, ReturnOutcome},
  user::{NewUser, User},
};

/// Result of an insert guarded by a uniqueness rule.
///
/// A conflict is part of the domain (a taken username, a second active rental
/// of the same movie), so it is reported here rather than as a store error.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome<T> {
  Inserted(T),
  /// A conflicting row already exists; nothing was written.
  Duplicate,
}

impl<T> InsertOutcome<T> {
  pub fn inserted(self) -> Option<T> {
    match self {
      Self::Inserted(value) => Some(value),
      Self::Duplicate => None,
    }
  }
}

/// Abstraction over the persistent entities the rental service reads and
/// writes.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RentalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Usernames and emails are unique; a clash yields
  /// [`InsertOutcome::Duplicate`].
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<InsertOutcome<User>, Self::Error>> + Send + '_;

  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Movies ────────────────────────────────────────────────────────────

  fn add_movie(
    &self,
    input: NewMovie,
  ) -> impl Future<Output = Result<Movie, Self::Error>> + Send + '_;

  /// Retrieve a movie by UUID. Returns `None` if not found.
  fn get_movie(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Movie>, Self::Error>> + Send + '_;

  /// Every movie in the catalogue, ordered by title.
  fn list_movies(&self) -> impl Future<Output = Result<Vec<Movie>, Self::Error>> + Send + '_;

  /// Overwrite the availability flag and return the updated movie.
  fn set_availability(
    &self,
    id: Uuid,
    available: bool,
  ) -> impl Future<Output = Result<Movie, Self::Error>> + Send + '_;

  /// Overwrite the rental price and return the updated movie.
  fn set_price(
    &self,
    id: Uuid,
    price: f64,
  ) -> impl Future<Output = Result<Movie, Self::Error>> + Send + '_;

  // ── Wishlists ─────────────────────────────────────────────────────────

  /// Idempotent.
  fn add_to_wishlist<'a>(
    &'a self,
    username: &'a Identity,
    movie_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Idempotent.
  fn remove_from_wishlist<'a>(
    &'a self,
    username: &'a Identity,
    movie_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn wishlist<'a>(
    &'a self,
    username: &'a Identity,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + 'a;

  /// Every distinct identity whose wishlist contains `movie_id`.
  fn identities_with_movie_in_wishlist(
    &self,
    movie_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Identity>, Self::Error>> + Send + '_;

  // ── Rentals ───────────────────────────────────────────────────────────

  /// An owner holds at most one active rental per movie. The check and the
  /// insert are a single atomic step; a second active rental yields
  /// [`InsertOutcome::Duplicate`].
  fn add_rental(
    &self,
    input: NewRental,
  ) -> impl Future<Output = Result<InsertOutcome<Rental>, Self::Error>> + Send + '_;

  fn get_rental(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Rental>, Self::Error>> + Send + '_;

  /// Every rental whose `return_date` is still unset.
  fn list_active_rentals(
    &self,
  ) -> impl Future<Output = Result<Vec<Rental>, Self::Error>> + Send + '_;

  /// Every rental ever recorded, active or returned.
  fn list_all_rentals(
    &self,
  ) -> impl Future<Output = Result<Vec<Rental>, Self::Error>> + Send + '_;

  fn list_rentals_for<'a>(
    &'a self,
    owner: &'a Identity,
  ) -> impl Future<Output = Result<Vec<Rental>, Self::Error>> + Send + 'a;

  /// Atomically flip an active rental to returned on `date`.
  ///
  /// The write is conditional on `return_date` being unset, so concurrent
  /// callers (a user return racing the overdue sweep) see exactly one
  /// [`ReturnOutcome::Returned`].
  fn mark_returned(
    &self,
    id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<ReturnOutcome, Self::Error>> + Send + '_;
}
