//! In-memory [`RentalStore`] with injectable failures, for engine tests.

use std::{
  collections::{BTreeMap, BTreeSet, HashSet},
  sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use chrono::{NaiveDate, Utc};
use frent_core::{
  Identity,
  movie::{Movie, NewMovie},
  rental::{NewRental, Rental, ReturnOutcome},
  store::{InsertOutcome, RentalStore},
  user::{NewUser, User},
};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
#[error("injected failure: {0}")]
pub struct FakeError(&'static str);

#[derive(Default)]
struct Inner {
  users:    Vec<User>,
  movies:   BTreeMap<Uuid, Movie>,
  wishlist: BTreeSet<(Identity, Uuid)>,
  rentals:  BTreeMap<Uuid, Rental>,
}

#[derive(Default)]
pub struct MemoryStore {
  inner:                Mutex<Inner>,
  pub fail_listing:     AtomicBool,
  pub fail_movie_reads: AtomicBool,
  pub fail_wishlist:    AtomicBool,
  fail_returns:         Mutex<HashSet<Uuid>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  pub fn movie(&self, title: &str) -> Movie {
    let movie = Movie {
      movie_id:  Uuid::new_v4(),
      title:     title.into(),
      director:  String::new(),
      available: false,
      price:     3.0,
    };
    self.inner.lock().unwrap().movies.insert(movie.movie_id, movie.clone());
    movie
  }

  pub fn rental(&self, owner: &str, movie_id: Uuid, due_date: NaiveDate) -> Rental {
    let rental = Rental {
      rental_id: Uuid::new_v4(),
      owner: Identity::new(owner),
      movie_id,
      rental_date: due_date - chrono::Days::new(frent_core::rental::RENTAL_PERIOD_DAYS),
      due_date,
      return_date: None,
      returned: false,
      price: 3.0,
    };
    self.inner.lock().unwrap().rentals.insert(rental.rental_id, rental.clone());
    rental
  }

  pub fn wish(&self, owner: &str, movie_id: Uuid) {
    self
      .inner
      .lock()
      .unwrap()
      .wishlist
      .insert((Identity::new(owner), movie_id));
  }

  pub fn fail_return_of(&self, rental_id: Uuid) {
    self.fail_returns.lock().unwrap().insert(rental_id);
  }

  pub fn stored_rental(&self, rental_id: Uuid) -> Rental {
    self.inner.lock().unwrap().rentals[&rental_id].clone()
  }

  fn check(flag: &AtomicBool, what: &'static str) -> Result<(), FakeError> {
    if flag.load(Ordering::SeqCst) { Err(FakeError(what)) } else { Ok(()) }
  }
}

impl RentalStore for MemoryStore {
  type Error = FakeError;

  async fn add_user(&self, input: NewUser) -> Result<InsertOutcome<User>, FakeError> {
    let mut inner = self.inner.lock().unwrap();
    if inner.users.iter().any(|u| u.username == input.username || u.email == input.email) {
      return Ok(InsertOutcome::Duplicate);
    }
    let user = User {
      user_id:       Uuid::new_v4(),
      username:      input.username,
      email:         input.email,
      role:          input.role,
      password_hash: input.password_hash,
      created_at:    Utc::now(),
    };
    inner.users.push(user.clone());
    Ok(InsertOutcome::Inserted(user))
  }

  async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, FakeError> {
    let inner = self.inner.lock().unwrap();
    Ok(inner.users.iter().find(|u| u.username.as_str() == username).cloned())
  }

  async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, FakeError> {
    let inner = self.inner.lock().unwrap();
    Ok(inner.users.iter().find(|u| u.email == email).cloned())
  }

  async fn add_movie(&self, input: NewMovie) -> Result<Movie, FakeError> {
    let movie = Movie {
      movie_id:  Uuid::new_v4(),
      title:     input.title,
      director:  input.director,
      available: input.available,
      price:     input.price,
    };
    self.inner.lock().unwrap().movies.insert(movie.movie_id, movie.clone());
    Ok(movie)
  }

  async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>, FakeError> {
    Self::check(&self.fail_movie_reads, "get_movie")?;
    Ok(self.inner.lock().unwrap().movies.get(&id).cloned())
  }

  async fn list_movies(&self) -> Result<Vec<Movie>, FakeError> {
    let inner = self.inner.lock().unwrap();
    let mut movies: Vec<Movie> = inner.movies.values().cloned().collect();
    movies.sort_by(|a, b| a.title.cmp(&b.title));
    Ok(movies)
  }

  async fn set_availability(&self, id: Uuid, available: bool) -> Result<Movie, FakeError> {
    let mut inner = self.inner.lock().unwrap();
    let movie = inner.movies.get_mut(&id).ok_or(FakeError("no such movie"))?;
    movie.available = available;
    Ok(movie.clone())
  }

  async fn set_price(&self, id: Uuid, price: f64) -> Result<Movie, FakeError> {
    let mut inner = self.inner.lock().unwrap();
    let movie = inner.movies.get_mut(&id).ok_or(FakeError("no such movie"))?;
    movie.price = price;
    Ok(movie.clone())
  }

  async fn add_to_wishlist(&self, username: &Identity, movie_id: Uuid) -> Result<(), FakeError> {
    self.inner.lock().unwrap().wishlist.insert((username.clone(), movie_id));
    Ok(())
  }

  async fn remove_from_wishlist(
    &self,
    username: &Identity,
    movie_id: Uuid,
  ) -> Result<(), FakeError> {
    self.inner.lock().unwrap().wishlist.remove(&(username.clone(), movie_id));
    Ok(())
  }

  async fn wishlist(&self, username: &Identity) -> Result<Vec<Uuid>, FakeError> {
    let inner = self.inner.lock().unwrap();
    Ok(
      inner
        .wishlist
        .iter()
        .filter(|(u, _)| u == username)
        .map(|(_, m)| *m)
        .collect(),
    )
  }

  async fn identities_with_movie_in_wishlist(
    &self,
    movie_id: Uuid,
  ) -> Result<Vec<Identity>, FakeError> {
    Self::check(&self.fail_wishlist, "identities_with_movie_in_wishlist")?;
    let inner = self.inner.lock().unwrap();
    Ok(
      inner
        .wishlist
        .iter()
        .filter(|(_, m)| *m == movie_id)
        .map(|(u, _)| u.clone())
        .collect(),
    )
  }

  async fn add_rental(&self, input: NewRental) -> Result<InsertOutcome<Rental>, FakeError> {
    let mut inner = self.inner.lock().unwrap();
    if inner
      .rentals
      .values()
      .any(|r| r.owner == input.owner && r.movie_id == input.movie_id && r.is_active())
    {
      return Ok(InsertOutcome::Duplicate);
    }
    let rental = input.into_rental(Uuid::new_v4());
    inner.rentals.insert(rental.rental_id, rental.clone());
    Ok(InsertOutcome::Inserted(rental))
  }

  async fn get_rental(&self, id: Uuid) -> Result<Option<Rental>, FakeError> {
    Ok(self.inner.lock().unwrap().rentals.get(&id).cloned())
  }

  async fn list_active_rentals(&self) -> Result<Vec<Rental>, FakeError> {
    Self::check(&self.fail_listing, "list_active_rentals")?;
    let inner = self.inner.lock().unwrap();
    Ok(inner.rentals.values().filter(|r| r.is_active()).cloned().collect())
  }

  async fn list_all_rentals(&self) -> Result<Vec<Rental>, FakeError> {
    Ok(self.inner.lock().unwrap().rentals.values().cloned().collect())
  }

  async fn list_rentals_for(&self, owner: &Identity) -> Result<Vec<Rental>, FakeError> {
    let inner = self.inner.lock().unwrap();
    Ok(inner.rentals.values().filter(|r| &r.owner == owner).cloned().collect())
  }

  async fn mark_returned(&self, id: Uuid, date: NaiveDate) -> Result<ReturnOutcome, FakeError> {
    if self.fail_returns.lock().unwrap().contains(&id) {
      return Err(FakeError("mark_returned"));
    }
    let mut inner = self.inner.lock().unwrap();
    let Some(rental) = inner.rentals.get_mut(&id) else {
      return Ok(ReturnOutcome::NotFound);
    };
    if !rental.is_active() {
      return Ok(ReturnOutcome::AlreadyReturned(rental.clone()));
    }
    rental.return_date = Some(date);
    rental.returned = true;
    Ok(ReturnOutcome::Returned(rental.clone()))
  }
}
