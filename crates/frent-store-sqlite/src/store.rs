//! [`SqliteStore`]: the SQLite implementation of [`RentalStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use frent_core::{
  Identity,
  movie::{Movie, NewMovie, check_price},
  rental::{NewRental, Rental, ReturnOutcome},
  store::{InsertOutcome, RentalStore},
  user::{NewUser, User},
};

use crate::{
  Error, Result,
  encode::{
    MOVIE_COLUMNS, RENTAL_COLUMNS, RawMovie, RawRental, RawUser, USER_COLUMNS, decode_uuid,
    encode_date, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

/// Whether `err` is a UNIQUE constraint violation (as opposed to a primary
/// key, foreign key or CHECK failure).
fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

/// Run an INSERT, reporting a UNIQUE violation as `false` instead of an error.
fn insert_unique(
  conn: &rusqlite::Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<bool> {
  match conn.execute(sql, params) {
    Ok(_) => Ok(true),
    Err(e) if is_unique_violation(&e) => Ok(false),
    Err(e) => Err(e),
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Frent store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_user(&self, column: &'static str, value: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
              rusqlite::params![value],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn query_rentals(
    &self,
    filter: &'static str,
    param: Option<String>,
  ) -> Result<Vec<Rental>> {
    let raws: Vec<RawRental> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RENTAL_COLUMNS} FROM rentals WHERE {filter} ORDER BY due_date, rental_id"
        ))?;
        let rows = match param {
          Some(ref p) => stmt.query_map(rusqlite::params![p], RawRental::from_row)?,
          None => stmt.query_map([], RawRental::from_row)?,
        }
        .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRental::into_rental).collect()
  }
}

// ─── RentalStore impl ────────────────────────────────────────────────────────

impl RentalStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<InsertOutcome<User>> {
    let user = User {
      user_id:       Uuid::new_v4(),
      username:      input.username,
      email:         input.email,
      role:          input.role,
      password_hash: input.password_hash,
      created_at:    Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let name     = user.username.as_str().to_owned();
    let email    = user.email.clone();
    let role_str = user.role.as_str();
    let hash     = user.password_hash.clone();
    let at_str   = encode_dt(user.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(insert_unique(
          conn,
          "INSERT INTO users (user_id, username, email, role, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, email, role_str, hash, at_str],
        )?)
      })
      .await?;

    Ok(if inserted { InsertOutcome::Inserted(user) } else { InsertOutcome::Duplicate })
  }

  async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
    self.query_user("username", username.to_owned()).await
  }

  async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
    self.query_user("email", email.to_owned()).await
  }

  // ── Movies ────────────────────────────────────────────────────────────────

  async fn add_movie(&self, input: NewMovie) -> Result<Movie> {
    input.validate()?;
    let movie = Movie {
      movie_id:  Uuid::new_v4(),
      title:     input.title,
      director:  input.director,
      available: input.available,
      price:     input.price,
    };

    let id_str    = encode_uuid(movie.movie_id);
    let title     = movie.title.clone();
    let director  = movie.director.clone();
    let available = movie.available;
    let price     = movie.price;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO movies (movie_id, title, director, available, price)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, title, director, available, price],
        )?;
        Ok(())
      })
      .await?;

    Ok(movie)
  }

  async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawMovie> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE movie_id = ?1"),
              rusqlite::params![id_str],
              RawMovie::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMovie::into_movie).transpose()
  }

  async fn list_movies(&self) -> Result<Vec<Movie>> {
    let raws: Vec<RawMovie> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY title, movie_id"
        ))?;
        let rows = stmt
          .query_map([], RawMovie::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMovie::into_movie).collect()
  }

  async fn set_availability(&self, id: Uuid, available: bool) -> Result<Movie> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE movies SET available = ?2 WHERE movie_id = ?1",
          rusqlite::params![id_str, available],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(frent_core::Error::MovieNotFound(id).into());
    }
    self
      .get_movie(id)
      .await?
      .ok_or(Error::Core(frent_core::Error::MovieNotFound(id)))
  }

  async fn set_price(&self, id: Uuid, price: f64) -> Result<Movie> {
    check_price(price)?;
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE movies SET price = ?2 WHERE movie_id = ?1",
          rusqlite::params![id_str, price],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(frent_core::Error::MovieNotFound(id).into());
    }
    self
      .get_movie(id)
      .await?
      .ok_or(Error::Core(frent_core::Error::MovieNotFound(id)))
  }

  // ── Wishlists ─────────────────────────────────────────────────────────────

  async fn add_to_wishlist(&self, username: &Identity, movie_id: Uuid) -> Result<()> {
    let name   = username.as_str().to_owned();
    let id_str = encode_uuid(movie_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO wishlist (username, movie_id) VALUES (?1, ?2)",
          rusqlite::params![name, id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn remove_from_wishlist(&self, username: &Identity, movie_id: Uuid) -> Result<()> {
    let name   = username.as_str().to_owned();
    let id_str = encode_uuid(movie_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM wishlist WHERE username = ?1 AND movie_id = ?2",
          rusqlite::params![name, id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn wishlist(&self, username: &Identity) -> Result<Vec<Uuid>> {
    let name = username.as_str().to_owned();

    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT movie_id FROM wishlist WHERE username = ?1 ORDER BY movie_id")?;
        let rows = stmt
          .query_map(rusqlite::params![name], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    ids.iter().map(|s| decode_uuid(s)).collect()
  }

  async fn identities_with_movie_in_wishlist(&self, movie_id: Uuid) -> Result<Vec<Identity>> {
    let id_str = encode_uuid(movie_id);

    let names: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT username FROM wishlist WHERE movie_id = ?1 ORDER BY username",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(names.into_iter().map(Identity::from).collect())
  }

  // ── Rentals ───────────────────────────────────────────────────────────────

  async fn add_rental(&self, input: NewRental) -> Result<InsertOutcome<Rental>> {
    check_price(input.price)?;
    let rental = input.into_rental(Uuid::new_v4());

    let id_str       = encode_uuid(rental.rental_id);
    let owner        = rental.owner.as_str().to_owned();
    let movie_id_str = encode_uuid(rental.movie_id);
    let rented_str   = encode_date(rental.rental_date);
    let due_str      = encode_date(rental.due_date);
    let price        = rental.price;

    // `rentals_one_active` makes the insert itself the uniqueness check.
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(insert_unique(
          conn,
          "INSERT INTO rentals (
             rental_id, owner, movie_id, rental_date, due_date,
             return_date, returned, price
           ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, 0, ?6)",
          rusqlite::params![id_str, owner, movie_id_str, rented_str, due_str, price],
        )?)
      })
      .await?;

    Ok(if inserted { InsertOutcome::Inserted(rental) } else { InsertOutcome::Duplicate })
  }

  async fn get_rental(&self, id: Uuid) -> Result<Option<Rental>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawRental> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {RENTAL_COLUMNS} FROM rentals WHERE rental_id = ?1"),
              rusqlite::params![id_str],
              RawRental::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRental::into_rental).transpose()
  }

  async fn list_active_rentals(&self) -> Result<Vec<Rental>> {
    self.query_rentals("return_date IS NULL", None).await
  }

  async fn list_all_rentals(&self) -> Result<Vec<Rental>> {
    self.query_rentals("1 = 1", None).await
  }

  async fn list_rentals_for(&self, owner: &Identity) -> Result<Vec<Rental>> {
    self
      .query_rentals("owner = ?1", Some(owner.as_str().to_owned()))
      .await
  }

  async fn mark_returned(&self, id: Uuid, date: NaiveDate) -> Result<ReturnOutcome> {
    let id_str   = encode_uuid(id);
    let date_str = encode_date(date);

    // Update and re-read in a single call so no other statement on this
    // connection can interleave between them.
    let (changed, raw): (usize, Option<RawRental>) = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE rentals SET return_date = ?2, returned = 1
           WHERE rental_id = ?1 AND return_date IS NULL",
          rusqlite::params![id_str, date_str],
        )?;
        let raw = conn
          .query_row(
            &format!("SELECT {RENTAL_COLUMNS} FROM rentals WHERE rental_id = ?1"),
            rusqlite::params![id_str],
            RawRental::from_row,
          )
          .optional()?;
        Ok((changed, raw))
      })
      .await?;

    Ok(match raw {
      None => ReturnOutcome::NotFound,
      Some(raw) if changed == 1 => ReturnOutcome::Returned(raw.into_rental()?),
      Some(raw) => ReturnOutcome::AlreadyReturned(raw.into_rental()?),
    })
  }
}
