//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use frent_core::{
  Identity,
  movie::Movie,
  rental::Rental,
  user::{Role, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw rows ─────────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub email:         String,
  pub role:          String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      role:          row.get(3)?,
      password_hash: row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      username:      Identity::from(self.username),
      email:         self.email,
      role:          self.role.parse::<Role>()?,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `movies` row.
pub struct RawMovie {
  pub movie_id:  String,
  pub title:     String,
  pub director:  String,
  pub available: bool,
  pub price:     f64,
}

impl RawMovie {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      movie_id:  row.get(0)?,
      title:     row.get(1)?,
      director:  row.get(2)?,
      available: row.get(3)?,
      price:     row.get(4)?,
    })
  }

  pub fn into_movie(self) -> Result<Movie> {
    Ok(Movie {
      movie_id:  decode_uuid(&self.movie_id)?,
      title:     self.title,
      director:  self.director,
      available: self.available,
      price:     self.price,
    })
  }
}

/// Raw values read directly from a `rentals` row.
pub struct RawRental {
  pub rental_id:   String,
  pub owner:       String,
  pub movie_id:    String,
  pub rental_date: String,
  pub due_date:    String,
  pub return_date: Option<String>,
  pub returned:    bool,
  pub price:       f64,
}

impl RawRental {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      rental_id:   row.get(0)?,
      owner:       row.get(1)?,
      movie_id:    row.get(2)?,
      rental_date: row.get(3)?,
      due_date:    row.get(4)?,
      return_date: row.get(5)?,
      returned:    row.get(6)?,
      price:       row.get(7)?,
    })
  }

  pub fn into_rental(self) -> Result<Rental> {
    Ok(Rental {
      rental_id:   decode_uuid(&self.rental_id)?,
      owner:       Identity::from(self.owner),
      movie_id:    decode_uuid(&self.movie_id)?,
      rental_date: decode_date(&self.rental_date)?,
      due_date:    decode_date(&self.due_date)?,
      return_date: self.return_date.as_deref().map(decode_date).transpose()?,
      returned:    self.returned,
      price:       self.price,
    })
  }
}

pub const USER_COLUMNS: &str = "user_id, username, email, role, password_hash, created_at";

pub const MOVIE_COLUMNS: &str = "movie_id, title, director, available, price";

pub const RENTAL_COLUMNS: &str =
  "rental_id, owner, movie_id, rental_date, due_date, return_date, returned, price";
