//! Error types for `frent-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("movie not found: {0}")]
  MovieNotFound(Uuid),

  #[error("rental not found: {0}")]
  RentalNotFound(Uuid),

  #[error("price must be a finite, non-negative amount: {0}")]
  InvalidPrice(f64),

  #[error("discount must be between 0 and 100 percent, got {0}")]
  InvalidDiscount(f64),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
