//! Catalogue entries.
//!
//! Availability and price are mutated by staff through the HTTP surface; the
//! notification engine only reacts to those transitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
  pub movie_id:  Uuid,
  pub title:     String,
  pub director:  String,
  pub available: bool,
  pub price:     f64,
}

/// Input for [`RentalStore::add_movie`](crate::store::RentalStore::add_movie).
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
  pub title:     String,
  #[serde(default)]
  pub director:  String,
  #[serde(default = "default_available")]
  pub available: bool,
  pub price:     f64,
}

fn default_available() -> bool { true }

impl NewMovie {
  pub fn validate(&self) -> Result<()> { check_price(self.price) }
}

pub fn check_price(price: f64) -> Result<()> {
  if !price.is_finite() || price < 0.0 {
    return Err(Error::InvalidPrice(price));
  }
  Ok(())
}

/// Apply a percentage discount and round to cents.
pub fn discounted_price(price: f64, percent: f64) -> Result<f64> {
  if !(0.0..=100.0).contains(&percent) {
    return Err(Error::InvalidDiscount(percent));
  }
  let discounted = price - price * (percent / 100.0);
  Ok((discounted * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn discount_rounds_to_cents() {
    assert_eq!(discounted_price(4.99, 10.0).unwrap(), 4.49);
    assert_eq!(discounted_price(10.0, 25.0).unwrap(), 7.5);
  }

  #[test]
  fn zero_discount_keeps_price() {
    assert_eq!(discounted_price(3.0, 0.0).unwrap(), 3.0);
  }

  #[test]
  fn out_of_range_discount_is_rejected() {
    assert!(matches!(discounted_price(3.0, 120.0), Err(Error::InvalidDiscount(_))));
    assert!(matches!(discounted_price(3.0, -5.0), Err(Error::InvalidDiscount(_))));
  }

  #[test]
  fn negative_price_is_rejected() {
    assert!(check_price(-0.01).is_err());
    assert!(check_price(0.0).is_ok());
  }

  #[test]
  fn non_finite_price_is_rejected() {
    assert!(matches!(check_price(f64::INFINITY), Err(Error::InvalidPrice(_))));
    assert!(matches!(check_price(f64::NEG_INFINITY), Err(Error::InvalidPrice(_))));
    assert!(matches!(check_price(f64::NAN), Err(Error::InvalidPrice(_))));
  }
}
