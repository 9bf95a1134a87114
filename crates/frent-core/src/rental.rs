//! Rentals and the fixed rental-period policy.
//!
//! A rental is created with `return_date = None` and is *active* until it is
//! returned, either by its owner or by the overdue sweep. The transition to
//! returned happens at most once; nothing un-returns a rental.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Identity;

/// Days between `rental_date` and `due_date`.
pub const RENTAL_PERIOD_DAYS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rental {
  pub rental_id:   Uuid,
  pub owner:       Identity,
  pub movie_id:    Uuid,
  pub rental_date: NaiveDate,
  pub due_date:    NaiveDate,
  pub return_date: Option<NaiveDate>,
  pub returned:    bool,
  pub price:       f64,
}

impl Rental {
  pub fn is_active(&self) -> bool { self.return_date.is_none() }

  /// Whole days from `today` until the due date; negative once overdue.
  pub fn days_until_due(&self, today: NaiveDate) -> i64 {
    (self.due_date - today).num_days()
  }

  pub fn due_status(&self, today: NaiveDate) -> DueStatus {
    if !self.is_active() {
      return DueStatus::Returned;
    }
    match self.days_until_due(today) {
      d if d < 0 => DueStatus::Overdue,
      d => DueStatus::DueIn(d as u32),
    }
  }
}

/// Where an active rental stands relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
  Returned,
  Overdue,
  /// Due in this many days; `0` means due today.
  DueIn(u32),
}

/// Input for [`RentalStore::add_rental`](crate::store::RentalStore::add_rental).
#[derive(Debug, Clone)]
pub struct NewRental {
  pub owner:       Identity,
  pub movie_id:    Uuid,
  pub rental_date: NaiveDate,
  pub price:       f64,
}

impl NewRental {
  /// The due date is fixed at creation and never recomputed.
  pub fn due_date(&self) -> NaiveDate {
    self
      .rental_date
      .checked_add_days(Days::new(RENTAL_PERIOD_DAYS))
      .unwrap_or(NaiveDate::MAX)
  }

  pub fn into_rental(self, rental_id: Uuid) -> Rental {
    let due_date = self.due_date();
    Rental {
      rental_id,
      owner: self.owner,
      movie_id: self.movie_id,
      rental_date: self.rental_date,
      due_date,
      return_date: None,
      returned: false,
      price: self.price,
    }
  }
}

/// Result of a conditional return transition.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnOutcome {
  /// The rental was active and is now returned.
  Returned(Rental),
  /// Someone else returned it first; the stored row is unchanged.
  AlreadyReturned(Rental),
  NotFound,
}
