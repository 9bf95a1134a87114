//! The rental-lifecycle sweep.
//!
//! One sweep reads the current day once, then runs two passes over the
//! active rentals:
//!
//! 1. **Overdue**: every rental due before today is flipped to returned, and
//!    only after that transition lands is its owner warned.
//! 2. **Due soon**: every rental due exactly [`DUE_SOON_THRESHOLDS`] days out
//!    gets a reminder.
//!
//! Returned rentals are excluded from both passes, so a second sweep on the
//! same day is a no-op for anything the first one transitioned.

use std::{sync::Arc, time::Duration};

use chrono::{Local, NaiveDate};
use frent_core::{
  rental::{DueStatus, Rental, ReturnOutcome},
  store::RentalStore,
};
use serde::Serialize;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dispatch::NotificationDispatcher;

/// Days-out at which a reminder is sent.
pub const DUE_SOON_THRESHOLDS: [u32; 3] = [3, 2, 1];

/// Title used in messages when the movie lookup comes back empty.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
  pub date:              Option<NaiveDate>,
  pub auto_returned:     usize,
  pub overdue_notified:  usize,
  pub due_soon_notified: usize,
  pub failures:          usize,
}

pub struct RentalLifecycleSweeper<S> {
  store:      Arc<S>,
  dispatcher: NotificationDispatcher,
}

impl<S: RentalStore> RentalLifecycleSweeper<S> {
  pub fn new(store: Arc<S>, dispatcher: NotificationDispatcher) -> Self {
    Self { store, dispatcher }
  }

  /// Sweep against the local calendar day.
  pub async fn sweep(&self) -> SweepReport { self.sweep_on(Local::now().date_naive()).await }

  /// Sweep as if `today` were the current day.
  pub async fn sweep_on(&self, today: NaiveDate) -> SweepReport {
    let mut report = SweepReport { date: Some(today), ..Default::default() };

    let rentals = match self.store.list_active_rentals().await {
      Ok(r) => r,
      Err(e) => {
        warn!(error = %e, "sweep: failed to list active rentals");
        report.failures += 1;
        return report;
      }
    };

    // ── Overdue pass ──────────────────────────────────────────────────────
    for rental in rentals.iter().filter(|r| r.due_status(today) == DueStatus::Overdue) {
      match self.store.mark_returned(rental.rental_id, today).await {
        Ok(ReturnOutcome::Returned(returned)) => {
          report.auto_returned += 1;
          let title = self.find_title(returned.movie_id).await;
          let message = overdue_message(returned.owner.as_str(), &title);
          if self.dispatcher.send_to(returned.owner.as_str(), &message).is_delivered() {
            report.overdue_notified += 1;
          }
        }
        // Returned by its owner since the listing was taken.
        Ok(ReturnOutcome::AlreadyReturned(_)) | Ok(ReturnOutcome::NotFound) => {
          debug!(rental_id = %rental.rental_id, "sweep: rental no longer active");
        }
        Err(e) => {
          warn!(rental_id = %rental.rental_id, error = %e, "sweep: auto-return failed");
          report.failures += 1;
        }
      }
    }

    // ── Due-soon pass ─────────────────────────────────────────────────────
    for days in DUE_SOON_THRESHOLDS {
      for rental in rentals.iter().filter(|r| r.due_status(today) == DueStatus::DueIn(days)) {
        if self.remind(rental, days).await {
          report.due_soon_notified += 1;
        }
      }
    }

    info!(
      date = %today,
      auto_returned = report.auto_returned,
      overdue_notified = report.overdue_notified,
      due_soon_notified = report.due_soon_notified,
      failures = report.failures,
      "sweep complete"
    );
    report
  }

  async fn remind(&self, rental: &Rental, days: u32) -> bool {
    let title = self.find_title(rental.movie_id).await;
    let message = due_soon_message(rental.owner.as_str(), &title, days);
    self.dispatcher.send_to(rental.owner.as_str(), &message).is_delivered()
  }

  /// Never fails; a missing movie or a lookup error yields [`UNKNOWN_TITLE`].
  async fn find_title(&self, movie_id: Uuid) -> String {
    match self.store.get_movie(movie_id).await {
      Ok(Some(movie)) => movie.title,
      Ok(None) => UNKNOWN_TITLE.to_owned(),
      Err(e) => {
        warn!(%movie_id, error = %e, "sweep: movie title lookup failed");
        UNKNOWN_TITLE.to_owned()
      }
    }
  }
}

/// Run `sweeper` on every tick of `period`. The first tick fires immediately.
pub fn spawn_sweep_scheduler<S>(
  sweeper: Arc<RentalLifecycleSweeper<S>>,
  period: Duration,
) -> JoinHandle<()>
where
  S: RentalStore + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
      ticker.tick().await;
      sweeper.sweep().await;
    }
  })
}

// ─── Message templates ───────────────────────────────────────────────────────

pub fn overdue_message(username: &str, title: &str) -> String {
  format!(
    "Hello, {username}! Your rental for {title} is overdue. Please return it as soon as \
     possible. Thank you!"
  )
}

pub fn due_soon_message(username: &str, title: &str, days: u32) -> String {
  let unit = if days == 1 { "day" } else { "days" };
  format!(
    "Hello, {username}! Your rental for {title} will expire in {days} {unit}. Please return it \
     soon. Thank you!"
  )
}
