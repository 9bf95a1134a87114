//! Handlers for `/api/rentals` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/rentals/{movie_id}` | rent for the caller; 409 if already renting it |
//! | `PUT`  | `/api/rentals/{id}/return` | owner or staff; 409 if already returned |
//! | `GET`  | `/api/rentals/mine` | auto-returns the caller's overdue rentals first |
//! | `GET`  | `/api/rentals/mine/total` | sum of the caller's rental prices |
//! | `POST` | `/api/rentals/sweep` | staff; runs one lifecycle sweep now |
//! | `GET`  | `/api/rentals` | staff; every rental |
//! | `GET`  | `/api/rentals/user/{username}` | staff; one user's rentals |
//! | `GET`  | `/api/rentals/user/{username}/total` | staff; one user's total spend |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{Local, NaiveDate};
use frent_core::{
  Identity,
  rental::{DueStatus, NewRental, Rental, ReturnOutcome},
  store::{InsertOutcome, RentalStore},
};
use frent_notify::SweepReport;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::movies::load_movie;
use crate::{
  AppState,
  auth::{AuthUser, StaffUser},
  error::Error,
};

fn today() -> NaiveDate { Local::now().date_naive() }

/// `POST /api/rentals/{movie_id}`
pub async fn rent<S>(
  State(state): State<AppState<S>>,
  user: AuthUser,
  Path(movie_id): Path<Uuid>,
) -> Result<impl IntoResponse, Error>
where
  S: RentalStore,
{
  let movie = load_movie(&state, movie_id).await?;
  if !movie.available {
    return Err(Error::Conflict(format!("movie {movie_id} is not available")));
  }

  let outcome = state
    .store
    .add_rental(NewRental {
      owner: user.identity,
      movie_id,
      rental_date: today(),
      price: movie.price,
    })
    .await
    .map_err(Error::store)?;
  let InsertOutcome::Inserted(rental) = outcome else {
    return Err(Error::Conflict(format!("you already rent movie {movie_id}")));
  };

  info!(rental_id = %rental.rental_id, owner = %rental.owner, due = %rental.due_date, "rented");
  Ok((StatusCode::CREATED, Json(rental)))
}

/// `PUT /api/rentals/{id}/return`
pub async fn return_one<S>(
  State(state): State<AppState<S>>,
  user: AuthUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Rental>, Error>
where
  S: RentalStore,
{
  let not_found = || Error::NotFound(format!("rental {id} not found"));

  let rental = state
    .store
    .get_rental(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(not_found)?;
  // Members cannot see other members' rentals at all.
  if !user.role.is_staff() && rental.owner != user.identity {
    return Err(not_found());
  }

  match state.store.mark_returned(id, today()).await.map_err(Error::store)? {
    ReturnOutcome::Returned(rental) => Ok(Json(rental)),
    ReturnOutcome::AlreadyReturned(_) => {
      Err(Error::Conflict(format!("rental {id} has already been returned")))
    }
    ReturnOutcome::NotFound => Err(not_found()),
  }
}

/// `GET /api/rentals/mine`
pub async fn mine<S>(
  State(state): State<AppState<S>>,
  user: AuthUser,
) -> Result<Json<Vec<Rental>>, Error>
where
  S: RentalStore,
{
  let today = today();
  let mut rentals = state
    .store
    .list_rentals_for(&user.identity)
    .await
    .map_err(Error::store)?;

  for rental in rentals.iter_mut() {
    if rental.due_status(today) != DueStatus::Overdue {
      continue;
    }
    match state
      .store
      .mark_returned(rental.rental_id, today)
      .await
      .map_err(Error::store)?
    {
      ReturnOutcome::Returned(updated) | ReturnOutcome::AlreadyReturned(updated) => {
        debug!(rental_id = %updated.rental_id, "overdue rental returned on read");
        *rental = updated;
      }
      ReturnOutcome::NotFound => {}
    }
  }

  Ok(Json(rentals))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TotalSpent {
  pub total: f64,
}

async fn total_for<S>(state: &AppState<S>, owner: &Identity) -> Result<TotalSpent, Error>
where
  S: RentalStore,
{
  let rentals = state.store.list_rentals_for(owner).await.map_err(Error::store)?;
  Ok(TotalSpent { total: rentals.iter().map(|r| r.price).sum() })
}

/// `GET /api/rentals/mine/total`
pub async fn total<S>(
  State(state): State<AppState<S>>,
  user: AuthUser,
) -> Result<Json<TotalSpent>, Error>
where
  S: RentalStore,
{
  Ok(Json(total_for(&state, &user.identity).await?))
}

// ─── Staff views ──────────────────────────────────────────────────────────────

/// `GET /api/rentals`
pub async fn list_all<S>(
  State(state): State<AppState<S>>,
  _staff: StaffUser,
) -> Result<Json<Vec<Rental>>, Error>
where
  S: RentalStore,
{
  Ok(Json(state.store.list_all_rentals().await.map_err(Error::store)?))
}

/// `GET /api/rentals/user/{username}`
pub async fn for_user<S>(
  State(state): State<AppState<S>>,
  _staff: StaffUser,
  Path(username): Path<String>,
) -> Result<Json<Vec<Rental>>, Error>
where
  S: RentalStore,
{
  let owner = Identity::new(username);
  Ok(Json(state.store.list_rentals_for(&owner).await.map_err(Error::store)?))
}

/// `GET /api/rentals/user/{username}/total`
pub async fn total_for_user<S>(
  State(state): State<AppState<S>>,
  _staff: StaffUser,
  Path(username): Path<String>,
) -> Result<Json<TotalSpent>, Error>
where
  S: RentalStore,
{
  Ok(Json(total_for(&state, &Identity::new(username)).await?))
}

/// `POST /api/rentals/sweep`
pub async fn sweep<S>(
  State(state): State<AppState<S>>,
  _staff: StaffUser,
) -> Json<SweepReport>
where
  S: RentalStore,
{
  Json(state.sweeper.sweep().await)
}
