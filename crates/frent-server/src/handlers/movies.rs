//! Handlers for `/api/movies` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/movies` | whole catalogue, by title |
//! | `POST` | `/api/movies` | staff |
//! | `GET`  | `/api/movies/{id}` | 404 if not found |
//! | `PUT`  | `/api/movies/{id}/available` | staff; notifies wishlists |
//! | `PUT`  | `/api/movies/{id}/unavailable` | staff |
//! | `PUT`  | `/api/movies/{id}/discount/{percent}` | staff; notifies wishlists |
//! | `PUT`  | `/api/movies/{id}/revert-price/{price}` | staff; silent |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use frent_core::{
  movie::{Movie, NewMovie, check_price, discounted_price},
  store::RentalStore,
};
use tracing::info;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{AuthUser, StaffUser},
  error::Error,
};

pub(crate) async fn load_movie<S>(state: &AppState<S>, id: Uuid) -> Result<Movie, Error>
where
  S: RentalStore,
{
  state
    .store
    .get_movie(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("movie {id} not found")))
}

/// `POST /api/movies`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _staff: StaffUser,
  Json(body): Json<NewMovie>,
) -> Result<impl IntoResponse, Error>
where
  S: RentalStore,
{
  body.validate()?;
  let movie = state.store.add_movie(body).await.map_err(Error::store)?;
  Ok((StatusCode::CREATED, Json(movie)))
}

/// `GET /api/movies`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _user: AuthUser,
) -> Result<Json<Vec<Movie>>, Error>
where
  S: RentalStore,
{
  Ok(Json(state.store.list_movies().await.map_err(Error::store)?))
}

/// `GET /api/movies/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _user: AuthUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Movie>, Error>
where
  S: RentalStore,
{
  Ok(Json(load_movie(&state, id).await?))
}

// ─── Availability ─────────────────────────────────────────────────────────────

/// `PUT /api/movies/{id}/available`
pub async fn make_available<S>(
  State(state): State<AppState<S>>,
  _staff: StaffUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Movie>, Error>
where
  S: RentalStore,
{
  let movie = load_movie(&state, id).await?;
  if movie.available {
    return Err(Error::Conflict(format!("movie {id} is already available")));
  }
  let movie = state.store.set_availability(id, true).await.map_err(Error::store)?;
  let notified = state.availability.on_became_available(&movie).await;
  info!(movie_id = %id, notified, "movie available");
  Ok(Json(movie))
}

/// `PUT /api/movies/{id}/unavailable`
pub async fn make_unavailable<S>(
  State(state): State<AppState<S>>,
  _staff: StaffUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Movie>, Error>
where
  S: RentalStore,
{
  let movie = load_movie(&state, id).await?;
  if !movie.available {
    return Err(Error::Conflict(format!("movie {id} is already unavailable")));
  }
  let movie = state.store.set_availability(id, false).await.map_err(Error::store)?;
  Ok(Json(movie))
}

// ─── Pricing ──────────────────────────────────────────────────────────────────

/// `PUT /api/movies/{id}/discount/{percent}`
pub async fn discount<S>(
  State(state): State<AppState<S>>,
  _staff: StaffUser,
  Path((id, percent)): Path<(Uuid, f64)>,
) -> Result<Json<Movie>, Error>
where
  S: RentalStore,
{
  let movie = load_movie(&state, id).await?;
  let old_price = movie.price;
  let new_price = discounted_price(old_price, percent)?;
  if new_price == old_price {
    return Err(Error::Conflict(format!("movie {id} is already at {old_price:.2}")));
  }

  let movie = state.store.set_price(id, new_price).await.map_err(Error::store)?;
  let notified = state.availability.on_price_changed(&movie, old_price, new_price).await;
  info!(movie_id = %id, old_price, new_price, notified, "movie discounted");
  Ok(Json(movie))
}

/// `PUT /api/movies/{id}/revert-price/{price}`
pub async fn revert_price<S>(
  State(state): State<AppState<S>>,
  _staff: StaffUser,
  Path((id, price)): Path<(Uuid, f64)>,
) -> Result<Json<Movie>, Error>
where
  S: RentalStore,
{
  check_price(price)?;
  load_movie(&state, id).await?;
  let movie = state.store.set_price(id, price).await.map_err(Error::store)?;
  Ok(Json(movie))
}
