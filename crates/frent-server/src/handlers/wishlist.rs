//! Handlers for the caller's wishlist.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use frent_core::store::RentalStore;
use uuid::Uuid;

use super::movies::load_movie;
use crate::{AppState, auth::AuthUser, error::Error};

/// `GET /api/wishlist`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  user: AuthUser,
) -> Result<Json<Vec<Uuid>>, Error>
where
  S: RentalStore,
{
  let ids = state.store.wishlist(&user.identity).await.map_err(Error::store)?;
  Ok(Json(ids))
}

/// `PUT /api/wishlist/{movie_id}`
pub async fn add<S>(
  State(state): State<AppState<S>>,
  user: AuthUser,
  Path(movie_id): Path<Uuid>,
) -> Result<StatusCode, Error>
where
  S: RentalStore,
{
  load_movie(&state, movie_id).await?;
  state
    .store
    .add_to_wishlist(&user.identity, movie_id)
    .await
    .map_err(Error::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/wishlist/{movie_id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  user: AuthUser,
  Path(movie_id): Path<Uuid>,
) -> Result<StatusCode, Error>
where
  S: RentalStore,
{
  state
    .store
    .remove_from_wishlist(&user.identity, movie_id)
    .await
    .map_err(Error::store)?;
  Ok(StatusCode::NO_CONTENT)
}
