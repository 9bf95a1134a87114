//! Account registration and login.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/auth/register` | `{username,email,password}`; always a member; 409 on duplicates |
//! | `POST` | `/api/auth/login` | `{email,password}` → `{"token": ...}` |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use frent_core::{
  Identity,
  store::{InsertOutcome, RentalStore},
  user::{NewUser, Role},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
  AppState,
  auth::{hash_password, verify_password},
  error::Error,
};

// ─── Register ─────────────────────────────────────────────────────────────────

/// Self-registration never grants a staff role; any `role` field in the
/// request is ignored.
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username: String,
  pub email:    String,
  pub password: String,
}

/// `POST /api/auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, Error>
where
  S: RentalStore,
{
  let username = body.username.trim();
  let email = body.email.trim();
  if username.is_empty() || email.is_empty() || body.password.is_empty() {
    return Err(Error::BadRequest("username, email and password are required".into()));
  }

  if state
    .store
    .get_user_by_username(username)
    .await
    .map_err(Error::store)?
    .is_some()
  {
    return Err(Error::Conflict(format!("username {username} is taken")));
  }
  if state
    .store
    .get_user_by_email(email)
    .await
    .map_err(Error::store)?
    .is_some()
  {
    return Err(Error::Conflict(format!("email {email} is already registered")));
  }

  // The lookups above give precise messages; the unique constraints behind
  // `add_user` still settle concurrent registrations.
  let outcome = state
    .store
    .add_user(NewUser {
      username:      Identity::new(username),
      email:         email.to_owned(),
      role:          Role::Member,
      password_hash: hash_password(&body.password)?,
    })
    .await
    .map_err(Error::store)?;
  let InsertOutcome::Inserted(user) = outcome else {
    return Err(Error::Conflict(format!("username {username} or email {email} is taken")));
  };

  info!(identity = %user.username, role = %user.role, "account registered");
  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
  pub token: String,
}

/// `POST /api/auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, Error>
where
  S: RentalStore,
{
  let user = state
    .store
    .get_user_by_email(body.email.trim())
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;

  if !verify_password(&body.password, &user.password_hash) {
    return Err(Error::Unauthorized);
  }

  let token = state
    .issuer
    .issue(&user.username, user.role)
    .map_err(|e| Error::Internal(e.to_string()))?;
  Ok(Json(LoginResponse { token }))
}
