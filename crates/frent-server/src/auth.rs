//! Bearer-token extractors and password hashing.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use frent_core::{Identity, store::RentalStore, user::Role};
use frent_notify::token::bearer_token;
use rand_core::OsRng;

use crate::{AppState, error::Error};

/// The authenticated caller of a REST request.
#[derive(Debug, Clone)]
pub struct AuthUser {
  pub identity: Identity,
  pub role:     Role,
}

/// An [`AuthUser`] whose role is employee or admin. Members get `403`.
#[derive(Debug, Clone)]
pub struct StaffUser(pub AuthUser);

impl<S> FromRequestParts<AppState<S>> for AuthUser
where
  S: RentalStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = parts
      .headers
      .get(axum::http::header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(bearer_token)
      .ok_or(Error::Unauthorized)?;

    let claims = state.validator.validate_claims(token)?;
    let role = claims.role().ok_or(Error::Unauthorized)?;
    Ok(AuthUser { identity: claims.identity(), role })
  }
}

impl<S> FromRequestParts<AppState<S>> for StaffUser
where
  S: RentalStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !user.role.is_staff() {
      return Err(Error::Forbidden);
    }
    Ok(StaffUser(user))
  }
}

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::Internal(format!("password hashing: {e}")))
}

/// Whether `password` matches the stored PHC string. A malformed hash never
/// matches.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

#[cfg(test)]
mod tests {
  use axum::http::{Request, header};
  use frent_notify::{SigningKey, TokenIssuer};
  use frent_store_sqlite::SqliteStore;

  use super::*;
  use crate::tests::{issue, make_state};

  async fn extract<T>(req: Request<axum::body::Body>, state: &AppState<SqliteStore>) -> Result<T, Error>
  where
    T: FromRequestParts<AppState<SqliteStore>, Rejection = Error>,
  {
    let (mut parts, _) = req.into_parts();
    T::from_request_parts(&mut parts, state).await
  }

  fn bearer(token: &str) -> Request<axum::body::Body> {
    Request::builder()
      .header(header::AUTHORIZATION, format!("Bearer {token}"))
      .body(axum::body::Body::empty())
      .unwrap()
  }

  #[test]
  fn password_round_trip() {
    let hash = hash_password("hunter2").unwrap();
    assert!(verify_password("hunter2", &hash));
    assert!(!verify_password("hunter3", &hash));
    assert!(!verify_password("hunter2", "not-a-phc-string"));
  }

  #[tokio::test]
  async fn valid_token_yields_identity_and_role() {
    let state = make_state().await;
    let token = issue(&state, "alice", Role::Employee);
    let user: AuthUser = extract(bearer(&token), &state).await.unwrap();
    assert_eq!(user.identity.as_str(), "alice");
    assert_eq!(user.role, Role::Employee);
  }

  #[tokio::test]
  async fn missing_header_is_unauthorized() {
    let state = make_state().await;
    let req = Request::builder().body(axum::body::Body::empty()).unwrap();
    assert!(matches!(extract::<AuthUser>(req, &state).await, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn basic_scheme_is_unauthorized() {
    let state = make_state().await;
    let req = Request::builder()
      .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(extract::<AuthUser>(req, &state).await, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn foreign_key_is_rejected() {
    let state = make_state().await;
    let other = SigningKey::from_bytes(b"some-other-key".to_vec()).unwrap();
    let token = TokenIssuer::new(&other, chrono::Duration::hours(1))
      .issue(&Identity::new("alice"), Role::Admin)
      .unwrap();
    assert!(matches!(extract::<AuthUser>(bearer(&token), &state).await, Err(Error::Token(_))));
  }

  #[tokio::test]
  async fn member_is_not_staff() {
    let state = make_state().await;
    let token = issue(&state, "bob", Role::Member);
    assert!(matches!(extract::<StaffUser>(bearer(&token), &state).await, Err(Error::Forbidden)));

    let token = issue(&state, "carol", Role::Admin);
    let StaffUser(user) = extract(bearer(&token), &state).await.unwrap();
    assert_eq!(user.identity.as_str(), "carol");
  }
}
