//! Bearer credential validation.
//!
//! Credentials are HS256 JWTs whose `sub` claim carries the username and whose
//! `iss` claim carries the lower-case role. The signing key is an immutable
//! value handed to the validator at construction.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{DateTime, Duration, Utc};
use frent_core::{Identity, user::Role};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
  #[error("missing credential")]
  Missing,

  #[error("malformed credential")]
  Malformed,

  #[error("signature does not verify")]
  BadSignature,

  #[error("credential expired")]
  Expired,

  #[error("credential has no subject")]
  EmptySubject,

  #[error("invalid signing key: {0}")]
  InvalidKey(String),

  #[error("could not sign credential")]
  Signing(#[source] jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
  fn from(e: jsonwebtoken::errors::Error) -> Self {
    match e.kind() {
      ErrorKind::ExpiredSignature => Self::Expired,
      ErrorKind::InvalidSignature => Self::BadSignature,
      _ => Self::Malformed,
    }
  }
}

/// The claims carried by a Frent credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub sub: String,
  pub iss: String,
  pub iat: i64,
  pub exp: i64,
}

impl Claims {
  pub fn identity(&self) -> Identity { Identity::new(self.sub.clone()) }

  /// The role recorded in `iss`, if it names one.
  pub fn role(&self) -> Option<Role> { self.iss.parse().ok() }
}

/// Raw HMAC key material.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
  /// Decode a base64-encoded secret, as stored in configuration.
  pub fn from_base64(encoded: &str) -> Result<Self, TokenError> {
    let bytes = B64
      .decode(encoded.trim())
      .map_err(|e| TokenError::InvalidKey(e.to_string()))?;
    Self::from_bytes(bytes)
  }

  pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
    let bytes = bytes.into();
    if bytes.is_empty() {
      return Err(TokenError::InvalidKey("key is empty".into()));
    }
    Ok(Self(bytes))
  }
}

impl std::fmt::Debug for SigningKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("SigningKey(..)")
  }
}

/// Strip a case-insensitive `Bearer ` prefix from an `Authorization` value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
  let (scheme, token) = header_value.trim().split_once(' ')?;
  if !scheme.eq_ignore_ascii_case("bearer") {
    return None;
  }
  let token = token.trim();
  (!token.is_empty()).then_some(token)
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Verifies credentials against a fixed key. Holds no mutable state.
pub struct TokenValidator {
  key:        DecodingKey,
  validation: Validation,
}

impl TokenValidator {
  pub fn new(key: &SigningKey) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);
    Self {
      key: DecodingKey::from_secret(&key.0),
      validation,
    }
  }

  /// Verify signature and expiry and return the decoded claims.
  pub fn validate_claims(&self, credential: &str) -> Result<Claims, TokenError> {
    let data = jsonwebtoken::decode::<Claims>(credential, &self.key, &self.validation)?;
    if data.claims.sub.trim().is_empty() {
      return Err(TokenError::EmptySubject);
    }
    Ok(data.claims)
  }

  pub fn validate(&self, credential: &str) -> Result<Identity, TokenError> {
    self.validate_claims(credential).map(|c| c.identity())
  }
}

// ─── Issuance ────────────────────────────────────────────────────────────────

/// Signs credentials for successful logins.
pub struct TokenIssuer {
  key: EncodingKey,
  ttl: Duration,
}

impl TokenIssuer {
  pub fn new(key: &SigningKey, ttl: Duration) -> Self {
    Self { key: EncodingKey::from_secret(&key.0), ttl }
  }

  pub fn issue(&self, identity: &Identity, role: Role) -> Result<String, TokenError> {
    self.issue_at(identity, role, Utc::now())
  }

  pub fn issue_at(
    &self,
    identity:  &Identity,
    role:      Role,
    issued_at: DateTime<Utc>,
  ) -> Result<String, TokenError> {
    let claims = Claims {
      sub: identity.as_str().to_owned(),
      iss: role.as_str().to_owned(),
      iat: issued_at.timestamp(),
      exp: (issued_at + self.ttl).timestamp(),
    };
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
      .map_err(TokenError::Signing)
  }
}
