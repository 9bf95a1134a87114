//! The identity key used for sessions and rental ownership.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

/// A username. Unique, immutable once registered, and the sole key used to
/// look up a live session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
  pub fn new(username: impl Into<String>) -> Self { Self(username.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for Identity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl Borrow<str> for Identity {
  fn borrow(&self) -> &str { &self.0 }
}

impl From<String> for Identity {
  fn from(s: String) -> Self { Self(s) }
}

impl From<&str> for Identity {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}
