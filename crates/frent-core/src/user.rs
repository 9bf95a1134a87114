//! Registered accounts and their roles.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, identity::Identity};

/// Authorisation level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  Member,
  Employee,
  Admin,
}

impl Role {
  /// Employees and admins may manage the catalogue and push notifications.
  pub fn is_staff(self) -> bool { matches!(self, Self::Employee | Self::Admin) }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Member => "member",
      Self::Employee => "employee",
      Self::Admin => "admin",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "member" => Ok(Self::Member),
      "employee" => Ok(Self::Employee),
      "admin" => Ok(Self::Admin),
      _ => Err(Error::UnknownRole(s.to_owned())),
    }
  }
}

/// A persisted account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  pub username:      Identity,
  pub email:         String,
  pub role:          Role,
  /// Argon2 PHC string. Never serialised into API responses.
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

/// Input for [`RentalStore::add_user`](crate::store::RentalStore::add_user).
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      Identity,
  pub email:         String,
  pub role:          Role,
  pub password_hash: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_parses_case_insensitively() {
    assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
    assert_eq!("employee".parse::<Role>().unwrap(), Role::Employee);
    assert!(matches!("guest".parse::<Role>(), Err(Error::UnknownRole(_))));
  }

  #[test]
  fn only_employees_and_admins_are_staff() {
    assert!(!Role::Member.is_staff());
    assert!(Role::Employee.is_staff());
    assert!(Role::Admin.is_staff());
  }
}
