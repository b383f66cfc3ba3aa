//! Principal — the resolved identity handed to every core operation.
//!
//! The session-verification layer produces one `Principal` per request from
//! a verified session. The core never sees raw tokens or credentials; it
//! trusts the `(id, role)` pair and nothing else about the caller.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The closed set of roles a user can hold.
///
/// Role strings are validated once, at the boundary where a `Principal` is
/// constructed. An unknown role never reaches a policy comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Patient,
  Doctor,
  Admin,
}

impl Role {
  /// Parse a stored or client-supplied role string. Fails closed: anything
  /// outside the closed set is a validation error, never a default.
  pub fn parse(s: &str) -> Result<Role> {
    match s {
      "patient" => Ok(Role::Patient),
      "doctor" => Ok(Role::Doctor),
      "admin" => Ok(Role::Admin),
      other => Err(Error::Validation(format!("unknown role: {other:?}"))),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Patient => "patient",
      Role::Doctor => "doctor",
      Role::Admin => "admin",
    }
  }
}

/// The authenticated identity making a request. Immutable per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub id:   Uuid,
  pub role: Role,
}

impl Principal {
  pub fn new(id: Uuid, role: Role) -> Self { Self { id, role } }

  pub fn is_admin(&self) -> bool { self.role == Role::Admin }

  pub fn is_doctor(&self) -> bool { self.role == Role::Doctor }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_accepts_the_closed_set() {
    assert_eq!(Role::parse("patient").unwrap(), Role::Patient);
    assert_eq!(Role::parse("doctor").unwrap(), Role::Doctor);
    assert_eq!(Role::parse("admin").unwrap(), Role::Admin);
  }

  #[test]
  fn parse_rejects_unknown_roles() {
    assert!(matches!(Role::parse("root"), Err(Error::Validation(_))));
    assert!(matches!(Role::parse(""), Err(Error::Validation(_))));
    // Case-sensitive: stored values are already normalised.
    assert!(matches!(Role::parse("Admin"), Err(Error::Validation(_))));
  }

  #[test]
  fn roles_round_trip_through_as_str() {
    for role in [Role::Patient, Role::Doctor, Role::Admin] {
      assert_eq!(Role::parse(role.as_str()).unwrap(), role);
    }
  }
}
