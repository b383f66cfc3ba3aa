//! User records — referenced by appointments and prescriptions.
//!
//! The core treats `department` as meaningful only for doctors; for other
//! roles it is carried but never consulted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::principal::Role;

/// A registered user. The credential hash lives in storage, never here —
/// this shape is safe to serialise into responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:         Uuid,
  pub name:       String,
  pub email:      String,
  pub role:       Role,
  pub department: Option<String>,
}

/// Creation shape for a user. `password_hash` is an opaque PHC string
/// produced by the credential collaborator; the core never inspects it.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
  pub department:    Option<String>,
}
