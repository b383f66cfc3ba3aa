//! Error taxonomy for `ward-core`.
//!
//! Four reasons cover every deny the policy engine can produce. The core
//! never logs, retries, or recovers — it hands a typed reason to its caller
//! and lets the transport layer translate it into a response code.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// The caller lacks the role or ownership required for the action.
  #[error("forbidden")]
  Forbidden,

  /// The target does not exist — or, for ownership-guarded lookups, exists
  /// but is deliberately indistinguishable from non-existence.
  #[error("not found")]
  NotFound,

  /// Malformed or out-of-enum input.
  #[error("validation: {0}")]
  Validation(String),

  /// A state clash: a transition the configured policy does not permit, or
  /// a uniqueness violation such as a duplicate registration email.
  #[error("conflict: {0}")]
  Conflict(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
