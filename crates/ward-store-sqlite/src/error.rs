//! Error type for `ward-store-sqlite`.

use thiserror::Error;
use ward_core::store::StoreErrorKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] ward_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A registration attempted to reuse an existing email.
  #[error("email already registered: {0}")]
  EmailTaken(String),
}

impl StoreErrorKind for Error {
  fn is_email_taken(&self) -> bool { matches!(self, Error::EmailTaken(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
