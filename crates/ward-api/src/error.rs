//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Core policy denials carry their own taxonomy; this type adds the
//! transport-only cases (no/invalid session, storage failure) and maps
//! everything onto status codes and a JSON error body.

use axum::{
  http::{header, HeaderValue, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Missing, malformed, or expired session token — or a failed login.
  #[error("unauthorized")]
  Unauthorized,

  /// A policy decision from the core engine.
  #[error(transparent)]
  Denied(#[from] ward_core::Error),

  #[error("internal error: {0}")]
  Internal(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, "unauthorized".to_string())
      }
      ApiError::Denied(e) => {
        let status = match e {
          ward_core::Error::Forbidden => StatusCode::FORBIDDEN,
          ward_core::Error::NotFound => StatusCode::NOT_FOUND,
          ward_core::Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
          ward_core::Error::Conflict(_) => StatusCode::CONFLICT,
        };
        (status, e.to_string())
      }
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Bearer realm=\"ward\""),
      );
    }
    res
  }
}
