//! Credential hashing, bearer-session issuance, and the `Principal`
//! extractor.
//!
//! Passwords are stored as argon2 PHC strings. Session tokens are 32 random
//! bytes, hex-encoded for the client; only their SHA-256 digest is persisted,
//! so a leaked sessions table cannot be replayed. Handlers never see raw
//! tokens — they receive a verified [`Principal`].

use argon2::{
  password_hash::SaltString, Argon2, PasswordHash, PasswordHasher as _,
  PasswordVerifier as _,
};
use axum::{
  extract::{FromRequestParts, State},
  http::{request::Parts, HeaderMap, StatusCode},
  response::IntoResponse,
  Json,
};
use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use ward_core::{
  store::{ClinicStore, NewSession, StoreErrorKind as _},
  user::{NewUser, User},
  Error as CoreError, Principal, Role,
};

use crate::{error::ApiError, AppState};

// ─── Password hashing ────────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Constant outcome shape: any parse or verify failure reads as a mismatch.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|hash| {
      Argon2::default().verify_password(password.as_bytes(), &hash)
    })
    .is_ok()
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// A fresh opaque bearer token: 32 bytes from the OS RNG, hex-encoded.
pub fn issue_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// The digest under which a token is persisted and looked up.
pub fn token_digest(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
  headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .ok_or(ApiError::Unauthorized)
}

// ─── Principal extractor ─────────────────────────────────────────────────────

impl<S> FromRequestParts<AppState<S>> for Principal
where
  S: ClinicStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)?;
    let digest = token_digest(token);

    let session = state
      .store
      .find_session(&digest)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?
      .ok_or(ApiError::Unauthorized)?;

    if session.expires_at <= Utc::now() {
      return Err(ApiError::Unauthorized);
    }

    Ok(Principal::new(session.user_id, session.role))
  }
}

// ─── Register / login handlers ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
  pub name:       String,
  pub email:      String,
  pub password:   String,
  /// Validated against the closed role set; unknown values are rejected.
  pub role:       String,
  pub department: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// Token plus the user it belongs to — the response to both auth routes.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
  pub token: String,
  pub user:  User,
}

async fn open_session<S>(
  state: &AppState<S>,
  user: &User,
) -> Result<String, ApiError>
where
  S: ClinicStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let token = issue_token();
  state
    .store
    .create_session(NewSession {
      token_digest: token_digest(&token),
      user_id:      user.id,
      role:         user.role,
      expires_at:   Utc::now() + Duration::hours(state.config.session_ttl_hours),
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(token)
}

/// `POST /api/auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClinicStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let role = Role::parse(&body.role)?;
  let password_hash = hash_password(&body.password)?;

  let user = state
    .store
    .create_user(NewUser {
      name: body.name,
      email: body.email,
      password_hash,
      role,
      department: body.department,
    })
    .await
    .map_err(|e| {
      if e.is_email_taken() {
        ApiError::Denied(CoreError::Conflict("email already registered".into()))
      } else {
        ApiError::Store(Box::new(e))
      }
    })?;

  let token = open_session(&state, &user).await?;
  Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// `POST /api/auth/login`
///
/// Unknown email and wrong password are the same observable failure.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<AuthResponse>, ApiError>
where
  S: ClinicStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let record = state
    .store
    .find_user_by_email(&body.email)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(ApiError::Unauthorized)?;

  if !verify_password(&body.password, &record.password_hash) {
    return Err(ApiError::Unauthorized);
  }

  let token = open_session(&state, &record.user).await?;
  Ok(Json(AuthResponse { token, user: record.user }))
}
