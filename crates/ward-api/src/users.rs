//! Handlers for `/api/users` directory endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/users/doctors` | Any authenticated caller |
//! | `GET`  | `/api/users/my-patients` | Doctors only — 403 otherwise, never an empty list |

use axum::{extract::State, Json};
use ward_core::{
  directory::{dedup_patients, DoctorEntry, PatientSummary},
  scope::{resolve_scope, ResourceKind, ScopeFilter},
  store::ClinicStore,
  Principal,
};

use crate::{error::ApiError, AppState};

/// `GET /api/users/doctors`
pub async fn doctors<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
) -> Result<Json<Vec<DoctorEntry>>, ApiError>
where
  S: ClinicStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  resolve_scope(&principal, ResourceKind::DoctorDirectory)?;
  let rows = state
    .store
    .list_doctors()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(rows))
}

/// `GET /api/users/my-patients`
pub async fn my_patients<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
) -> Result<Json<Vec<PatientSummary>>, ApiError>
where
  S: ClinicStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let doctor_id = match resolve_scope(&principal, ResourceKind::MyPatients)? {
    ScopeFilter::PatientsOf(id) => id,
    _ => return Err(ApiError::Internal("roster scope mismatch".into())),
  };

  let rows = state
    .store
    .list_confirmed_patients(doctor_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(dedup_patients(rows)))
}
