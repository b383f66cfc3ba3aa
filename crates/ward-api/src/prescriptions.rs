//! Handlers for `/api/prescriptions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/prescriptions` | Rows scoped to the caller's role |
//! | `POST` | `/api/prescriptions` | Doctors only; `doctorId` in the body is ignored |

use axum::{
  extract::State,
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use serde::Deserialize;
use uuid::Uuid;
use ward_core::{
  authz::{self, PrescriptionDraft},
  prescription::PrescriptionView,
  scope::ResourceKind,
  store::ClinicStore,
  Principal,
};

use crate::{error::ApiError, record_scope, AppState};

/// `GET /api/prescriptions`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
) -> Result<Json<Vec<PrescriptionView>>, ApiError>
where
  S: ClinicStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let filter = record_scope(&principal, ResourceKind::Prescriptions)?;
  let rows = state
    .store
    .list_prescriptions(filter)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub patient_id:   Uuid,
  pub medications:  String,
  pub instructions: String,
  /// Accepted but never trusted; the authorizer binds the caller's own id.
  pub doctor_id:    Option<Uuid>,
}

/// `POST /api/prescriptions`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClinicStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let bound = authz::create_prescription(&principal, PrescriptionDraft {
    patient_id:   body.patient_id,
    medications:  body.medications,
    instructions: body.instructions,
    doctor_id:    body.doctor_id,
  })?;

  let prescription = state
    .store
    .insert_prescription(bound)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(prescription)))
}
