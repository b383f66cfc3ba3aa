//! Handlers for `/api/appointments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/api/appointments` | Rows scoped to the caller's role |
//! | `POST`   | `/api/appointments` | Any role; stored status starts `pending` |
//! | `DELETE` | `/api/appointments/:id` | Participant or admin only |
//! | `PATCH`  | `/api/appointments/:id/status` | Owning doctor only |

use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use serde::Deserialize;
use uuid::Uuid;
use ward_core::{
  appointment::{Appointment, AppointmentStatus, AppointmentView, NewAppointment},
  authz,
  scope::ResourceKind,
  store::{ClinicStore, StatusWrite},
  workflow::TransitionPolicy,
  Error, Principal,
};

use crate::{error::ApiError, record_scope, AppState};

/// `GET /api/appointments`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
) -> Result<Json<Vec<AppointmentView>>, ApiError>
where
  S: ClinicStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let filter = record_scope(&principal, ResourceKind::Appointments)?;
  let rows = state
    .store
    .list_appointments(filter)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(rows))
}

/// `POST /api/appointments`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Json(body): Json<NewAppointment>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClinicStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let draft = authz::create_appointment(&principal, body)?;
  let appointment = state
    .store
    .insert_appointment(draft)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(appointment)))
}

/// `DELETE /api/appointments/:id`
///
/// The target is fetched first; the decision is made over the fetched row.
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ClinicStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let appointment = state
    .store
    .get_appointment(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(Error::NotFound)?;

  authz::delete_appointment(&principal, &appointment)?;

  // The row can vanish between the fetch and the delete; the store's
  // existence flag is authoritative.
  let deleted = state
    .store
    .delete_appointment(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(Error::NotFound.into());
  }
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: String,
}

/// `PATCH /api/appointments/:id/status`
///
/// Role is checked before any lookup; ownership is folded into the keyed
/// update, so "not yours" and "not there" are the same 404.
pub async fn update_status<S>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Appointment>, ApiError>
where
  S: ClinicStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let status = AppointmentStatus::parse(&body.status)?;
  let update = authz::update_appointment_status(&principal, status)?;
  let policy = TransitionPolicy::new(state.config.enforce_status_order);

  // The store applies the policy inside the keyed write, so there is no
  // window between reading the prior status and changing it.
  match state
    .store
    .update_appointment_status(id, update, policy)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
  {
    StatusWrite::Updated(appointment) => Ok(Json(appointment)),
    StatusWrite::Missing => Err(Error::NotFound.into()),
    StatusWrite::Rejected { from } => {
      Err(TransitionPolicy::rejection(from, status).into())
    }
  }
}
