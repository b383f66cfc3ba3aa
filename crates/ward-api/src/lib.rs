//! JSON REST API for Ward.
//!
//! Exposes an axum [`Router`] backed by any [`ward_core::store::ClinicStore`].
//! Request handling is three thin steps: the auth extractor resolves a
//! [`Principal`], the core engine resolves a scope or authorizes a mutation,
//! and the resulting intent is handed to the store.

pub mod appointments;
pub mod auth;
pub mod error;
pub mod prescriptions;
pub mod users;

use std::{path::PathBuf, sync::Arc};

use axum::{
  routing::{delete, get, patch, post},
  Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use ward_core::{
  scope::{resolve_scope, RecordFilter, ResourceKind, ScopeFilter},
  store::ClinicStore,
  Principal,
};

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Lifetime of issued session tokens.
  #[serde(default = "default_session_ttl_hours")]
  pub session_ttl_hours: i64,
  /// When `true`, status updates must follow the forward-only transition
  /// graph (pending → confirmed → completed, cancelled from
  /// pending/confirmed).
  #[serde(default)]
  pub enforce_status_order: bool,
}

fn default_session_ttl_hours() -> i64 { 24 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: ClinicStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the Ward API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ClinicStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Auth
    .route("/api/auth/register", post(auth::register::<S>))
    .route("/api/auth/login", post(auth::login::<S>))
    // Appointments
    .route(
      "/api/appointments",
      get(appointments::list::<S>).post(appointments::create::<S>),
    )
    .route("/api/appointments/{id}", delete(appointments::delete_one::<S>))
    .route(
      "/api/appointments/{id}/status",
      patch(appointments::update_status::<S>),
    )
    // Prescriptions
    .route(
      "/api/prescriptions",
      get(prescriptions::list::<S>).post(prescriptions::create::<S>),
    )
    // User directories
    .route("/api/users/doctors", get(users::doctors::<S>))
    .route("/api/users/my-patients", get(users::my_patients::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Resolve a record-kind scope to its row filter. Appointment and
/// prescription scopes always resolve to record filters; anything else here
/// is a wiring bug, not a caller error.
pub(crate) fn record_scope(
  principal: &Principal,
  kind: ResourceKind,
) -> Result<RecordFilter, ApiError> {
  match resolve_scope(principal, kind)? {
    ScopeFilter::Records(filter) => Ok(filter),
    _ => Err(ApiError::Internal("record scope mismatch".into())),
  }
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{header, Request, StatusCode},
  };
  use chrono::{Duration, Utc};
  use serde_json::{json, Value};
  use tower::ServiceExt as _;
  use uuid::Uuid;
  use ward_core::{
    appointment::{
      Appointment, AppointmentStatus, AppointmentView, NewAppointment,
    },
    authz::StatusUpdate,
    directory::{DoctorEntry, PatientSummary},
    prescription::{NewPrescription, Prescription, PrescriptionView},
    store::{NewSession, Session, StatusWrite, UserRecord},
    user::{NewUser, User},
    workflow::TransitionPolicy,
    Role,
  };
  use ward_store_sqlite::SqliteStore;

  use super::*;

  async fn make_state(enforce_status_order: bool) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState {
      store:  Arc::new(store),
      config: Arc::new(ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 3000,
        store_path: PathBuf::from(":memory:"),
        session_ttl_hours: 24,
        enforce_status_order,
      }),
    }
  }

  async fn request(
    state: AppState<SqliteStore>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  /// Register a user and return `(token, user_id)`.
  async fn register(
    state: &AppState<SqliteStore>,
    name: &str,
    role: &str,
  ) -> (String, String) {
    let (status, body) = request(
      state.clone(),
      "POST",
      "/api/auth/register",
      None,
      Some(json!({
        "name": name,
        "email": format!("{}@clinic.example", name.to_lowercase()),
        "password": "secret",
        "role": role,
        "department": if role == "doctor" { Value::from("cardiology") } else { Value::Null },
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    (
      body["token"].as_str().unwrap().to_string(),
      body["user"]["id"].as_str().unwrap().to_string(),
    )
  }

  async fn book_appointment(
    state: &AppState<SqliteStore>,
    token: &str,
    patient_id: &str,
    doctor_id: &str,
  ) -> String {
    let (status, body) = request(
      state.clone(),
      "POST",
      "/api/appointments",
      Some(token),
      Some(json!({
        "date": "2026-09-15T10:00:00Z",
        "description": "consultation",
        "patientId": patient_id,
        "doctorId": doctor_id,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "booking failed: {body}");
    body["id"].as_str().unwrap().to_string()
  }

  async fn set_status(
    state: &AppState<SqliteStore>,
    token: &str,
    appointment_id: &str,
    status: &str,
  ) -> (StatusCode, Value) {
    request(
      state.clone(),
      "PATCH",
      &format!("/api/appointments/{appointment_id}/status"),
      Some(token),
      Some(json!({ "status": status })),
    )
    .await
  }

  // ── Auth ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_returns_token_and_sanitised_user() {
    let state = make_state(false).await;
    let (status, body) = request(
      state,
      "POST",
      "/api/auth/register",
      None,
      Some(json!({
        "name": "Asli",
        "email": "asli@clinic.example",
        "password": "secret",
        "role": "patient",
      })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["role"], "patient");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());
  }

  #[tokio::test]
  async fn register_rejects_unknown_roles() {
    let state = make_state(false).await;
    let (status, _) = request(
      state,
      "POST",
      "/api/auth/register",
      None,
      Some(json!({
        "name": "Eve",
        "email": "eve@clinic.example",
        "password": "secret",
        "role": "superuser",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[tokio::test]
  async fn login_succeeds_with_correct_password_only() {
    let state = make_state(false).await;
    register(&state, "Asli", "patient").await;

    let (status, body) = request(
      state.clone(),
      "POST",
      "/api/auth/login",
      None,
      Some(json!({ "email": "asli@clinic.example", "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());

    // Wrong password and unknown email are the same observable failure.
    for payload in [
      json!({ "email": "asli@clinic.example", "password": "wrong" }),
      json!({ "email": "ghost@clinic.example", "password": "secret" }),
    ] {
      let (status, _) =
        request(state.clone(), "POST", "/api/auth/login", None, Some(payload))
          .await;
      assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
  }

  #[tokio::test]
  async fn requests_without_a_token_are_401() {
    let state = make_state(false).await;
    let (status, _) =
      request(state, "GET", "/api/appointments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn garbage_tokens_are_401() {
    let state = make_state(false).await;
    let (status, _) = request(
      state,
      "GET",
      "/api/appointments",
      Some("deadbeef"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn expired_session_tokens_are_401() {
    let state = make_state(false).await;
    let (_, patient_id) = register(&state, "Asli", "patient").await;

    // A session row whose lifetime has already lapsed: the extractor must
    // refuse it even though the digest matches.
    let token = auth::issue_token();
    state
      .store
      .create_session(NewSession {
        token_digest: auth::token_digest(&token),
        user_id:      patient_id.parse().unwrap(),
        role:         Role::Patient,
        expires_at:   Utc::now() - Duration::hours(1),
      })
      .await
      .unwrap();

    let (status, _) =
      request(state.clone(), "GET", "/api/appointments", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn duplicate_registration_email_is_409() {
    let state = make_state(false).await;
    register(&state, "Asli", "patient").await;

    let (status, body) = request(
      state.clone(),
      "POST",
      "/api/auth/register",
      None,
      Some(json!({
        "name": "Impostor",
        "email": "asli@clinic.example",
        "password": "different",
        "role": "patient",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
  }

  // ── Appointment scoping ──────────────────────────────────────────────────

  #[tokio::test]
  async fn patients_see_only_their_own_appointments() {
    let state = make_state(false).await;
    let (patient_tok, patient_id) = register(&state, "Asli", "patient").await;
    let (other_tok, other_id) = register(&state, "Baran", "patient").await;
    let (_, doctor_id) = register(&state, "Deniz", "doctor").await;

    book_appointment(&state, &patient_tok, &patient_id, &doctor_id).await;
    book_appointment(&state, &other_tok, &other_id, &doctor_id).await;

    let (status, body) =
      request(state.clone(), "GET", "/api/appointments", Some(&patient_tok), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["patientId"], patient_id.as_str());
    // Joined read model carries participant names.
    assert_eq!(rows[0]["doctorName"], "Deniz");
    assert_eq!(rows[0]["department"], "cardiology");
  }

  #[tokio::test]
  async fn admin_sees_every_appointment() {
    let state = make_state(false).await;
    let (patient_tok, patient_id) = register(&state, "Asli", "patient").await;
    let (other_tok, other_id) = register(&state, "Baran", "patient").await;
    let (_, doctor_id) = register(&state, "Deniz", "doctor").await;
    let (admin_tok, _) = register(&state, "Root", "admin").await;

    book_appointment(&state, &patient_tok, &patient_id, &doctor_id).await;
    book_appointment(&state, &other_tok, &other_id, &doctor_id).await;

    let (status, body) =
      request(state.clone(), "GET", "/api/appointments", Some(&admin_tok), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
  }

  // ── Status updates ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn patient_status_update_is_403_foreign_doctor_is_404() {
    let state = make_state(false).await;
    let (patient_tok, patient_id) = register(&state, "Asli", "patient").await;
    let (doctor_tok, doctor_id) = register(&state, "Deniz", "doctor").await;
    let (rival_tok, _) = register(&state, "Ece", "doctor").await;

    let appt = book_appointment(&state, &patient_tok, &patient_id, &doctor_id).await;

    // Wrong kind of actor: forbidden, before any lookup.
    let (status, _) = set_status(&state, &patient_tok, &appt, "confirmed").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Right kind of actor, wrong doctor: indistinguishable from missing.
    let (status, _) = set_status(&state, &rival_tok, &appt, "confirmed").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Owning doctor succeeds.
    let (status, body) = set_status(&state, &doctor_tok, &appt, "confirmed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");
  }

  #[tokio::test]
  async fn unknown_status_values_are_422() {
    let state = make_state(false).await;
    let (patient_tok, patient_id) = register(&state, "Asli", "patient").await;
    let (doctor_tok, doctor_id) = register(&state, "Deniz", "doctor").await;
    let appt = book_appointment(&state, &patient_tok, &patient_id, &doctor_id).await;

    let (status, _) = set_status(&state, &doctor_tok, &appt, "postponed").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[tokio::test]
  async fn enforced_transition_order_rejects_backward_moves() {
    let state = make_state(true).await;
    let (patient_tok, patient_id) = register(&state, "Asli", "patient").await;
    let (doctor_tok, doctor_id) = register(&state, "Deniz", "doctor").await;
    let appt = book_appointment(&state, &patient_tok, &patient_id, &doctor_id).await;

    let (status, _) = set_status(&state, &doctor_tok, &appt, "confirmed").await;
    assert_eq!(status, StatusCode::OK);

    // confirmed → pending is backward.
    let (status, _) = set_status(&state, &doctor_tok, &appt, "pending").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = set_status(&state, &doctor_tok, &appt, "completed").await;
    assert_eq!(status, StatusCode::OK);
  }

  // ── Deletion ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn deletion_is_participant_or_admin_only() {
    let state = make_state(false).await;
    let (patient_tok, patient_id) = register(&state, "Asli", "patient").await;
    let (_, doctor_id) = register(&state, "Deniz", "doctor").await;
    let (bystander_tok, _) = register(&state, "Baran", "patient").await;
    let (admin_tok, _) = register(&state, "Root", "admin").await;

    let appt = book_appointment(&state, &patient_tok, &patient_id, &doctor_id).await;

    let (status, _) = request(
      state.clone(),
      "DELETE",
      &format!("/api/appointments/{appt}"),
      Some(&bystander_tok),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(
      state.clone(),
      "DELETE",
      &format!("/api/appointments/{appt}"),
      Some(&admin_tok),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Gone now.
    let (status, _) = request(
      state.clone(),
      "DELETE",
      &format!("/api/appointments/{appt}"),
      Some(&admin_tok),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  /// A store whose appointment rows vanish between the authorizing fetch
  /// and the delete itself, as a concurrent writer could arrange.
  #[derive(Clone)]
  struct VanishingStore;

  impl ClinicStore for VanishingStore {
    type Error = std::convert::Infallible;

    async fn create_user(&self, _: NewUser) -> Result<User, Self::Error> {
      unimplemented!()
    }
    async fn find_user_by_email(
      &self,
      _: &str,
    ) -> Result<Option<UserRecord>, Self::Error> {
      unimplemented!()
    }
    async fn list_doctors(&self) -> Result<Vec<DoctorEntry>, Self::Error> {
      unimplemented!()
    }
    async fn list_confirmed_patients(
      &self,
      _: Uuid,
    ) -> Result<Vec<PatientSummary>, Self::Error> {
      unimplemented!()
    }
    async fn insert_appointment(
      &self,
      _: NewAppointment,
    ) -> Result<Appointment, Self::Error> {
      unimplemented!()
    }
    async fn list_appointments(
      &self,
      _: RecordFilter,
    ) -> Result<Vec<AppointmentView>, Self::Error> {
      unimplemented!()
    }
    async fn get_appointment(
      &self,
      id: Uuid,
    ) -> Result<Option<Appointment>, Self::Error> {
      Ok(Some(Appointment {
        id,
        date: Utc::now(),
        description: "consultation".into(),
        patient_id: Uuid::new_v4(),
        doctor_id: Uuid::new_v4(),
        status: AppointmentStatus::Pending,
      }))
    }
    async fn update_appointment_status(
      &self,
      _: Uuid,
      _: StatusUpdate,
      _: TransitionPolicy,
    ) -> Result<StatusWrite, Self::Error> {
      unimplemented!()
    }
    async fn delete_appointment(&self, _: Uuid) -> Result<bool, Self::Error> {
      Ok(false)
    }
    async fn insert_prescription(
      &self,
      _: NewPrescription,
    ) -> Result<Prescription, Self::Error> {
      unimplemented!()
    }
    async fn list_prescriptions(
      &self,
      _: RecordFilter,
    ) -> Result<Vec<PrescriptionView>, Self::Error> {
      unimplemented!()
    }
    async fn create_session(&self, _: NewSession) -> Result<(), Self::Error> {
      unimplemented!()
    }
    async fn find_session(
      &self,
      _: &str,
    ) -> Result<Option<Session>, Self::Error> {
      Ok(Some(Session {
        user_id:    Uuid::new_v4(),
        role:       Role::Admin,
        expires_at: Utc::now() + Duration::hours(1),
      }))
    }
  }

  #[tokio::test]
  async fn delete_losing_the_row_mid_flight_is_404() {
    let app = router(AppState {
      store:  Arc::new(VanishingStore),
      config: Arc::new(ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 3000,
        store_path: PathBuf::from(":memory:"),
        session_ttl_hours: 24,
        enforce_status_order: false,
      }),
    });

    let req = Request::builder()
      .method("DELETE")
      .uri(format!("/api/appointments/{}", Uuid::new_v4()))
      .header(header::AUTHORIZATION, "Bearer anything")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Prescriptions ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn prescription_doctor_id_cannot_be_spoofed() {
    let state = make_state(false).await;
    let (_, patient_id) = register(&state, "Asli", "patient").await;
    let (doctor_tok, doctor_id) = register(&state, "Deniz", "doctor").await;
    let (_, rival_id) = register(&state, "Ece", "doctor").await;

    let (status, body) = request(
      state.clone(),
      "POST",
      "/api/prescriptions",
      Some(&doctor_tok),
      Some(json!({
        "patientId": patient_id,
        "medications": "amoxicillin 500mg",
        "instructions": "three times daily",
        "doctorId": rival_id,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["doctorId"], doctor_id.as_str());
  }

  #[tokio::test]
  async fn only_doctors_may_create_prescriptions() {
    let state = make_state(false).await;
    let (patient_tok, patient_id) = register(&state, "Asli", "patient").await;

    let (status, _) = request(
      state.clone(),
      "POST",
      "/api/prescriptions",
      Some(&patient_tok),
      Some(json!({
        "patientId": patient_id,
        "medications": "aspirin",
        "instructions": "daily",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn prescriptions_are_scoped_like_appointments() {
    let state = make_state(false).await;
    let (patient_tok, patient_id) = register(&state, "Asli", "patient").await;
    let (other_tok, other_id) = register(&state, "Baran", "patient").await;
    let (doctor_tok, _) = register(&state, "Deniz", "doctor").await;

    for pid in [&patient_id, &other_id] {
      let (status, _) = request(
        state.clone(),
        "POST",
        "/api/prescriptions",
        Some(&doctor_tok),
        Some(json!({
          "patientId": pid,
          "medications": "ibuprofen",
          "instructions": "as needed",
        })),
      )
      .await;
      assert_eq!(status, StatusCode::CREATED);
    }

    let (_, mine) =
      request(state.clone(), "GET", "/api/prescriptions", Some(&patient_tok), None)
        .await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["patientId"], patient_id.as_str());

    let (_, other) =
      request(state.clone(), "GET", "/api/prescriptions", Some(&other_tok), None)
        .await;
    assert_eq!(other.as_array().unwrap().len(), 1);

    let (_, doctors_view) =
      request(state.clone(), "GET", "/api/prescriptions", Some(&doctor_tok), None)
        .await;
    assert_eq!(doctors_view.as_array().unwrap().len(), 2);
  }

  // ── Directories ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn any_caller_may_list_doctors() {
    let state = make_state(false).await;
    let (patient_tok, _) = register(&state, "Asli", "patient").await;
    register(&state, "Deniz", "doctor").await;
    register(&state, "Ece", "doctor").await;

    let (status, body) =
      request(state.clone(), "GET", "/api/users/doctors", Some(&patient_tok), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn my_patients_denies_non_doctors_and_dedupes() {
    let state = make_state(false).await;
    let (patient_tok, patient_id) = register(&state, "Asli", "patient").await;
    let (doctor_tok, doctor_id) = register(&state, "Deniz", "doctor").await;

    // Two appointments with the same patient, both confirmed.
    for _ in 0..2 {
      let appt =
        book_appointment(&state, &patient_tok, &patient_id, &doctor_id).await;
      let (status, _) = set_status(&state, &doctor_tok, &appt, "confirmed").await;
      assert_eq!(status, StatusCode::OK);
    }

    // A patient asking for a roster is denied, not handed an empty list.
    let (status, _) = request(
      state.clone(),
      "GET",
      "/api/users/my-patients",
      Some(&patient_tok),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(
      state.clone(),
      "GET",
      "/api/users/my-patients",
      Some(&doctor_tok),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let roster = body.as_array().unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0]["id"], patient_id.as_str());
  }
}
