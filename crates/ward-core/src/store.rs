//! The `ClinicStore` trait and supporting row types.
//!
//! The trait is implemented by storage backends (e.g. `ward-store-sqlite`).
//! The policy engine never talks to storage directly; handlers resolve a
//! scope or authorize a mutation, then hand the resulting intent to a store.
//! Every read takes a declarative filter from [`crate::scope`] and every
//! ownership-guarded write is keyed (id plus owner id), so the backend needs
//! only equality predicates and foreign-key joins.
//!
//! All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  appointment::{Appointment, AppointmentStatus, AppointmentView, NewAppointment},
  authz::StatusUpdate,
  directory::{DoctorEntry, PatientSummary},
  prescription::{NewPrescription, Prescription, PrescriptionView},
  principal::Role,
  scope::RecordFilter,
  user::{NewUser, User},
  workflow::TransitionPolicy,
};

// ─── Backend error classification ────────────────────────────────────────────

/// The distinctions a transport layer needs on a backend error. Anything the
/// trait does not name is a plain internal failure.
pub trait StoreErrorKind {
  /// True when a user insert hit the unique-email constraint.
  fn is_email_taken(&self) -> bool;
}

impl StoreErrorKind for std::convert::Infallible {
  fn is_email_taken(&self) -> bool { false }
}

// ─── Credential and session rows ─────────────────────────────────────────────

/// A user together with their stored credential hash. Returned only to the
/// login path; everything else works with [`User`].
#[derive(Debug, Clone)]
pub struct UserRecord {
  pub user:          User,
  pub password_hash: String,
}

/// An issued session. The store holds only an opaque digest of the bearer
/// token, never the token itself.
#[derive(Debug, Clone)]
pub struct Session {
  pub user_id:    Uuid,
  pub role:       Role,
  pub expires_at: DateTime<Utc>,
}

/// Creation shape for a session row.
#[derive(Debug, Clone)]
pub struct NewSession {
  pub token_digest: String,
  pub user_id:      Uuid,
  pub role:         Role,
  pub expires_at:   DateTime<Utc>,
}

/// Outcome of a keyed status write.
#[derive(Debug, Clone)]
pub enum StatusWrite {
  /// The row was written; here is its new state.
  Updated(Appointment),
  /// No row matches the id and owner key. Missing and not-owned are
  /// deliberately the same outcome.
  Missing,
  /// The row exists and is owned, but its current status is not an
  /// admissible starting point for the requested transition.
  Rejected { from: AppointmentStatus },
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Ward storage backend.
pub trait ClinicStore: Send + Sync {
  type Error: std::error::Error + StoreErrorKind + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. The email must be unique.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look up a user and their credential hash by email.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + 'a;

  /// All users with the doctor role — the public directory.
  fn list_doctors(
    &self,
  ) -> impl Future<Output = Result<Vec<DoctorEntry>, Self::Error>> + Send + '_;

  /// Distinct patients with a confirmed appointment assigned to `doctor_id`.
  fn list_confirmed_patients(
    &self,
    doctor_id: Uuid,
  ) -> impl Future<Output = Result<Vec<PatientSummary>, Self::Error>> + Send + '_;

  // ── Appointments ──────────────────────────────────────────────────────

  /// Insert an appointment; the stored status starts as `pending`.
  fn insert_appointment(
    &self,
    input: NewAppointment,
  ) -> impl Future<Output = Result<Appointment, Self::Error>> + Send + '_;

  /// List appointments visible under `filter`, joined with participant
  /// names.
  fn list_appointments(
    &self,
    filter: RecordFilter,
  ) -> impl Future<Output = Result<Vec<AppointmentView>, Self::Error>> + Send + '_;

  /// Fetch one appointment by id.
  fn get_appointment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Appointment>, Self::Error>> + Send + '_;

  /// Apply a keyed status update. The row is written only when `id` and the
  /// update's `doctor_id` match AND the current status is admissible under
  /// `policy`; the prior-status check and the write must not be separable
  /// by a concurrent update.
  fn update_appointment_status(
    &self,
    id: Uuid,
    update: StatusUpdate,
    policy: TransitionPolicy,
  ) -> impl Future<Output = Result<StatusWrite, Self::Error>> + Send + '_;

  /// Delete an appointment by id. Returns `false` if no row existed.
  /// Authorization happens before this call, over the fetched record.
  fn delete_appointment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Prescriptions ─────────────────────────────────────────────────────

  /// Insert a prescription. The input's `doctor_id` is already bound by the
  /// authorizer.
  fn insert_prescription(
    &self,
    input: NewPrescription,
  ) -> impl Future<Output = Result<Prescription, Self::Error>> + Send + '_;

  /// List prescriptions visible under `filter`, joined with participant
  /// names.
  fn list_prescriptions(
    &self,
    filter: RecordFilter,
  ) -> impl Future<Output = Result<Vec<PrescriptionView>, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Persist a session row keyed by token digest.
  fn create_session(
    &self,
    input: NewSession,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Look up a session by token digest. Expiry is the caller's check.
  fn find_session<'a>(
    &'a self,
    token_digest: &'a str,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;
}
