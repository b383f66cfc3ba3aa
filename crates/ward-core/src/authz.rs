//! Mutation Authorizer — allow/deny decisions for writes, plus forced
//! field bindings.
//!
//! Every function here is pure. Where a decision needs the target record
//! (appointment deletion), the caller fetches it first and the decision is
//! made over the fetched row. Where ownership must stay indistinguishable
//! from non-existence (status updates), the decision produces a *keyed
//! write intent* instead: the storage adapter updates `WHERE id AND
//! doctor_id`, and a zero-row outcome surfaces as `NotFound` whether the
//! row is missing or belongs to another doctor.

use uuid::Uuid;

use crate::{
  appointment::{Appointment, AppointmentStatus, NewAppointment},
  prescription::NewPrescription,
  Error, Principal, Result, Role,
};

// ─── Create appointment ──────────────────────────────────────────────────────

/// Any authenticated principal may book an appointment; no fields are
/// forced. Cross-validating that the referenced users exist (and hold the
/// right roles) is delegated to storage foreign keys.
pub fn create_appointment(
  _principal: &Principal,
  draft: NewAppointment,
) -> Result<NewAppointment> {
  Ok(draft)
}

// ─── Delete appointment ──────────────────────────────────────────────────────

/// Deletion is participant-or-admin: the appointment's doctor, its patient,
/// or an admin. Anyone else is denied outright.
pub fn delete_appointment(
  principal: &Principal,
  target: &Appointment,
) -> Result<()> {
  if principal.is_admin()
    || principal.id == target.doctor_id
    || principal.id == target.patient_id
  {
    Ok(())
  } else {
    Err(Error::Forbidden)
  }
}

// ─── Update appointment status ───────────────────────────────────────────────

/// A keyed status write: update the appointment with `id` only if its
/// `doctor_id` matches. Zero rows affected means [`Error::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
  pub doctor_id: Uuid,
  pub status:    AppointmentStatus,
}

/// Only doctors may change appointment status, and only on their own
/// appointments.
///
/// The role check happens here, before any lookup: a non-doctor caller is
/// `Forbidden` — the caller is never the right kind of actor. Ownership is
/// folded into the returned intent's `doctor_id` key, so another doctor
/// probing a foreign appointment observes `NotFound`, never a signal that
/// the row exists.
pub fn update_appointment_status(
  principal: &Principal,
  status: AppointmentStatus,
) -> Result<StatusUpdate> {
  if principal.role != Role::Doctor {
    return Err(Error::Forbidden);
  }
  Ok(StatusUpdate { doctor_id: principal.id, status })
}

// ─── Create prescription ─────────────────────────────────────────────────────

/// Client-supplied prescription fields. `doctor_id` may arrive in the
/// payload but is never trusted — the authorizer binds its own.
#[derive(Debug, Clone)]
pub struct PrescriptionDraft {
  pub patient_id:   Uuid,
  pub medications:  String,
  pub instructions: String,
  /// Ignored. Present so the binding is applied to whatever the client
  /// sent, rather than relying on the transport layer to strip it.
  pub doctor_id:    Option<Uuid>,
}

/// Doctors only. On allow, `doctor_id` is bound to the principal's own id
/// regardless of the draft's contents.
pub fn create_prescription(
  principal: &Principal,
  draft: PrescriptionDraft,
) -> Result<NewPrescription> {
  if principal.role != Role::Doctor {
    return Err(Error::Forbidden);
  }
  Ok(NewPrescription {
    patient_id:   draft.patient_id,
    doctor_id:    principal.id,
    medications:  draft.medications,
    instructions: draft.instructions,
  })
}
