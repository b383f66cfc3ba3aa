//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Roles and statuses use the canonical
//! lowercase spellings from `ward-core`, so decoding reuses the core
//! parsers and inherits their fail-closed behavior.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;
use ward_core::{
  appointment::{Appointment, AppointmentStatus, AppointmentView},
  directory::{DoctorEntry, PatientSummary},
  prescription::{Prescription, PrescriptionView},
  principal::Role,
  store::Session,
  user::User,
};

use crate::Result;

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// Fixed precision and a fixed UTC offset keep the stored strings uniform in
// shape, so SQL string comparison on timestamp columns orders correctly.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, false)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| crate::Error::DateParse(e.to_string()))
}

pub fn decode_role(s: &str) -> Result<Role> { Ok(Role::parse(s)?) }

pub fn decode_status(s: &str) -> Result<AppointmentStatus> {
  Ok(AppointmentStatus::parse(s)?)
}

// ─── Raw rows ────────────────────────────────────────────────────────────────
//
// Query closures run on the connection thread and must not fail on domain
// decoding, so they hand back plain strings; the async side decodes them.

pub struct RawUser {
  pub user_id:    String,
  pub name:       String,
  pub email:      String,
  pub role:       String,
  pub department: Option<String>,
}

impl RawUser {
  pub fn decode(self) -> Result<User> {
    Ok(User {
      id:         decode_uuid(&self.user_id)?,
      name:       self.name,
      email:      self.email,
      role:       decode_role(&self.role)?,
      department: self.department,
    })
  }
}

pub struct RawAppointment {
  pub appointment_id: String,
  pub date:           String,
  pub description:    String,
  pub patient_id:     String,
  pub doctor_id:      String,
  pub status:         String,
}

impl RawAppointment {
  pub fn decode(self) -> Result<Appointment> {
    Ok(Appointment {
      id:          decode_uuid(&self.appointment_id)?,
      date:        decode_dt(&self.date)?,
      description: self.description,
      patient_id:  decode_uuid(&self.patient_id)?,
      doctor_id:   decode_uuid(&self.doctor_id)?,
      status:      decode_status(&self.status)?,
    })
  }
}

pub struct RawAppointmentView {
  pub appointment:  RawAppointment,
  pub patient_name: Option<String>,
  pub doctor_name:  Option<String>,
  pub department:   Option<String>,
}

impl RawAppointmentView {
  pub fn decode(self) -> Result<AppointmentView> {
    Ok(AppointmentView {
      appointment:  self.appointment.decode()?,
      patient_name: self.patient_name,
      doctor_name:  self.doctor_name,
      department:   self.department,
    })
  }
}

pub struct RawPrescription {
  pub prescription_id: String,
  pub patient_id:      String,
  pub doctor_id:       String,
  pub medications:     String,
  pub instructions:    String,
}

impl RawPrescription {
  pub fn decode(self) -> Result<Prescription> {
    Ok(Prescription {
      id:           decode_uuid(&self.prescription_id)?,
      patient_id:   decode_uuid(&self.patient_id)?,
      doctor_id:    decode_uuid(&self.doctor_id)?,
      medications:  self.medications,
      instructions: self.instructions,
    })
  }
}

pub struct RawPrescriptionView {
  pub prescription: RawPrescription,
  pub patient_name: Option<String>,
  pub doctor_name:  Option<String>,
}

impl RawPrescriptionView {
  pub fn decode(self) -> Result<PrescriptionView> {
    Ok(PrescriptionView {
      prescription: self.prescription.decode()?,
      patient_name: self.patient_name,
      doctor_name:  self.doctor_name,
    })
  }
}

pub struct RawDoctorEntry {
  pub user_id:    String,
  pub name:       String,
  pub email:      String,
  pub department: Option<String>,
}

impl RawDoctorEntry {
  pub fn decode(self) -> Result<DoctorEntry> {
    Ok(DoctorEntry {
      id:         decode_uuid(&self.user_id)?,
      name:       self.name,
      email:      self.email,
      department: self.department,
    })
  }
}

pub struct RawPatientSummary {
  pub user_id: String,
  pub name:    String,
  pub email:   String,
}

impl RawPatientSummary {
  pub fn decode(self) -> Result<PatientSummary> {
    Ok(PatientSummary {
      id:    decode_uuid(&self.user_id)?,
      name:  self.name,
      email: self.email,
    })
  }
}

pub struct RawSession {
  pub user_id:    String,
  pub role:       String,
  pub expires_at: String,
}

impl RawSession {
  pub fn decode(self) -> Result<Session> {
    Ok(Session {
      user_id:    decode_uuid(&self.user_id)?,
      role:       decode_role(&self.role)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}
