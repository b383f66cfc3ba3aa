//! [`SqliteStore`] — the SQLite implementation of [`ClinicStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use ward_core::{
  appointment::{Appointment, AppointmentStatus, AppointmentView, NewAppointment},
  authz::StatusUpdate,
  directory::{DoctorEntry, PatientSummary},
  prescription::{NewPrescription, Prescription, PrescriptionView},
  scope::RecordFilter,
  store::{ClinicStore, NewSession, Session, StatusWrite, UserRecord},
  user::{NewUser, User},
  workflow::TransitionPolicy,
};

use crate::{
  encode::{
    decode_status, encode_dt, encode_uuid, RawAppointment, RawAppointmentView,
    RawDoctorEntry, RawPatientSummary, RawPrescription, RawPrescriptionView,
    RawSession, RawUser,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Ward clinic store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// The WHERE clause and parameters for a [`RecordFilter`], against a table
/// aliased as `alias`.
fn filter_clause(alias: &str, filter: RecordFilter) -> (String, Vec<String>) {
  match filter {
    RecordFilter::All => (String::new(), Vec::new()),
    RecordFilter::ByDoctor(id) => {
      (format!(" WHERE {alias}.doctor_id = ?1"), vec![encode_uuid(id)])
    }
    RecordFilter::ByPatient(id) => {
      (format!(" WHERE {alias}.patient_id = ?1"), vec![encode_uuid(id)])
    }
  }
}

fn is_unique_violation(err: &tokio_rusqlite::Error) -> bool {
  matches!(
    err,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
      if e.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

// ─── ClinicStore impl ────────────────────────────────────────────────────────

impl ClinicStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      id:         Uuid::new_v4(),
      name:       input.name,
      email:      input.email,
      role:       input.role,
      department: input.department,
    };

    let id_str        = encode_uuid(user.id);
    let name          = user.name.clone();
    let email         = user.email.clone();
    let password_hash = input.password_hash;
    let role          = user.role.as_str();
    let department    = user.department.clone();

    let result = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, name, email, password_hash, role, department)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, email, password_hash, role, department],
        )?;
        Ok(())
      })
      .await;

    match result {
      Ok(()) => Ok(user),
      Err(e) if is_unique_violation(&e) => Err(Error::EmailTaken(user.email)),
      Err(e) => Err(e.into()),
    }
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
    let email = email.to_owned();
    let raw: Option<(RawUser, String)> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT user_id, name, email, role, department, password_hash
             FROM users WHERE email = ?1",
            rusqlite::params![email],
            |r| {
              Ok((
                RawUser {
                  user_id:    r.get(0)?,
                  name:       r.get(1)?,
                  email:      r.get(2)?,
                  role:       r.get(3)?,
                  department: r.get(4)?,
                },
                r.get::<_, String>(5)?,
              ))
            },
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    raw
      .map(|(user, password_hash)| {
        Ok(UserRecord { user: user.decode()?, password_hash })
      })
      .transpose()
  }

  async fn list_doctors(&self) -> Result<Vec<DoctorEntry>> {
    let raw: Vec<RawDoctorEntry> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, name, email, department
           FROM users WHERE role = 'doctor' ORDER BY name",
        )?;
        let rows = stmt.query_map([], |r| {
          Ok(RawDoctorEntry {
            user_id:    r.get(0)?,
            name:       r.get(1)?,
            email:      r.get(2)?,
            department: r.get(3)?,
          })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
      })
      .await?;

    raw.into_iter().map(RawDoctorEntry::decode).collect()
  }

  async fn list_confirmed_patients(
    &self,
    doctor_id: Uuid,
  ) -> Result<Vec<PatientSummary>> {
    let doctor_str = encode_uuid(doctor_id);
    let raw: Vec<RawPatientSummary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT u.user_id, u.name, u.email
           FROM appointments a
           JOIN users u ON a.patient_id = u.user_id
           WHERE a.doctor_id = ?1 AND a.status = 'confirmed'",
        )?;
        let rows = stmt.query_map(rusqlite::params![doctor_str], |r| {
          Ok(RawPatientSummary {
            user_id: r.get(0)?,
            name:    r.get(1)?,
            email:   r.get(2)?,
          })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
      })
      .await?;

    raw.into_iter().map(RawPatientSummary::decode).collect()
  }

  // ── Appointments ──────────────────────────────────────────────────────

  async fn insert_appointment(
    &self,
    input: NewAppointment,
  ) -> Result<Appointment> {
    let appointment = Appointment {
      id:          Uuid::new_v4(),
      date:        input.date,
      description: input.description,
      patient_id:  input.patient_id,
      doctor_id:   input.doctor_id,
      status:      AppointmentStatus::Pending,
    };

    let id_str      = encode_uuid(appointment.id);
    let date_str    = encode_dt(appointment.date);
    let description = appointment.description.clone();
    let patient_str = encode_uuid(appointment.patient_id);
    let doctor_str  = encode_uuid(appointment.doctor_id);
    let status_str  = appointment.status.as_str();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO appointments
             (appointment_id, date, description, patient_id, doctor_id, status)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str, date_str, description, patient_str, doctor_str, status_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(appointment)
  }

  async fn list_appointments(
    &self,
    filter: RecordFilter,
  ) -> Result<Vec<AppointmentView>> {
    let (clause, params) = filter_clause("a", filter);
    let sql = format!(
      "SELECT a.appointment_id, a.date, a.description, a.patient_id,
              a.doctor_id, a.status, p.name, d.name, d.department
       FROM appointments a
       LEFT JOIN users p ON a.patient_id = p.user_id
       LEFT JOIN users d ON a.doctor_id = d.user_id{clause}
       ORDER BY a.date",
    );

    let raw: Vec<RawAppointmentView> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params), |r| {
          Ok(RawAppointmentView {
            appointment:  RawAppointment {
              appointment_id: r.get(0)?,
              date:           r.get(1)?,
              description:    r.get(2)?,
              patient_id:     r.get(3)?,
              doctor_id:      r.get(4)?,
              status:         r.get(5)?,
            },
            patient_name: r.get(6)?,
            doctor_name:  r.get(7)?,
            department:   r.get(8)?,
          })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
      })
      .await?;

    raw.into_iter().map(RawAppointmentView::decode).collect()
  }

  async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawAppointment> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT appointment_id, date, description, patient_id, doctor_id, status
             FROM appointments WHERE appointment_id = ?1",
            rusqlite::params![id_str],
            map_appointment_row,
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    raw.map(RawAppointment::decode).transpose()
  }

  async fn update_appointment_status(
    &self,
    id: Uuid,
    update: StatusUpdate,
    policy: TransitionPolicy,
  ) -> Result<StatusWrite> {
    let id_str     = encode_uuid(id);
    let doctor_str = encode_uuid(update.doctor_id);
    let status_str = update.status.as_str();

    // The policy is folded into the WHERE clause as the set of admissible
    // prior statuses, so the prior-status check and the write are one
    // statement. The list comes from a closed enum, never from the caller.
    let in_list = policy
      .admissible_from(update.status)
      .iter()
      .map(|s| format!("'{}'", s.as_str()))
      .collect::<Vec<_>>()
      .join(", ");

    // Keyed write: no row is touched unless both id and doctor_id match,
    // so a foreign doctor's update reads as "no such appointment". The
    // whole sequence runs in one connection call and cannot interleave
    // with another write.
    let raw: RawStatusWrite = self
      .conn
      .call(move |conn| {
        let changed = if in_list.is_empty() {
          0
        } else {
          conn.execute(
            &format!(
              "UPDATE appointments SET status = ?1
               WHERE appointment_id = ?2 AND doctor_id = ?3
                 AND status IN ({in_list})",
            ),
            rusqlite::params![status_str, id_str, doctor_str],
          )?
        };
        if changed > 0 {
          let row = conn.query_row(
            "SELECT appointment_id, date, description, patient_id, doctor_id, status
             FROM appointments WHERE appointment_id = ?1",
            rusqlite::params![id_str],
            map_appointment_row,
          )?;
          return Ok(RawStatusWrite::Updated(row));
        }
        let current: Option<String> = conn
          .query_row(
            "SELECT status FROM appointments
             WHERE appointment_id = ?1 AND doctor_id = ?2",
            rusqlite::params![id_str, doctor_str],
            |r| r.get(0),
          )
          .optional()?;
        Ok(match current {
          Some(from) => RawStatusWrite::Rejected { from },
          None => RawStatusWrite::Missing,
        })
      })
      .await?;

    Ok(match raw {
      RawStatusWrite::Updated(row) => StatusWrite::Updated(row.decode()?),
      RawStatusWrite::Missing => StatusWrite::Missing,
      RawStatusWrite::Rejected { from } => {
        StatusWrite::Rejected { from: decode_status(&from)? }
      }
    })
  }

  async fn delete_appointment(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM appointments WHERE appointment_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(n > 0)
      })
      .await?;
    Ok(deleted)
  }

  // ── Prescriptions ─────────────────────────────────────────────────────

  async fn insert_prescription(
    &self,
    input: NewPrescription,
  ) -> Result<Prescription> {
    let prescription = Prescription {
      id:           Uuid::new_v4(),
      patient_id:   input.patient_id,
      doctor_id:    input.doctor_id,
      medications:  input.medications,
      instructions: input.instructions,
    };

    let id_str       = encode_uuid(prescription.id);
    let patient_str  = encode_uuid(prescription.patient_id);
    let doctor_str   = encode_uuid(prescription.doctor_id);
    let medications  = prescription.medications.clone();
    let instructions = prescription.instructions.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO prescriptions
             (prescription_id, patient_id, doctor_id, medications, instructions)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            id_str, patient_str, doctor_str, medications, instructions
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(prescription)
  }

  async fn list_prescriptions(
    &self,
    filter: RecordFilter,
  ) -> Result<Vec<PrescriptionView>> {
    let (clause, params) = filter_clause("rx", filter);
    let sql = format!(
      "SELECT rx.prescription_id, rx.patient_id, rx.doctor_id,
              rx.medications, rx.instructions, p.name, d.name
       FROM prescriptions rx
       LEFT JOIN users p ON rx.patient_id = p.user_id
       LEFT JOIN users d ON rx.doctor_id = d.user_id{clause}",
    );

    let raw: Vec<RawPrescriptionView> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params), |r| {
          Ok(RawPrescriptionView {
            prescription: RawPrescription {
              prescription_id: r.get(0)?,
              patient_id:      r.get(1)?,
              doctor_id:       r.get(2)?,
              medications:     r.get(3)?,
              instructions:    r.get(4)?,
            },
            patient_name: r.get(5)?,
            doctor_name:  r.get(6)?,
          })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
      })
      .await?;

    raw.into_iter().map(RawPrescriptionView::decode).collect()
  }

  // ── Sessions ──────────────────────────────────────────────────────────

  async fn create_session(&self, input: NewSession) -> Result<()> {
    let token_digest = input.token_digest;
    let user_str     = encode_uuid(input.user_id);
    let role         = input.role.as_str();
    let expires_str  = encode_dt(input.expires_at);
    let now_str      = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        // Opportunistic purge: expired sessions are dead rows, and login is
        // the natural moment to sweep them.
        conn.execute(
          "DELETE FROM sessions WHERE expires_at <= ?1",
          rusqlite::params![now_str],
        )?;
        conn.execute(
          "INSERT INTO sessions (token_digest, user_id, role, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![token_digest, user_str, role, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_session(&self, token_digest: &str) -> Result<Option<Session>> {
    let digest = token_digest.to_owned();
    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT user_id, role, expires_at FROM sessions WHERE token_digest = ?1",
            rusqlite::params![digest],
            |r| {
              Ok(RawSession {
                user_id:    r.get(0)?,
                role:       r.get(1)?,
                expires_at: r.get(2)?,
              })
            },
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    raw.map(RawSession::decode).transpose()
  }
}

/// Undecoded outcome of the keyed status write, as seen on the connection
/// thread. The async side decodes the status string.
enum RawStatusWrite {
  Updated(RawAppointment),
  Missing,
  Rejected { from: String },
}

fn map_appointment_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawAppointment> {
  Ok(RawAppointment {
    appointment_id: r.get(0)?,
    date:           r.get(1)?,
    description:    r.get(2)?,
    patient_id:     r.get(3)?,
    doctor_id:      r.get(4)?,
    status:         r.get(5)?,
  })
}
