//! Appointment records and the closed status enum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The closed set of appointment statuses. Stored as text, but validated
/// against this enum on every write — an unknown value never reaches a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
  Pending,
  Confirmed,
  Cancelled,
  Completed,
}

impl AppointmentStatus {
  /// Every member of the closed set.
  pub const ALL: [AppointmentStatus; 4] = [
    AppointmentStatus::Pending,
    AppointmentStatus::Confirmed,
    AppointmentStatus::Cancelled,
    AppointmentStatus::Completed,
  ];

  pub fn parse(s: &str) -> Result<AppointmentStatus> {
    match s {
      "pending" => Ok(AppointmentStatus::Pending),
      "confirmed" => Ok(AppointmentStatus::Confirmed),
      "cancelled" => Ok(AppointmentStatus::Cancelled),
      "completed" => Ok(AppointmentStatus::Completed),
      other => {
        Err(Error::Validation(format!("unknown appointment status: {other:?}")))
      }
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      AppointmentStatus::Pending => "pending",
      AppointmentStatus::Confirmed => "confirmed",
      AppointmentStatus::Cancelled => "cancelled",
      AppointmentStatus::Completed => "completed",
    }
  }
}

/// A stored appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
  pub id:          Uuid,
  pub date:        DateTime<Utc>,
  pub description: String,
  pub patient_id:  Uuid,
  pub doctor_id:   Uuid,
  pub status:      AppointmentStatus,
}

/// Creation shape. New appointments always start as `pending`; the status
/// is assigned by storage, not the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
  pub date:        DateTime<Utc>,
  pub description: String,
  pub patient_id:  Uuid,
  pub doctor_id:   Uuid,
}

/// An appointment joined with its participants' names — the listing read
/// model. The joins are LEFT JOINs in storage, hence the options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
  #[serde(flatten)]
  pub appointment:  Appointment,
  pub patient_name: Option<String>,
  pub doctor_name:  Option<String>,
  /// The doctor's department, where one is recorded.
  pub department:   Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_round_trips() {
    for status in [
      AppointmentStatus::Pending,
      AppointmentStatus::Confirmed,
      AppointmentStatus::Cancelled,
      AppointmentStatus::Completed,
    ] {
      assert_eq!(AppointmentStatus::parse(status.as_str()).unwrap(), status);
    }
  }

  #[test]
  fn unknown_status_is_a_validation_error() {
    assert!(matches!(
      AppointmentStatus::parse("rescheduled"),
      Err(Error::Validation(_))
    ));
    assert!(matches!(
      AppointmentStatus::parse("CONFIRMED"),
      Err(Error::Validation(_))
    ));
  }
}
