//! Prescription records.
//!
//! Prescriptions are write-once: created by a doctor, never updated or
//! deleted. `doctor_id` is always the creating principal's id — the
//! authorizer binds it and ignores anything the client supplies.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored prescription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
  pub id:           Uuid,
  pub patient_id:   Uuid,
  pub doctor_id:    Uuid,
  pub medications:  String,
  pub instructions: String,
}

/// Creation shape with the doctor binding already applied. Only
/// [`authz::create_prescription`](crate::authz::create_prescription)
/// constructs one, so a trusted `doctor_id` is guaranteed by construction.
#[derive(Debug, Clone)]
pub struct NewPrescription {
  pub patient_id:   Uuid,
  pub doctor_id:    Uuid,
  pub medications:  String,
  pub instructions: String,
}

/// A prescription joined with its participants' names — the listing read
/// model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionView {
  #[serde(flatten)]
  pub prescription: Prescription,
  pub patient_name: Option<String>,
  pub doctor_name:  Option<String>,
}
