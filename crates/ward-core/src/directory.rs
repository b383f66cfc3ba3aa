//! Directory view builder — read-only relationship views over users.
//!
//! These are computed read models, never stored. The storage adapter
//! supplies the joined rows; this module owns the output shapes and the
//! deduplication rule.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A doctor as listed in the public directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorEntry {
  pub id:         Uuid,
  pub name:       String,
  pub email:      String,
  pub department: Option<String>,
}

/// A patient as seen on a doctor's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
  pub id:    Uuid,
  pub name:  String,
  pub email: String,
}

/// Collapse repeated patients to one entry each, preserving first-seen
/// order. A patient with several confirmed appointments with the same
/// doctor appears once.
pub fn dedup_patients(rows: Vec<PatientSummary>) -> Vec<PatientSummary> {
  let mut seen = std::collections::HashSet::new();
  rows
    .into_iter()
    .filter(|row| seen.insert(row.id))
    .collect()
}
