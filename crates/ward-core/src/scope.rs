//! Access Scope Resolver — which rows a principal may read.
//!
//! `resolve_scope` is a pure function of `(principal, resource kind)`. It
//! returns a declarative filter a storage adapter can execute with equality
//! predicates and one foreign-key join; it never touches storage itself.
//! Identical inputs always yield identical filters.

use uuid::Uuid;

use crate::{Error, Principal, Result, Role};

/// The readable resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
  Appointments,
  Prescriptions,
  DoctorDirectory,
  /// The distinct patients who hold a confirmed appointment with the
  /// calling doctor.
  MyPatients,
}

/// Row visibility for appointment and prescription listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFilter {
  /// Every row, no constraint. Admin only.
  All,
  /// Rows where `doctor_id` equals the given id.
  ByDoctor(Uuid),
  /// Rows where `patient_id` equals the given id.
  ByPatient(Uuid),
}

/// A resolved scope: the storage intent for one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeFilter {
  /// Appointment or prescription rows, restricted per role.
  Records(RecordFilter),
  /// All users with the doctor role. Open to any authenticated caller.
  Doctors,
  /// Distinct patient users joined through appointments where
  /// `doctor_id` equals the given id and status is confirmed.
  PatientsOf(Uuid),
}

/// Resolve the rows `principal` may see for `kind`.
///
/// `MyPatients` is doctor-only: any other role gets a [`Error::Forbidden`]
/// deny rather than an empty filter, so "not permitted to ask" stays
/// observably distinct from "no matching rows".
pub fn resolve_scope(
  principal: &Principal,
  kind: ResourceKind,
) -> Result<ScopeFilter> {
  match kind {
    ResourceKind::Appointments | ResourceKind::Prescriptions => {
      Ok(ScopeFilter::Records(record_filter(principal)))
    }
    ResourceKind::DoctorDirectory => Ok(ScopeFilter::Doctors),
    ResourceKind::MyPatients => match principal.role {
      Role::Doctor => Ok(ScopeFilter::PatientsOf(principal.id)),
      _ => Err(Error::Forbidden),
    },
  }
}

/// The per-role row restriction shared by appointments and prescriptions.
fn record_filter(principal: &Principal) -> RecordFilter {
  match principal.role {
    Role::Admin => RecordFilter::All,
    Role::Doctor => RecordFilter::ByDoctor(principal.id),
    Role::Patient => RecordFilter::ByPatient(principal.id),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn principal(role: Role) -> Principal {
    Principal::new(Uuid::new_v4(), role)
  }

  #[test]
  fn patient_sees_only_own_rows() {
    let p = principal(Role::Patient);
    for kind in [ResourceKind::Appointments, ResourceKind::Prescriptions] {
      assert_eq!(
        resolve_scope(&p, kind).unwrap(),
        ScopeFilter::Records(RecordFilter::ByPatient(p.id)),
      );
    }
  }

  #[test]
  fn doctor_sees_only_assigned_rows() {
    let p = principal(Role::Doctor);
    assert_eq!(
      resolve_scope(&p, ResourceKind::Appointments).unwrap(),
      ScopeFilter::Records(RecordFilter::ByDoctor(p.id)),
    );
  }

  #[test]
  fn admin_sees_every_row() {
    let p = principal(Role::Admin);
    for kind in [ResourceKind::Appointments, ResourceKind::Prescriptions] {
      assert_eq!(
        resolve_scope(&p, kind).unwrap(),
        ScopeFilter::Records(RecordFilter::All),
      );
    }
  }

  #[test]
  fn doctor_directory_is_open_to_all_roles() {
    for role in [Role::Patient, Role::Doctor, Role::Admin] {
      let p = principal(role);
      assert_eq!(
        resolve_scope(&p, ResourceKind::DoctorDirectory).unwrap(),
        ScopeFilter::Doctors,
      );
    }
  }

  #[test]
  fn my_patients_is_doctor_only() {
    let doc = principal(Role::Doctor);
    assert_eq!(
      resolve_scope(&doc, ResourceKind::MyPatients).unwrap(),
      ScopeFilter::PatientsOf(doc.id),
    );

    // A deny, not an empty filter.
    for role in [Role::Patient, Role::Admin] {
      let p = principal(role);
      assert_eq!(
        resolve_scope(&p, ResourceKind::MyPatients),
        Err(Error::Forbidden),
      );
    }
  }

  #[test]
  fn resolution_is_deterministic() {
    let p = principal(Role::Doctor);
    let a = resolve_scope(&p, ResourceKind::Appointments).unwrap();
    let b = resolve_scope(&p, ResourceKind::Appointments).unwrap();
    assert_eq!(a, b);
  }
}
