//! Appointment status workflow.
//!
//! Enum membership is always validated (`AppointmentStatus::parse`).
//! Transition *order* is a configuration choice: the forward-only graph is
//! enforced only when a deployment opts in, since the upstream data may
//! predate it.

use crate::{appointment::AppointmentStatus, Error, Result};

/// Policy governing which status transitions an owning doctor may make.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionPolicy {
  /// When `true`, only forward transitions are allowed:
  /// pending → confirmed → completed, with cancelled reachable from
  /// pending or confirmed. When `false` (the default), any status may be
  /// set from any other.
  pub enforce_order: bool,
}

impl TransitionPolicy {
  pub fn new(enforce_order: bool) -> Self { Self { enforce_order } }

  /// Validate a transition from `from` to `to` under this policy.
  pub fn check(
    &self,
    from: AppointmentStatus,
    to: AppointmentStatus,
  ) -> Result<()> {
    if !self.enforce_order || allowed(from, to) {
      Ok(())
    } else {
      Err(Self::rejection(from, to))
    }
  }

  /// The error `check` reports for a transition the policy forbids.
  pub fn rejection(from: AppointmentStatus, to: AppointmentStatus) -> Error {
    Error::Conflict(format!(
      "cannot move appointment from {} to {}",
      from.as_str(),
      to.as_str(),
    ))
  }

  /// The statuses from which `to` may be reached under this policy.
  ///
  /// Stores use this to build a status-keyed write, so the prior-status
  /// check and the update land in the same statement.
  pub fn admissible_from(&self, to: AppointmentStatus) -> Vec<AppointmentStatus> {
    AppointmentStatus::ALL
      .into_iter()
      .filter(|from| self.check(*from, to).is_ok())
      .collect()
  }
}

fn allowed(from: AppointmentStatus, to: AppointmentStatus) -> bool {
  use AppointmentStatus::*;
  matches!(
    (from, to),
    (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed)
      | (Confirmed, Cancelled)
  )
}
