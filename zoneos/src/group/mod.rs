//! Group coordination: one logical group of speakers, one coordinator.
//!
//! [`GroupCoordinator`] owns the [`Membership`] store and is the only thing that
//! mutates it. Each operation issues its device calls sequentially, in a fixed
//! order, and updates the store as those calls succeed:
//!
//! - [`GroupCoordinator::initialize`] adopts a group that is already playing,
//!   or builds a fresh one from every known speaker.
//! - [`GroupCoordinator::set_members`] applies the difference between the
//!   current and desired members, adds before removes.
//! - [`GroupCoordinator::remove_member`] promotes a replacement when the
//!   coordinator itself leaves, re-homing survivors before releasing it.

mod membership;
mod promotion;
mod reconcile;
mod startup;

pub use membership::Membership;

use std::collections::BTreeSet;
use std::fmt;

use crate::device::{DeviceDirectory, DeviceHandle};
use crate::error::GroupError;

/// A member whose add or remove failed during reconciliation
#[derive(Debug, Clone)]
pub struct MemberFailure {
  pub name: String,
  pub error: GroupError,
}

impl fmt::Display for MemberFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.name, self.error)
  }
}

/// Outcome of [`GroupCoordinator::set_members`]
#[derive(Debug, Clone)]
pub enum Reconciliation {
  /// Every add and remove succeeded (or there was nothing to do)
  Applied,
  /// Some changes went through and some did not
  PartiallyApplied {
    /// Names added or removed successfully, in the order they were applied
    applied: Vec<String>,
    /// Names whose change failed, with the error for each
    failures: Vec<MemberFailure>,
  },
  /// Every attempted change failed
  Failed {
    /// Names whose change failed, with the error for each
    failures: Vec<MemberFailure>,
  },
}

impl Reconciliation {
  fn from_parts(applied: Vec<String>, failures: Vec<MemberFailure>) -> Self {
    match (applied.is_empty(), failures.is_empty()) {
      (_, true) => Reconciliation::Applied,
      (true, false) => Reconciliation::Failed { failures },
      (false, false) => Reconciliation::PartiallyApplied { applied, failures },
    }
  }

  pub fn is_applied(&self) -> bool {
    matches!(self, Reconciliation::Applied)
  }

  pub fn failures(&self) -> &[MemberFailure] {
    match self {
      Reconciliation::Applied => &[],
      Reconciliation::PartiallyApplied { failures, .. } | Reconciliation::Failed { failures } => {
        failures
      }
    }
  }

  /// Collapse into an error naming every member that failed
  pub fn into_result(self) -> Result<(), GroupError> {
    match self {
      Reconciliation::Applied => Ok(()),
      Reconciliation::PartiallyApplied { failures, .. } | Reconciliation::Failed { failures } => {
        Err(GroupError::Reconciliation {
          failed: failures.into_iter().map(|failure| failure.name).collect(),
        })
      }
    }
  }
}

/// Facade over the membership store and the device directory
pub struct GroupCoordinator<D: DeviceDirectory> {
  directory: D,
  membership: Membership,
}

impl<D: DeviceDirectory> GroupCoordinator<D> {
  pub fn new(directory: D) -> Self {
    Self {
      directory,
      membership: Membership::new(),
    }
  }

  pub fn directory(&self) -> &D {
    &self.directory
  }

  /// Current coordinator; `None` means there is no group
  pub fn coordinator(&self) -> Option<DeviceHandle> {
    self.membership.coordinator().cloned()
  }

  /// Copy of the current member names
  pub fn members(&self) -> BTreeSet<String> {
    self.membership.members().clone()
  }

  pub fn has_group(&self) -> bool {
    !self.membership.is_empty()
  }

  fn resolve(&self, name: &str) -> Result<DeviceHandle, GroupError> {
    self
      .directory
      .get(name)
      .ok_or_else(|| GroupError::DeviceNotFound(name.to_string()))
  }
}

#[cfg(test)]
pub(crate) mod fixtures {
  use super::*;
  use crate::device::SpeakerDirectory;
  use crate::mock::{CallLog, MockDeviceBuilder};

  pub fn coordinator(
    builders: Vec<MockDeviceBuilder>,
    log: &CallLog,
  ) -> GroupCoordinator<SpeakerDirectory> {
    GroupCoordinator::new(builders.into_iter().map(|builder| builder.build(log)).collect())
  }

  /// Stopped devices force-grouped under the first name, with the log cleared
  pub fn grouped(names: &[&str]) -> (GroupCoordinator<SpeakerDirectory>, CallLog) {
    let log = CallLog::new();
    let mut group = coordinator(names.iter().map(|name| MockDeviceBuilder::new(*name)).collect(), &log);
    let devices = group.directory().all();
    group.initialize(&devices).unwrap();
    log.clear();
    (group, log)
  }

  pub fn names(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
  }
}
