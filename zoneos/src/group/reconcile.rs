use std::collections::BTreeSet;

use log::{debug, info, warn};

use super::{GroupCoordinator, MemberFailure, Reconciliation};
use crate::device::DeviceDirectory;
use crate::error::GroupError;

impl<D: DeviceDirectory> GroupCoordinator<D> {
  /// Converge the group on `desired`, adding before removing
  ///
  /// A failed add or remove does not stop the others; failures are collected
  /// in the returned [`Reconciliation`]. Nothing is rolled back.
  pub fn set_members<I, S>(&mut self, desired: I) -> Result<Reconciliation, GroupError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let desired: BTreeSet<String> = desired.into_iter().map(Into::into).collect();
    if desired.is_empty() {
      return Err(GroupError::EmptyMembership);
    }

    let current = self.members();
    let to_add: Vec<String> = desired.difference(&current).cloned().collect();
    let to_remove: Vec<String> = current.difference(&desired).cloned().collect();
    debug!("Reconciling group: add {:?}, remove {:?}", to_add, to_remove);

    let mut applied = Vec::new();
    let mut failures = Vec::new();

    for name in to_add {
      match self.add_member(&name) {
        Ok(()) => applied.push(name),
        Err(error) => {
          warn!("Could not add {}: {}", name, error);
          failures.push(MemberFailure { name, error });
        }
      }
    }

    for name in to_remove {
      match self.remove_member(&name) {
        Ok(()) => applied.push(name),
        Err(error) => {
          warn!("Could not remove {}: {}", name, error);
          failures.push(MemberFailure { name, error });
        }
      }
    }

    Ok(Reconciliation::from_parts(applied, failures))
  }

  /// Join `name` to the current coordinator, or make it coordinator of a new group
  ///
  /// A follower that is already a member is joined again, which regroups a
  /// speaker that was moved elsewhere behind our back.
  pub fn add_member(&mut self, name: &str) -> Result<(), GroupError> {
    let device = self.resolve(name)?;

    let Some(coordinator) = self.coordinator() else {
      self.membership.found(device);
      info!("Created new group with coordinator {}", name);
      return Ok(());
    };

    if self.membership.is_coordinator(name) {
      debug!("{} is already the coordinator", name);
      return Ok(());
    }

    debug!("Joining {} to {}", name, coordinator.name());
    device
      .join(coordinator.as_ref())
      .map_err(|e| GroupError::operation(format!("failed to add {} to group", name), e))?;

    self.membership.insert(name);
    info!("Added {} to group", name);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::super::fixtures::*;
  use super::*;
  use crate::mock::{Call, CallLog, MockDeviceBuilder, Operation};

  #[test]
  fn test_set_members_rejects_empty() {
    let (mut group, log) = grouped(&["A", "B"]);

    assert!(matches!(
      group.set_members(Vec::<String>::new()),
      Err(GroupError::EmptyMembership)
    ));
    assert!(log.is_empty());
    assert_eq!(group.members(), names(&["A", "B"]));
  }

  #[test]
  fn test_set_members_to_current_issues_no_calls() {
    let (mut group, log) = grouped(&["A", "B", "C"]);

    let outcome = group.set_members(group.members()).unwrap();

    assert!(outcome.is_applied());
    assert!(log.is_empty());
  }

  #[test]
  fn test_set_members_removes_only_the_difference() {
    let (mut group, log) = grouped(&["A", "B", "C"]);

    let outcome = group.set_members(["A", "B"]).unwrap();

    assert!(outcome.is_applied());
    assert_eq!(log.grouping_changes(), vec![Call::unjoin("C")]);
    assert_eq!(group.members(), names(&["A", "B"]));
    assert_eq!(group.coordinator().unwrap().name(), "A");
  }

  #[test]
  fn test_set_members_adds_before_removing() {
    let log = CallLog::new();
    let mut group = coordinator(
      vec![MockDeviceBuilder::new("A"), MockDeviceBuilder::new("B"), MockDeviceBuilder::new("C")],
      &log,
    );
    group.set_members(["A", "B"]).unwrap();
    log.clear();

    let outcome = group.set_members(["A", "C"]).unwrap();

    assert!(outcome.is_applied());
    assert_eq!(log.grouping_changes(), vec![Call::join("C", "A"), Call::unjoin("B")]);
    assert_eq!(group.members(), names(&["A", "C"]));
  }

  #[test]
  fn test_set_members_on_empty_group_creates_one() {
    let log = CallLog::new();
    let mut group = coordinator(
      vec![MockDeviceBuilder::new("Kitchen"), MockDeviceBuilder::new("Office")],
      &log,
    );

    group.set_members(["Office", "Kitchen"]).unwrap();

    // Sorted order: Kitchen founds the group, Office joins it
    assert_eq!(log.grouping_changes(), vec![Call::join("Office", "Kitchen")]);
    assert_eq!(group.coordinator().unwrap().name(), "Kitchen");
    assert_eq!(group.members(), names(&["Kitchen", "Office"]));
  }

  #[test]
  fn test_set_members_continues_past_failures() {
    let log = CallLog::new();
    let mut group = coordinator(
      vec![
        MockDeviceBuilder::new("A"),
        MockDeviceBuilder::new("B").failing(Operation::Join),
        MockDeviceBuilder::new("C"),
      ],
      &log,
    );
    group.add_member("A").unwrap();

    let outcome = group.set_members(["A", "B", "C", "Garage"]).unwrap();

    match &outcome {
      Reconciliation::PartiallyApplied { applied, failures } => {
        assert_eq!(applied, &vec!["C".to_string()]);
        let failed: Vec<&str> = failures.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(failed, vec!["B", "Garage"]);
        assert!(matches!(failures[1].error, GroupError::DeviceNotFound(_)));
      }
      other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(group.members(), names(&["A", "C"]));

    match outcome.into_result() {
      Err(GroupError::Reconciliation { failed }) => assert_eq!(failed, vec!["B", "Garage"]),
      other => panic!("unexpected result: {:?}", other),
    }
  }

  #[test]
  fn test_set_members_all_failing_is_failed() {
    let log = CallLog::new();
    let mut group = coordinator(
      vec![MockDeviceBuilder::new("A"), MockDeviceBuilder::new("B").failing(Operation::Join)],
      &log,
    );
    group.add_member("A").unwrap();

    let outcome = group.set_members(["A", "B"]).unwrap();

    assert!(matches!(outcome, Reconciliation::Failed { .. }));
    assert_eq!(group.members(), names(&["A"]));
  }

  #[test]
  fn test_set_members_replaces_whole_group() {
    let (mut group, log) = grouped(&["A", "B", "C", "D"]);
    group.set_members(["A", "B"]).unwrap();
    log.clear();

    let outcome = group.set_members(["C", "D"]).unwrap();

    assert!(outcome.is_applied());
    assert_eq!(group.members(), names(&["C", "D"]));
    let coordinator = group.coordinator().unwrap();
    assert!(group.members().contains(coordinator.name()));
  }

  #[test]
  fn test_add_member_to_empty_group_makes_coordinator_without_calls() {
    let log = CallLog::new();
    let mut group = coordinator(vec![MockDeviceBuilder::new("Kitchen")], &log);

    group.add_member("Kitchen").unwrap();

    assert!(log.is_empty());
    assert_eq!(group.coordinator().unwrap().name(), "Kitchen");
    assert_eq!(group.members(), names(&["Kitchen"]));
  }

  #[test]
  fn test_add_member_joins_coordinator() {
    let log = CallLog::new();
    let mut group = coordinator(vec![MockDeviceBuilder::new("A"), MockDeviceBuilder::new("B")], &log);
    group.add_member("A").unwrap();

    group.add_member("B").unwrap();

    assert_eq!(log.calls(), vec![Call::join("B", "A")]);
    assert_eq!(group.members(), names(&["A", "B"]));
  }

  #[test]
  fn test_add_unknown_member() {
    let (mut group, log) = grouped(&["A"]);

    assert!(matches!(
      group.add_member("Garage"),
      Err(GroupError::DeviceNotFound(name)) if name == "Garage"
    ));
    assert!(log.is_empty());
  }

  #[test]
  fn test_add_member_failure_leaves_members_unchanged() {
    let log = CallLog::new();
    let mut group = coordinator(
      vec![MockDeviceBuilder::new("A"), MockDeviceBuilder::new("B").failing(Operation::Join)],
      &log,
    );
    group.add_member("A").unwrap();

    let result = group.add_member("B");

    assert!(matches!(result, Err(GroupError::Operation { .. })));
    assert_eq!(group.members(), names(&["A"]));
  }

  #[test]
  fn test_add_existing_follower_joins_again() {
    let (mut group, log) = grouped(&["A", "B"]);

    group.add_member("B").unwrap();

    assert_eq!(log.calls(), vec![Call::join("B", "A")]);
    assert_eq!(group.members(), names(&["A", "B"]));
  }

  #[test]
  fn test_add_coordinator_is_noop() {
    let (mut group, log) = grouped(&["A", "B"]);

    group.add_member("A").unwrap();

    assert!(log.is_empty());
    assert_eq!(group.coordinator().unwrap().name(), "A");
  }
}
