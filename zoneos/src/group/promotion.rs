use log::{debug, info, warn};

use super::GroupCoordinator;
use crate::device::{DeviceDirectory, DeviceHandle};
use crate::error::{GroupError, SonosError};

impl<D: DeviceDirectory> GroupCoordinator<D> {
  /// Remove `name` from the group
  ///
  /// Removing the coordinator promotes the smallest remaining member name.
  /// The departing coordinator leaves the store before any device call and is
  /// not restored if a later call fails.
  pub fn remove_member(&mut self, name: &str) -> Result<(), GroupError> {
    let device = self.resolve(name)?;

    if !self.membership.contains(name) {
      warn!("Speaker {} is not in the group", name);
      return Ok(());
    }

    if !self.membership.is_coordinator(name) {
      debug!("Unjoining {}", name);
      device
        .unjoin()
        .map_err(|e| GroupError::operation(format!("failed to remove {} from group", name), e))?;

      self.membership.remove(name);
      info!("Removed {} from group", name);
      return Ok(());
    }

    self.remove_coordinator(device)
  }

  fn remove_coordinator(&mut self, departing: DeviceHandle) -> Result<(), GroupError> {
    let name = departing.name().to_string();
    let context = || format!("failed to remove coordinator {} from group", name);

    let Some(successor) = self.membership.successor().map(str::to_string) else {
      self.membership.clear();
      debug!("Unjoining {}", name);
      departing.unjoin().map_err(|e| GroupError::operation(context(), e))?;
      info!("Removed last speaker {}, group disbanded", name);
      return Ok(());
    };

    // The replacement must resolve before the store changes
    let replacement = self.directory.get(&successor).ok_or_else(|| {
      GroupError::operation(
        format!("new coordinator {} not found", successor),
        SonosError::DeviceNotFound(successor.clone()),
      )
    })?;

    let mut survivors = Vec::new();
    for member in self.membership.members() {
      if *member == name || *member == successor {
        continue;
      }
      match self.directory.get(member) {
        Some(device) => survivors.push(device),
        None => warn!("Speaker {} not found, leaving it out of the new group", member),
      }
    }

    self.membership.depart(replacement.clone());

    debug!("Promoting {}", successor);
    replacement.unjoin().map_err(|e| GroupError::operation(context(), e))?;

    for survivor in &survivors {
      debug!("Moving {} to {}", survivor.name(), successor);
      survivor.unjoin().map_err(|e| GroupError::operation(context(), e))?;
      survivor
        .join(replacement.as_ref())
        .map_err(|e| GroupError::operation(context(), e))?;
    }

    debug!("Releasing {}", name);
    departing.unjoin().map_err(|e| GroupError::operation(context(), e))?;

    info!("Removed coordinator {}, promoted {} to coordinator", name, successor);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::super::fixtures::*;
  use super::*;
  use crate::device::SpeakerDirectory;
  use crate::mock::{Call, CallLog, MockDeviceBuilder, Operation};

  #[test]
  fn test_remove_follower_unjoins_it() {
    let (mut group, log) = grouped(&["A", "B", "C"]);

    group.remove_member("B").unwrap();

    assert_eq!(log.calls(), vec![Call::unjoin("B")]);
    assert_eq!(group.members(), names(&["A", "C"]));
    assert_eq!(group.coordinator().unwrap().name(), "A");
  }

  #[test]
  fn test_remove_unknown_speaker() {
    let (mut group, log) = grouped(&["A"]);

    assert!(matches!(
      group.remove_member("Garage"),
      Err(GroupError::DeviceNotFound(_))
    ));
    assert!(log.is_empty());
  }

  #[test]
  fn test_remove_non_member_is_noop() {
    let log = CallLog::new();
    let mut group = coordinator(vec![MockDeviceBuilder::new("A"), MockDeviceBuilder::new("B")], &log);
    group.add_member("A").unwrap();

    group.remove_member("B").unwrap();

    assert!(log.is_empty());
    assert_eq!(group.members(), names(&["A"]));
  }

  #[test]
  fn test_remove_follower_failure_keeps_member() {
    let log = CallLog::new();
    let mut group = coordinator(
      vec![MockDeviceBuilder::new("A"), MockDeviceBuilder::new("B").failing(Operation::Unjoin)],
      &log,
    );
    group.set_members(["A", "B"]).unwrap();
    log.clear();

    let result = group.remove_member("B");

    assert!(matches!(result, Err(GroupError::Operation { .. })));
    assert_eq!(log.calls(), vec![Call::unjoin("B")]);
    assert_eq!(group.members(), names(&["A", "B"]));
  }

  #[test]
  fn test_remove_coordinator_promotes_smallest_survivor() {
    let (mut group, log) = grouped(&["A", "B", "C"]);

    group.remove_member("A").unwrap();

    assert_eq!(
      log.grouping_changes(),
      vec![
        Call::unjoin("B"),
        Call::unjoin("C"),
        Call::join("C", "B"),
        Call::unjoin("A"),
      ]
    );
    assert_eq!(group.coordinator().unwrap().name(), "B");
    assert_eq!(group.members(), names(&["B", "C"]));
  }

  #[test]
  fn test_promotion_ignores_discovery_order() {
    let (mut group, log) = grouped(&["Office", "Kitchen", "Attic", "Bedroom"]);

    group.remove_member("Office").unwrap();

    assert_eq!(group.coordinator().unwrap().name(), "Attic");
    assert_eq!(log.grouping_changes().first(), Some(&Call::unjoin("Attic")));
    assert_eq!(log.grouping_changes().last(), Some(&Call::unjoin("Office")));
    assert_eq!(log.count(Operation::Join), 2);
  }

  #[test]
  fn test_promotion_skips_survivor_missing_from_directory() {
    let log = CallLog::new();
    let a = MockDeviceBuilder::new("A")
      .paused()
      .snapshot_members(["A", "B", "Sub"])
      .build(&log);
    let b = MockDeviceBuilder::new("B").build(&log);
    let mut group = GroupCoordinator::new(SpeakerDirectory::from_iter(vec![a, b]));
    let devices = group.directory().all();
    group.initialize(&devices).unwrap();
    assert_eq!(group.members(), names(&["A", "B", "Sub"]));
    log.clear();

    group.remove_member("A").unwrap();

    assert_eq!(log.grouping_changes(), vec![Call::unjoin("B"), Call::unjoin("A")]);
    assert_eq!(group.coordinator().unwrap().name(), "B");
    assert_eq!(group.members(), names(&["B", "Sub"]));
  }

  #[test]
  fn test_promotion_with_missing_replacement_is_an_operation_error() {
    let log = CallLog::new();
    let a = MockDeviceBuilder::new("A")
      .paused()
      .snapshot_members(["A", "Amp", "B"])
      .build(&log);
    let b = MockDeviceBuilder::new("B").build(&log);
    let mut group = GroupCoordinator::new(SpeakerDirectory::from_iter(vec![a, b]));
    let devices = group.directory().all();
    group.initialize(&devices).unwrap();
    log.clear();

    let result = group.remove_member("A");

    assert!(matches!(result, Err(GroupError::Operation { .. })));
    assert!(log.is_empty());
    assert_eq!(group.coordinator().unwrap().name(), "A");
    assert_eq!(group.members(), names(&["A", "Amp", "B"]));
  }

  #[test]
  fn test_remove_sole_member_disbands_group() {
    let (mut group, log) = grouped(&["A"]);

    group.remove_member("A").unwrap();

    assert_eq!(log.calls(), vec![Call::unjoin("A")]);
    assert!(group.coordinator().is_none());
    assert!(group.members().is_empty());
  }

  #[test]
  fn test_failed_promotion_is_not_rolled_back() {
    let log = CallLog::new();
    let mut group = coordinator(
      vec![
        MockDeviceBuilder::new("A"),
        MockDeviceBuilder::new("B"),
        MockDeviceBuilder::new("C").failing(Operation::Unjoin),
      ],
      &log,
    );
    group.add_member("A").unwrap();
    group.add_member("B").unwrap();
    group.add_member("C").unwrap();
    log.clear();

    let result = group.remove_member("A");

    assert!(matches!(result, Err(GroupError::Operation { .. })));
    assert_eq!(log.grouping_changes(), vec![Call::unjoin("B"), Call::unjoin("C")]);
    assert_eq!(group.coordinator().unwrap().name(), "B");
    assert_eq!(group.members(), names(&["B", "C"]));
  }

  #[test]
  fn test_failed_disband_still_clears_group() {
    let log = CallLog::new();
    let mut group = coordinator(vec![MockDeviceBuilder::new("A").failing(Operation::Unjoin)], &log);
    group.add_member("A").unwrap();

    assert!(group.remove_member("A").is_err());
    assert!(group.coordinator().is_none());
    assert!(group.members().is_empty());
  }
}
