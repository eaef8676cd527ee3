use std::collections::BTreeSet;

use log::warn;

use crate::device::{DeviceHandle, GroupSnapshot};

/// In-memory record of the single logical group
///
/// Every mutator keeps `coordinator.is_none() == members.is_empty()` and keeps
/// the coordinator's name inside `members`.
#[derive(Debug, Clone, Default)]
pub struct Membership {
  coordinator: Option<DeviceHandle>,
  members: BTreeSet<String>,
}

impl Membership {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn coordinator(&self) -> Option<&DeviceHandle> {
    self.coordinator.as_ref()
  }

  pub fn members(&self) -> &BTreeSet<String> {
    &self.members
  }

  pub fn contains(&self, name: &str) -> bool {
    self.members.contains(name)
  }

  pub fn is_empty(&self) -> bool {
    self.members.is_empty()
  }

  pub fn is_coordinator(&self, name: &str) -> bool {
    self
      .coordinator
      .as_ref()
      .is_some_and(|coordinator| coordinator.name() == name)
  }

  /// Start a one-member group led by `device`
  pub fn found(&mut self, device: DeviceHandle) {
    self.members = BTreeSet::from([device.name().to_string()]);
    self.coordinator = Some(device);
  }

  /// Take over a group exactly as a device reported it
  pub fn adopt(&mut self, snapshot: GroupSnapshot) {
    let mut members = snapshot.members;
    let coordinator_name = snapshot.coordinator.name().to_string();
    if members.insert(coordinator_name.clone()) {
      warn!("Group snapshot omitted its coordinator {}", coordinator_name);
    }

    self.members = members;
    self.coordinator = Some(snapshot.coordinator);
  }

  /// Add a follower; ignored while there is no coordinator to follow
  pub fn insert(&mut self, name: &str) -> bool {
    if self.coordinator.is_none() {
      return false;
    }
    self.members.insert(name.to_string())
  }

  /// Remove a follower; the coordinator only leaves through `depart` or `clear`
  pub fn remove(&mut self, name: &str) -> bool {
    if self.is_coordinator(name) {
      return false;
    }
    self.members.remove(name)
  }

  /// Remove the coordinator and hand the group to `replacement`
  ///
  /// Returns false when `replacement` is not a remaining member.
  pub fn depart(&mut self, replacement: DeviceHandle) -> bool {
    let Some(departing) = self.coordinator.as_ref().map(|c| c.name().to_string()) else {
      return false;
    };
    if replacement.name() == departing || !self.members.contains(replacement.name()) {
      return false;
    }

    self.members.remove(&departing);
    self.coordinator = Some(replacement);
    true
  }

  /// Lexicographically smallest member other than the coordinator
  pub fn successor(&self) -> Option<&str> {
    self
      .members
      .iter()
      .map(String::as_str)
      .find(|name| !self.is_coordinator(name))
  }

  pub fn clear(&mut self) {
    self.coordinator = None;
    self.members.clear();
  }

  /// True when the two structural invariants hold
  pub fn is_consistent(&self) -> bool {
    match &self.coordinator {
      None => self.members.is_empty(),
      Some(coordinator) => self.members.contains(coordinator.name()),
    }
  }
}
