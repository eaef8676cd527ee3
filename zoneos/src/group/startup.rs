use log::{debug, info, warn};

use super::GroupCoordinator;
use crate::device::{DeviceDirectory, DeviceHandle};
use crate::error::GroupError;

impl<D: DeviceDirectory> GroupCoordinator<D> {
  /// Establish the group at startup
  ///
  /// If any device is already playing or paused, its group is adopted as-is
  /// and no device is regrouped. Otherwise the first device becomes the
  /// coordinator of a group containing every device.
  pub fn initialize(&mut self, devices: &[DeviceHandle]) -> Result<(), GroupError> {
    if devices.is_empty() {
      warn!("No speakers available for group initialization");
      return Ok(());
    }

    if let Some(reference) = Self::find_active(devices) {
      match reference.group_snapshot() {
        Ok(snapshot) => {
          info!(
            "Preserved existing group with coordinator {} and {} members",
            snapshot.coordinator.name(),
            snapshot.members.len()
          );
          self.membership.adopt(snapshot);
          return Ok(());
        }
        Err(e) => warn!("Failed to read group of {}: {}", reference.name(), e),
      }
    }

    self.force_group(devices)
  }

  /// First device whose transport is playing or paused; unreachable devices are skipped
  fn find_active(devices: &[DeviceHandle]) -> Option<&DeviceHandle> {
    devices.iter().find(|device| match device.transport_state() {
      Ok(state) if state.is_active() => {
        info!("Detected {} is already {:?}", device.name(), state);
        true
      }
      Ok(state) => {
        debug!("{} is {:?}", device.name(), state);
        false
      }
      Err(e) => {
        debug!("Skipping {}: {}", device.name(), e);
        false
      }
    })
  }

  /// Regroup every device under the first one
  fn force_group(&mut self, devices: &[DeviceHandle]) -> Result<(), GroupError> {
    let coordinator = &devices[0];
    self.membership.clear();

    for device in devices {
      debug!("Unjoining {}", device.name());
      device.unjoin().map_err(|e| {
        GroupError::operation(format!("failed to initialize group: unjoin {}", device.name()), e)
      })?;
    }
    self.membership.found(coordinator.clone());

    for device in &devices[1..] {
      debug!("Joining {} to {}", device.name(), coordinator.name());
      device.join(coordinator.as_ref()).map_err(|e| {
        GroupError::operation(
          format!("failed to initialize group: join {} to {}", device.name(), coordinator.name()),
          e,
        )
      })?;
      self.membership.insert(device.name());
    }

    info!(
      "Initialized group with coordinator {} and {} members",
      coordinator.name(),
      devices.len() - 1
    );
    Ok(())
  }
}
