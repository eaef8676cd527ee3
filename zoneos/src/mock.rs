//! Recording test doubles for [`Device`].
//!
//! Every call made on a [`MockDevice`] is appended to a shared [`CallLog`], so a
//! test can assert the exact order of physical operations across devices.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::device::{Device, DeviceHandle, GroupSnapshot};
use crate::error::{Result, SonosError};
use crate::models::{Favorite, SpeakerId, TrackInfo, TransportState};

/// Device operations a mock records and can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
  Join,
  Unjoin,
  TransportState,
  GroupSnapshot,
  Play,
  Pause,
  Stop,
  Next,
  Previous,
  PlayUri,
  Volume,
  SetVolume,
  TrackInfo,
  Favorites,
}

impl Operation {
  pub fn is_grouping_change(&self) -> bool {
    matches!(self, Operation::Join | Operation::Unjoin)
  }
}

/// One recorded device call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
  pub device: String,
  pub operation: Operation,
  pub argument: Option<String>,
}

impl Call {
  pub fn new(device: &str, operation: Operation) -> Self {
    Self {
      device: device.to_string(),
      operation,
      argument: None,
    }
  }

  pub fn with_argument(device: &str, operation: Operation, argument: impl Into<String>) -> Self {
    Self {
      argument: Some(argument.into()),
      ..Self::new(device, operation)
    }
  }

  pub fn join(device: &str, coordinator: &str) -> Self {
    Self::with_argument(device, Operation::Join, coordinator)
  }

  pub fn unjoin(device: &str) -> Self {
    Self::new(device, Operation::Unjoin)
  }
}

/// Shared, ordered record of calls across a set of mock devices
#[derive(Debug, Clone, Default)]
pub struct CallLog {
  calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
    self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn record(&self, call: Call) {
    self.lock().push(call);
  }

  pub fn calls(&self) -> Vec<Call> {
    self.lock().clone()
  }

  /// Only the join/unjoin calls, in order
  pub fn grouping_changes(&self) -> Vec<Call> {
    self
      .lock()
      .iter()
      .filter(|call| call.operation.is_grouping_change())
      .cloned()
      .collect()
  }

  pub fn count(&self, operation: Operation) -> usize {
    self.lock().iter().filter(|call| call.operation == operation).count()
  }

  pub fn clear(&self) {
    self.lock().clear();
  }

  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }
}

#[derive(Debug)]
struct MockState {
  transport_state: TransportState,
  volume: u8,
  failing: HashSet<Operation>,
}

/// In-memory device that succeeds unless told otherwise
pub struct MockDevice {
  me: Weak<MockDevice>,
  name: String,
  id: SpeakerId,
  snapshot_coordinator: Option<DeviceHandle>,
  snapshot_members: Option<BTreeSet<String>>,
  track: TrackInfo,
  favorites: Vec<Favorite>,
  state: Mutex<MockState>,
  log: CallLog,
}

impl std::fmt::Debug for MockDevice {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MockDevice")
      .field("name", &self.name)
      .field("id", &self.id)
      .finish()
  }
}

impl MockDevice {
  fn state(&self) -> MutexGuard<'_, MockState> {
    self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Record the call, then fail it if the operation was marked failing
  fn invoke(&self, operation: Operation, argument: Option<String>) -> Result<()> {
    self.log.record(Call {
      device: self.name.clone(),
      operation,
      argument,
    });

    if self.state().failing.contains(&operation) {
      return Err(SonosError::CommunicationError(format!(
        "{:?} failed on {}",
        operation, self.name
      )));
    }
    Ok(())
  }

  pub fn set_failing(&self, operation: Operation, failing: bool) {
    let mut state = self.state();
    if failing {
      state.failing.insert(operation);
    } else {
      state.failing.remove(&operation);
    }
  }

  pub fn set_transport_state(&self, transport_state: TransportState) {
    self.state().transport_state = transport_state;
  }

  pub fn current_volume(&self) -> u8 {
    self.state().volume
  }

  fn handle(&self) -> Result<DeviceHandle> {
    let me: Arc<MockDevice> = self
      .me
      .upgrade()
      .ok_or_else(|| SonosError::InvalidState(format!("{} was dropped", self.name)))?;
    Ok(me)
  }
}

impl Device for MockDevice {
  fn name(&self) -> &str {
    &self.name
  }

  fn id(&self) -> &SpeakerId {
    &self.id
  }

  fn join(&self, coordinator: &dyn Device) -> Result<()> {
    self.invoke(Operation::Join, Some(coordinator.name().to_string()))
  }

  fn unjoin(&self) -> Result<()> {
    self.invoke(Operation::Unjoin, None)
  }

  fn transport_state(&self) -> Result<TransportState> {
    self.invoke(Operation::TransportState, None)?;
    Ok(self.state().transport_state)
  }

  fn group_snapshot(&self) -> Result<GroupSnapshot> {
    self.invoke(Operation::GroupSnapshot, None)?;

    let coordinator = match &self.snapshot_coordinator {
      Some(coordinator) => coordinator.clone(),
      None => self.handle()?,
    };
    let members = self
      .snapshot_members
      .clone()
      .unwrap_or_else(|| BTreeSet::from([self.name.clone()]));

    Ok(GroupSnapshot {
      coordinator,
      members,
    })
  }

  fn play(&self) -> Result<()> {
    self.invoke(Operation::Play, None)
  }

  fn pause(&self) -> Result<()> {
    self.invoke(Operation::Pause, None)
  }

  fn stop(&self) -> Result<()> {
    self.invoke(Operation::Stop, None)
  }

  fn next(&self) -> Result<()> {
    self.invoke(Operation::Next, None)
  }

  fn previous(&self) -> Result<()> {
    self.invoke(Operation::Previous, None)
  }

  fn play_uri(&self, uri: &str, _metadata: &str) -> Result<()> {
    self.invoke(Operation::PlayUri, Some(uri.to_string()))
  }

  fn volume(&self) -> Result<u8> {
    self.invoke(Operation::Volume, None)?;
    Ok(self.state().volume)
  }

  fn set_volume(&self, volume: u8) -> Result<()> {
    self.invoke(Operation::SetVolume, Some(volume.to_string()))?;
    self.state().volume = volume;
    Ok(())
  }

  fn track_info(&self) -> Result<TrackInfo> {
    self.invoke(Operation::TrackInfo, None)?;
    Ok(self.track.clone())
  }

  fn favorites(&self) -> Result<Vec<Favorite>> {
    self.invoke(Operation::Favorites, None)?;
    Ok(self.favorites.clone())
  }
}

/// Builder for [`MockDevice`]; defaults to a stopped standalone speaker
pub struct MockDeviceBuilder {
  name: String,
  id: Option<String>,
  transport_state: TransportState,
  snapshot_coordinator: Option<DeviceHandle>,
  snapshot_members: Option<BTreeSet<String>>,
  volume: u8,
  track: TrackInfo,
  favorites: Vec<Favorite>,
  failing: HashSet<Operation>,
}

impl MockDeviceBuilder {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      id: None,
      transport_state: TransportState::Stopped,
      snapshot_coordinator: None,
      snapshot_members: None,
      volume: 50,
      track: TrackInfo::default(),
      favorites: Vec::new(),
      failing: HashSet::new(),
    }
  }

  pub fn id(mut self, id: impl Into<String>) -> Self {
    self.id = Some(id.into());
    self
  }

  pub fn transport_state(mut self, transport_state: TransportState) -> Self {
    self.transport_state = transport_state;
    self
  }

  pub fn playing(self) -> Self {
    self.transport_state(TransportState::Playing)
  }

  pub fn paused(self) -> Self {
    self.transport_state(TransportState::Paused)
  }

  /// Members reported by `group_snapshot`, with this device as coordinator
  pub fn snapshot_members<I, S>(mut self, members: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.snapshot_members = Some(members.into_iter().map(Into::into).collect());
    self
  }

  /// Coordinator reported by `group_snapshot`
  pub fn snapshot_coordinator(mut self, coordinator: DeviceHandle) -> Self {
    self.snapshot_coordinator = Some(coordinator);
    self
  }

  pub fn volume(mut self, volume: u8) -> Self {
    self.volume = volume;
    self
  }

  pub fn track(mut self, track: TrackInfo) -> Self {
    self.track = track;
    self
  }

  pub fn favorites(mut self, favorites: Vec<Favorite>) -> Self {
    self.favorites = favorites;
    self
  }

  pub fn failing(mut self, operation: Operation) -> Self {
    self.failing.insert(operation);
    self
  }

  pub fn build(self, log: &CallLog) -> DeviceHandle {
    self.build_mock(log)
  }

  /// Build and keep the concrete type, for tests that change behavior later
  pub fn build_mock(self, log: &CallLog) -> Arc<MockDevice> {
    let id = self
      .id
      .unwrap_or_else(|| format!("RINCON_{}", self.name.to_uppercase().replace(' ', "_")));

    Arc::new_cyclic(|me| MockDevice {
      me: me.clone(),
      id: SpeakerId::new(&id),
      name: self.name,
      snapshot_coordinator: self.snapshot_coordinator,
      snapshot_members: self.snapshot_members,
      track: self.track,
      favorites: self.favorites,
      state: Mutex::new(MockState {
        transport_state: self.transport_state,
        volume: self.volume,
        failing: self.failing,
      }),
      log: log.clone(),
    })
  }
}
