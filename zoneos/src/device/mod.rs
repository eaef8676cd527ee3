//! Device capability consumed by the group coordinator and controller, plus
//! the name-keyed directory devices are resolved through.

mod sonos;

pub use sonos::SonosDevice;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Favorite, SpeakerId, TrackInfo, TransportState};

/// Shared, non-owning reference to a playback device
pub type DeviceHandle = Arc<dyn Device>;

/// A device's own report of its group: coordinator plus member names
#[derive(Clone)]
pub struct GroupSnapshot {
    pub coordinator: DeviceHandle,
    pub members: BTreeSet<String>,
}

impl fmt::Debug for GroupSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupSnapshot")
            .field("coordinator", &self.coordinator.name())
            .field("members", &self.members)
            .finish()
    }
}

/// One networked playback device
///
/// Every call is a blocking round trip; timeouts belong to the implementation.
pub trait Device: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    fn id(&self) -> &SpeakerId;

    // Grouping
    fn join(&self, coordinator: &dyn Device) -> Result<()>;
    fn unjoin(&self) -> Result<()>;
    fn transport_state(&self) -> Result<TransportState>;
    fn group_snapshot(&self) -> Result<GroupSnapshot>;

    // Playback
    fn play(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
    fn stop(&self) -> Result<()>;
    fn next(&self) -> Result<()>;
    fn previous(&self) -> Result<()>;
    fn play_uri(&self, uri: &str, metadata: &str) -> Result<()>;
    fn volume(&self) -> Result<u8>;
    fn set_volume(&self, volume: u8) -> Result<()>;
    fn track_info(&self) -> Result<TrackInfo>;
    fn favorites(&self) -> Result<Vec<Favorite>>;
}

/// Read access to the known devices, keyed by name
pub trait DeviceDirectory {
    fn get(&self, name: &str) -> Option<DeviceHandle>;

    /// All devices in discovery order
    fn all(&self) -> Vec<DeviceHandle>;

    fn names(&self) -> Vec<String> {
        self.all().iter().map(|device| device.name().to_string()).collect()
    }

    fn is_empty(&self) -> bool {
        self.all().is_empty()
    }
}

impl<T: DeviceDirectory + ?Sized> DeviceDirectory for Arc<T> {
    fn get(&self, name: &str) -> Option<DeviceHandle> {
        (**self).get(name)
    }

    fn all(&self) -> Vec<DeviceHandle> {
        (**self).all()
    }
}

/// Insertion-ordered directory built from discovery results
#[derive(Debug, Default)]
pub struct SpeakerDirectory {
    order: Vec<String>,
    devices: HashMap<String, DeviceHandle>,
}

impl SpeakerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device; a later device with the same name replaces the earlier one
    pub fn insert(&mut self, device: DeviceHandle) {
        let name = device.name().to_string();
        if self.devices.insert(name.clone(), device).is_none() {
            self.order.push(name);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}

impl FromIterator<DeviceHandle> for SpeakerDirectory {
    fn from_iter<I: IntoIterator<Item = DeviceHandle>>(iter: I) -> Self {
        let mut directory = SpeakerDirectory::new();
        for device in iter {
            directory.insert(device);
        }
        directory
    }
}

impl DeviceDirectory for SpeakerDirectory {
    fn get(&self, name: &str) -> Option<DeviceHandle> {
        self.devices.get(name).cloned()
    }

    fn all(&self) -> Vec<DeviceHandle> {
        self.order
            .iter()
            .filter_map(|name| self.devices.get(name).cloned())
            .collect()
    }
}
