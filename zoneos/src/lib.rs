pub mod controller;
pub mod device;
pub mod error;
pub mod group;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod models;
pub mod transport;
pub mod xml;

// Re-export key types for easier access
pub use controller::{Controller, GroupStatus, PlaybackAction};
pub use device::{Device, DeviceDirectory, DeviceHandle, GroupSnapshot, SonosDevice, SpeakerDirectory};
pub use error::{ControllerError, GroupError, Result, SonosError};
pub use group::{GroupCoordinator, MemberFailure, Reconciliation};
pub use models::{Favorite, Speaker, SpeakerId, TrackInfo, TransportState};
pub use transport::discovery::{discover_speakers_with_timeout, Discovery};
pub use transport::soap::SoapClient;
