//! High-level household controller: speakers by name, volume, favorites,
//! playback and the single managed group.

mod favorites;
mod playback;

pub use favorites::FavoritesCache;
pub use playback::{round_volume, PlaybackAction};

use std::collections::{BTreeMap, BTreeSet};

use log::{error, info, warn};

use crate::device::{DeviceDirectory, DeviceHandle};
use crate::error::ControllerError;
use crate::group::{GroupCoordinator, Reconciliation};
use crate::models::{Favorite, TrackInfo};

/// Members of the managed group and the volumes they reported
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupStatus {
  pub coordinator: Option<String>,
  pub members: BTreeSet<String>,
  pub volumes: BTreeMap<String, u8>,
}

pub struct Controller<D: DeviceDirectory> {
  group: GroupCoordinator<D>,
  favorites: FavoritesCache,
}

impl<D: DeviceDirectory> Controller<D> {
  /// Load favorites and, when `auto_group` is set, group every speaker
  ///
  /// Neither step is fatal; failures are logged and the controller starts anyway.
  pub fn new(directory: D, auto_group: bool) -> Self {
    let mut controller = Self {
      group: GroupCoordinator::new(directory),
      favorites: FavoritesCache::new(),
    };

    if controller.group.directory().is_empty() {
      warn!("No speakers available");
      return controller;
    }

    if let Err(e) = controller.refresh_favorites() {
      error!("Failed to refresh favorites: {}", e);
    }

    if auto_group {
      let devices = controller.group.directory().all();
      if let Err(e) = controller.group.initialize(&devices) {
        error!("Failed to initialize group: {}", e);
      }
    }

    controller
  }

  pub fn group(&self) -> &GroupCoordinator<D> {
    &self.group
  }

  pub fn list_speakers(&self) -> Vec<String> {
    self.group.directory().names()
  }

  pub fn speaker(&self, name: &str) -> Result<DeviceHandle, ControllerError> {
    self
      .group
      .directory()
      .get(name)
      .ok_or_else(|| ControllerError::SpeakerNotFound(name.to_string()))
  }

  fn any_speaker(&self) -> Result<DeviceHandle, ControllerError> {
    self
      .group
      .directory()
      .all()
      .into_iter()
      .next()
      .ok_or(ControllerError::NoSpeakersAvailable)
  }

  /// Set a speaker's volume, snapped to a multiple of 5; returns the applied level
  pub fn set_volume(&self, name: &str, volume: i32) -> Result<u8, ControllerError> {
    let speaker = self.speaker(name)?;
    let volume = round_volume(volume);
    speaker.set_volume(volume)?;
    info!("Set volume to {} on {}", volume, name);
    Ok(volume)
  }

  pub fn volume(&self, name: &str) -> Result<u8, ControllerError> {
    Ok(self.speaker(name)?.volume()?)
  }

  pub fn refresh_favorites(&mut self) -> Result<usize, ControllerError> {
    let speaker = self.any_speaker()?;
    self.favorites.refresh(speaker.as_ref())
  }

  pub fn favorites(&self) -> &[Favorite] {
    self.favorites.all()
  }

  /// Play the favorite titled `title` on one speaker
  ///
  /// The speaker's current favorites are fetched so the match uses fresh
  /// resource metadata.
  pub fn play_favorite(&mut self, speaker_name: &str, title: &str) -> Result<(), ControllerError> {
    let speaker = self.speaker(speaker_name)?;
    self.favorites.refresh(speaker.as_ref())?;

    let favorite = self
      .favorites
      .find(title)
      .ok_or_else(|| ControllerError::FavoriteNotFound(title.to_string()))?;

    speaker.play_uri(&favorite.uri, &favorite.metadata)?;
    info!("Playing favorite '{}' on {}", title, speaker_name);
    Ok(())
  }

  /// Play the favorite at a 0-based `index` on the group coordinator
  ///
  /// Creates the group from every speaker first when there is none.
  pub fn play_favorite_by_index(&mut self, index: usize) -> Result<(), ControllerError> {
    let coordinator = match self.group.coordinator() {
      Some(coordinator) => coordinator,
      None => self.initialize_group()?,
    };

    let favorite = self.favorites.get(index)?;
    coordinator.play_uri(&favorite.uri, &favorite.metadata)?;
    info!("Playing favorite #{} '{}' on group", index, favorite.title);

    self.favorites.mark_played(index);
    Ok(())
  }

  /// Play the favorite after the last one played, wrapping around
  pub fn play_next_favorite(&mut self) -> Result<(), ControllerError> {
    let index = self
      .favorites
      .next_index()
      .ok_or(ControllerError::NoFavoritesAvailable)?;
    self.play_favorite_by_index(index)
  }

  fn initialize_group(&mut self) -> Result<DeviceHandle, ControllerError> {
    let devices = self.group.directory().all();
    if devices.is_empty() {
      return Err(ControllerError::NoSpeakersAvailable);
    }

    info!("No group set, initializing with all speakers");
    self.group.initialize(&devices)?;
    self
      .group
      .coordinator()
      .ok_or(ControllerError::NoSpeakersAvailable)
  }

  pub fn play_uri(&self, speaker_name: &str, uri: &str) -> Result<(), ControllerError> {
    self.speaker(speaker_name)?.play_uri(uri, "")?;
    info!("Playing URI on {}: {}", speaker_name, uri);
    Ok(())
  }

  pub fn control_playback(&self, speaker_name: &str, action: &str) -> Result<(), ControllerError> {
    let speaker = self.speaker(speaker_name)?;
    let action: PlaybackAction = action.parse()?;
    action.apply(speaker.as_ref())?;
    info!("Executed '{}' on {}", action, speaker_name);
    Ok(())
  }

  /// Track playing on the group coordinator, `None` without a group
  pub fn now_playing(&self) -> Result<Option<TrackInfo>, ControllerError> {
    match self.group.coordinator() {
      Some(coordinator) => Ok(Some(coordinator.track_info()?)),
      None => Ok(None),
    }
  }

  pub fn coordinator(&self) -> Option<DeviceHandle> {
    self.group.coordinator()
  }

  pub fn set_group<I, S>(&mut self, names: I) -> Result<Reconciliation, ControllerError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Ok(self.group.set_members(names)?)
  }

  pub fn add_to_group(&mut self, name: &str) -> Result<(), ControllerError> {
    Ok(self.group.add_member(name)?)
  }

  pub fn remove_from_group(&mut self, name: &str) -> Result<(), ControllerError> {
    Ok(self.group.remove_member(name)?)
  }

  /// Group members with their volumes; members whose volume can't be read are left out of `volumes`
  pub fn group_status(&self) -> GroupStatus {
    let members = self.group.members();
    let mut volumes = BTreeMap::new();

    for name in &members {
      match self.volume(name) {
        Ok(volume) => {
          volumes.insert(name.clone(), volume);
        }
        Err(e) => warn!("Failed to get volume of {}: {}", name, e),
      }
    }

    GroupStatus {
      coordinator: self.group.coordinator().map(|c| c.name().to_string()),
      members,
      volumes,
    }
  }
}
