use log::info;

use crate::device::Device;
use crate::error::ControllerError;
use crate::models::Favorite;

/// Favorites fetched from the household, plus the position last played
#[derive(Debug, Default)]
pub struct FavoritesCache {
  favorites: Vec<Favorite>,
  current: usize,
}

impl FavoritesCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Replace the cache with Sonos favorites and favorite radio stations from `device`
  pub fn refresh(&mut self, device: &dyn Device) -> Result<usize, ControllerError> {
    self.favorites = device.favorites()?;
    info!("Refreshed {} favorites", self.favorites.len());
    Ok(self.favorites.len())
  }

  pub fn all(&self) -> &[Favorite] {
    &self.favorites
  }

  pub fn len(&self) -> usize {
    self.favorites.len()
  }

  pub fn is_empty(&self) -> bool {
    self.favorites.is_empty()
  }

  pub fn get(&self, index: usize) -> Result<&Favorite, ControllerError> {
    self.favorites.get(index).ok_or(ControllerError::InvalidIndex {
      index,
      len: self.favorites.len(),
    })
  }

  pub fn find(&self, title: &str) -> Option<&Favorite> {
    self.favorites.iter().find(|favorite| favorite.title == title)
  }

  pub fn current(&self) -> usize {
    self.current
  }

  pub fn mark_played(&mut self, index: usize) {
    self.current = index;
  }

  /// Index after the last played one, wrapping to the start
  pub fn next_index(&self) -> Option<usize> {
    if self.favorites.is_empty() {
      None
    } else {
      Some((self.current + 1) % self.favorites.len())
    }
  }
}
