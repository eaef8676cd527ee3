use std::fmt;
use std::str::FromStr;

use crate::device::Device;
use crate::error::{ControllerError, Result};

/// Transport control forwarded to a speaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackAction {
  Play,
  Pause,
  Stop,
  Next,
  Previous,
}

impl PlaybackAction {
  pub fn apply(&self, device: &dyn Device) -> Result<()> {
    match self {
      PlaybackAction::Play => device.play(),
      PlaybackAction::Pause => device.pause(),
      PlaybackAction::Stop => device.stop(),
      PlaybackAction::Next => device.next(),
      PlaybackAction::Previous => device.previous(),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      PlaybackAction::Play => "play",
      PlaybackAction::Pause => "pause",
      PlaybackAction::Stop => "stop",
      PlaybackAction::Next => "next",
      PlaybackAction::Previous => "previous",
    }
  }
}

impl FromStr for PlaybackAction {
  type Err = ControllerError;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s {
      "play" => Ok(PlaybackAction::Play),
      "pause" => Ok(PlaybackAction::Pause),
      "stop" => Ok(PlaybackAction::Stop),
      "next" => Ok(PlaybackAction::Next),
      "previous" => Ok(PlaybackAction::Previous),
      other => Err(ControllerError::UnknownAction(other.to_string())),
    }
  }
}

impl fmt::Display for PlaybackAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Snap a requested volume to the nearest multiple of 5 within 0-100
pub fn round_volume(volume: i32) -> u8 {
  let rounded = (f64::from(volume) / 5.0).round() * 5.0;
  rounded.clamp(0.0, 100.0) as u8
}
