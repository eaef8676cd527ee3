use thiserror::Error;

/// Errors raised by a single device call (SOAP, HTTP, discovery, parsing)
#[derive(Debug, Clone, Error)]
pub enum SonosError {
  #[error("communication error: {0}")]
  CommunicationError(String),
  #[error("device not found: {0}")]
  DeviceNotFound(String),
  #[error("SOAP fault: {0}")]
  SoapFault(String),
  #[error("parse error: {0}")]
  ParseError(String),
  #[error("discovery failed: {0}")]
  DiscoveryFailed(String),
  #[error("invalid state: {0}")]
  InvalidState(String),
}

pub type Result<T> = std::result::Result<T, SonosError>;

/// Errors raised by the group coordinator
#[derive(Debug, Clone, Error)]
pub enum GroupError {
  #[error("speaker '{0}' not found")]
  DeviceNotFound(String),
  #[error("no speakers provided for group")]
  EmptyMembership,
  #[error("{context}: {source}")]
  Operation {
    context: String,
    #[source]
    source: SonosError,
  },
  #[error("group update failed for: {}", .failed.join(", "))]
  Reconciliation { failed: Vec<String> },
}

impl GroupError {
  pub(crate) fn operation(context: impl Into<String>, source: SonosError) -> Self {
    GroupError::Operation {
      context: context.into(),
      source,
    }
  }
}

/// Errors raised by the controller's speaker, favorites and playback operations
#[derive(Debug, Error)]
pub enum ControllerError {
  #[error("speaker '{0}' not found")]
  SpeakerNotFound(String),
  #[error("no speakers available")]
  NoSpeakersAvailable,
  #[error("favorite '{0}' not found")]
  FavoriteNotFound(String),
  #[error("no favorites available")]
  NoFavoritesAvailable,
  #[error("invalid favorite index: {index} (must be 0-{})", .len.saturating_sub(1))]
  InvalidIndex { index: usize, len: usize },
  #[error("unknown action: {0}")]
  UnknownAction(String),
  #[error(transparent)]
  Group(#[from] GroupError),
  #[error(transparent)]
  Device(#[from] SonosError),
}
