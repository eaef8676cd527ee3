use thiserror::Error;
use zoneos::{ControllerError, GroupError, SonosError};

/// Errors that can occur while running a command
#[derive(Debug, Error)]
pub enum CommandError {
    /// Error from the controller (speaker lookup, favorites, playback, grouping)
    #[error(transparent)]
    Controller(#[from] ControllerError),
    /// Discovery or transport setup failed
    #[error(transparent)]
    Sonos(#[from] SonosError),
    #[error("shell is already running")]
    NestedShell,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to start logging: {0}")]
    Logging(String),
}

impl From<GroupError> for CommandError {
    fn from(err: GroupError) -> Self {
        CommandError::Controller(ControllerError::Group(err))
    }
}

/// Result type for command execution: the text to print on success
pub type CommandResult = Result<String, CommandError>;
