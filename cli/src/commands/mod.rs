mod error;

pub use error::{CommandError, CommandResult};

use clap::Subcommand;
use zoneos::{Controller, DeviceDirectory, GroupStatus, TrackInfo};

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List discovered speakers
    Speakers,
    /// Show group members, coordinator and volumes
    Status,
    /// Change the managed group
    #[command(subcommand)]
    Group(GroupCommand),
    /// Show a speaker's volume, or set it (rounded to a multiple of 5)
    Volume {
        speaker: String,
        #[arg(allow_negative_numbers = true)]
        level: Option<i32>,
    },
    /// Play a URI on one speaker
    Play { speaker: String, uri: String },
    /// Send play, pause, stop, next or previous to one speaker
    Control { speaker: String, action: String },
    /// Browse and play Sonos favorites
    #[command(subcommand)]
    Favorites(FavoritesCommand),
    /// Show the track playing on the group coordinator
    NowPlaying,
    /// Read commands from stdin, keeping group state between them
    Shell,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum GroupCommand {
    /// Make the group exactly these speakers
    Set {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Join a speaker to the group
    Add { name: String },
    /// Take a speaker out of the group
    Remove { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum FavoritesCommand {
    /// List cached favorites with their 0-based index
    List,
    /// Reload favorites from the speakers
    Refresh,
    /// Play a favorite by index on the group
    Play { index: usize },
    /// Play a favorite by title on one speaker
    PlayOn { speaker: String, title: String },
    /// Play the next favorite on the group, wrapping around
    Next,
}

/// Run one command against the controller and describe the result
pub fn execute<D: DeviceDirectory>(controller: &mut Controller<D>, command: Command) -> CommandResult {
    match command {
        Command::Speakers => Ok(controller.list_speakers().join("\n")),
        Command::Status => Ok(format_status(&controller.group_status())),
        Command::Group(command) => execute_group(controller, command),
        Command::Volume { speaker, level: None } => {
            Ok(format!("{}: {}", speaker, controller.volume(&speaker)?))
        }
        Command::Volume { speaker, level: Some(level) } => {
            let applied = controller.set_volume(&speaker, level)?;
            Ok(format!("Set volume to {} on {}", applied, speaker))
        }
        Command::Play { speaker, uri } => {
            controller.play_uri(&speaker, &uri)?;
            Ok(format!("Playing {} on {}", uri, speaker))
        }
        Command::Control { speaker, action } => {
            controller.control_playback(&speaker, &action)?;
            Ok(format!("Executed '{}' on {}", action, speaker))
        }
        Command::Favorites(command) => execute_favorites(controller, command),
        Command::NowPlaying => Ok(match controller.now_playing()? {
            Some(track) => format_track(&track),
            None => "No group".to_string(),
        }),
        Command::Shell => Err(CommandError::NestedShell),
    }
}

fn execute_group<D: DeviceDirectory>(controller: &mut Controller<D>, command: GroupCommand) -> CommandResult {
    match command {
        GroupCommand::Set { names } => {
            controller.set_group(names)?.into_result()?;
        }
        GroupCommand::Add { name } => controller.add_to_group(&name)?,
        GroupCommand::Remove { name } => controller.remove_from_group(&name)?,
    }
    Ok(format_status(&controller.group_status()))
}

fn execute_favorites<D: DeviceDirectory>(
    controller: &mut Controller<D>,
    command: FavoritesCommand,
) -> CommandResult {
    match command {
        FavoritesCommand::List => Ok(controller
            .favorites()
            .iter()
            .enumerate()
            .map(|(index, favorite)| format!("{:>3}  {}", index, favorite.title))
            .collect::<Vec<_>>()
            .join("\n")),
        FavoritesCommand::Refresh => {
            let count = controller.refresh_favorites()?;
            Ok(format!("Refreshed {} favorites", count))
        }
        FavoritesCommand::Play { index } => {
            controller.play_favorite_by_index(index)?;
            Ok(format!("Playing favorite #{}", index))
        }
        FavoritesCommand::PlayOn { speaker, title } => {
            controller.play_favorite(&speaker, &title)?;
            Ok(format!("Playing '{}' on {}", title, speaker))
        }
        FavoritesCommand::Next => {
            controller.play_next_favorite()?;
            Ok("Playing next favorite".to_string())
        }
    }
}

fn format_status(status: &GroupStatus) -> String {
    let Some(coordinator) = &status.coordinator else {
        return "No group".to_string();
    };

    let mut lines = vec![format!("Coordinator: {}", coordinator)];
    for member in &status.members {
        match status.volumes.get(member) {
            Some(volume) => lines.push(format!("  {} (volume {})", member, volume)),
            None => lines.push(format!("  {}", member)),
        }
    }
    lines.join("\n")
}

fn format_track(track: &TrackInfo) -> String {
    if track.title.is_empty() && track.uri.is_empty() {
        return "Nothing playing".to_string();
    }

    let mut line = if track.title.is_empty() { track.uri.clone() } else { track.title.clone() };
    if !track.artist.is_empty() {
        line.push_str(&format!(" - {}", track.artist));
    }
    if !track.album.is_empty() {
        line.push_str(&format!(" ({})", track.album));
    }
    line
}
