use std::fs::File;

use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};

use crate::commands::CommandError;
use crate::config::Args;

/// Install the global logger: stderr by default, or a file when configured
pub fn init(args: &Args) -> Result<(), CommandError> {
    let config = ConfigBuilder::new()
        .add_filter_allow_str("zoneos")
        .build();

    match &args.log_file {
        Some(path) => WriteLogger::init(args.log_level, config, File::create(path)?),
        None => TermLogger::init(args.log_level, config, TerminalMode::Stderr, ColorChoice::Auto),
    }
    .map_err(|e| CommandError::Logging(e.to_string()))
}
