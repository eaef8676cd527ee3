use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use log::LevelFilter;

use crate::commands::Command;

/// Control a group of Sonos speakers on the local network
#[derive(Debug, Parser)]
#[command(name = "zoneos", version, long_about = None)]
pub struct Args {
    /// Seconds to wait for speakers to answer discovery
    #[arg(long, default_value_t = 5, env = "ZONEOS_DISCOVERY_TIMEOUT")]
    pub discovery_timeout: u64,

    /// Seconds before a single speaker request times out
    #[arg(long, default_value_t = 5, env = "ZONEOS_DEVICE_TIMEOUT")]
    pub device_timeout: u64,

    /// Group every speaker at startup, unless one is already playing
    #[arg(long, default_value_t = true, action = ArgAction::Set, env = "ZONEOS_AUTO_GROUP")]
    pub auto_group: bool,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, default_value = "info", env = "ZONEOS_LOG_LEVEL")]
    pub log_level: LevelFilter,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "ZONEOS_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout)
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_secs(self.device_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["zoneos", "status"]).unwrap();

        assert_eq!(args.discovery_timeout(), Duration::from_secs(5));
        assert_eq!(args.device_timeout(), Duration::from_secs(5));
        assert!(args.auto_group);
        assert_eq!(args.log_level, LevelFilter::Info);
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "zoneos",
            "--discovery-timeout",
            "2",
            "--auto-group",
            "false",
            "--log-level",
            "DEBUG",
            "--log-file",
            "/tmp/zoneos.log",
            "speakers",
        ])
        .unwrap();

        assert_eq!(args.discovery_timeout(), Duration::from_secs(2));
        assert!(!args.auto_group);
        assert_eq!(args.log_level, LevelFilter::Debug);
        assert_eq!(args.log_file, Some(PathBuf::from("/tmp/zoneos.log")));
    }

    #[test]
    fn test_rejects_bad_log_level() {
        assert!(Args::try_parse_from(["zoneos", "--log-level", "loud", "status"]).is_err());
    }
}
