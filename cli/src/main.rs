mod commands;
mod config;
mod logging;
mod shell;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use zoneos::{Controller, Discovery, SoapClient, SonosDevice};

use commands::{Command, CommandError};
use config::Args;

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = logging::init(&args) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CommandError> {
    let speakers = Discovery::new(args.discovery_timeout()).discover_speakers()?;
    info!("Discovered {} speakers", speakers.len());

    let soap = SoapClient::new(args.device_timeout())?;
    let mut controller = Controller::new(SonosDevice::directory(speakers, &soap), args.auto_group);

    match args.command {
        Command::Shell => shell::run(&mut controller, io::stdin().lock(), io::stdout()),
        command => {
            let output = commands::execute(&mut controller, command)?;
            if !output.is_empty() {
                println!("{}", output);
            }
            Ok(())
        }
    }
}
