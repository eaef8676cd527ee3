use std::io::{BufRead, Write};

use clap::Parser;
use log::debug;
use zoneos::{Controller, DeviceDirectory};

use crate::commands::{self, Command, CommandError};

const PROMPT: &str = "zoneos> ";

/// One shell line, parsed with the same subcommands as the binary
#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

/// Run commands line by line until `exit`, `quit` or end of input
///
/// Command failures are printed and the session continues; only I/O errors end it.
pub fn run<D, R, W>(controller: &mut Controller<D>, input: R, mut output: W) -> Result<(), CommandError>
where
    D: DeviceDirectory,
    R: BufRead,
    W: Write,
{
    write!(output, "{}", PROMPT)?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        let words = split_words(&line);

        match words.first().map(String::as_str) {
            None => {}
            Some("exit") | Some("quit") => break,
            Some(_) => {
                debug!("shell: {}", line.trim());
                match Line::try_parse_from(&words) {
                    Ok(Line { command }) => match commands::execute(controller, command) {
                        Ok(text) if text.is_empty() => {}
                        Ok(text) => writeln!(output, "{}", text)?,
                        Err(e) => writeln!(output, "Error: {}", e)?,
                    },
                    Err(e) => write!(output, "{}", e.render())?,
                }
            }
        }

        write!(output, "{}", PROMPT)?;
        output.flush()?;
    }

    writeln!(output)?;
    Ok(())
}

/// Split a line on whitespace, keeping single- or double-quoted runs together
fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_word {
        words.push(current);
    }
    words
}
