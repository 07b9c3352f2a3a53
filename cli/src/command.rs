use std::str::FromStr;
use sweeper_core::{Coord, Coord2};
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Open(Coord2),
    Mark(Coord2),
    New,
    Dump,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Type a command, h for help")]
    Empty,
    #[error("Unknown command {0:?}, h for help")]
    Unknown(String),
    #[error("Expected a row and a column")]
    MissingCoords,
    #[error("Invalid coordinate {0:?}")]
    BadCoord(String),
}

pub const HELP: &str = "\
Commands:
  o ROW COL   open a cell
  m ROW COL   toggle the mark on a cell
  n           start a new game
  j           dump the board as JSON
  q           quit";

fn parse_coords<'a>(mut args: impl Iterator<Item = &'a str>) -> Result<Coord2, CommandError> {
    let mut next = || {
        let arg = args.next().ok_or(CommandError::MissingCoords)?;
        arg.parse::<Coord>()
            .map_err(|_| CommandError::BadCoord(arg.to_string()))
    };
    let row = next()?;
    let column = next()?;
    Ok((row, column))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Err(CommandError::Empty);
        };
        Ok(match word.to_ascii_lowercase().as_str() {
            "o" | "open" => Command::Open(parse_coords(words)?),
            "m" | "mark" => Command::Mark(parse_coords(words)?),
            "n" | "new" => Command::New,
            "j" | "json" => Command::Dump,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(word.to_string())),
        })
    }
}
