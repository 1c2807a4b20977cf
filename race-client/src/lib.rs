//! Client side of the syllabus race: talks to the progress server, keeps a
//! local cache of everyone's progress and renders it as text.

pub mod api;
pub mod cache;
pub mod identity;
pub mod render;
pub mod sync;

use std::str::{FromStr, SplitWhitespace};

use race_utils::{ProgressError, TOTAL_UNITS, syllabus};
use thiserror::Error;

pub use api::{HttpProgressApi, ProgressApi};
pub use cache::LocalCache;
pub use identity::IdentityStore;
pub use sync::{SyncClient, View};

/// How often the whole store is re-fetched.
pub const POLL_INTERVAL_MS: u64 = 2500;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error {status}: {message}")]
    Server { status: u16, message: String },

    #[error(transparent)]
    Progress(#[from] ProgressError),

    #[error(transparent)]
    Identity(#[from] identity::IdentityError),

    #[error("No player selected")]
    NoPlayerSelected,

    #[error("A player name is required")]
    NoIdentity,
}

/// A line typed into `race-client watch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    Flip(usize),
    Set(usize, bool),
    Reset { confirmed: bool },
    Refresh,
    Help,
    Quit,
}

/// Turns either a flattened `<index>` or a 1-based `<subject#> <unit#>` pair
/// into a flattened unit index.
pub fn resolve_unit(first: usize, unit: Option<usize>) -> Result<usize, String> {
    match unit {
        None if first < TOTAL_UNITS => Ok(first),
        None => Err(format!("unit index must be below {TOTAL_UNITS}")),
        Some(unit) => first
            .checked_sub(1)
            .and_then(|subject| syllabus::unit_index(subject, unit))
            .ok_or_else(|| format!("subject {first} has no unit {unit}")),
    }
}

fn unit_arg(command: &str, words: &mut SplitWhitespace<'_>) -> Result<usize, String> {
    let number = |word: &str| {
        word.parse::<usize>()
            .map_err(|e| format!("bad number {word:?}: {e}"))
    };
    let first = words
        .next()
        .ok_or_else(|| format!("`{command}` needs a unit index or `<subject#> <unit#>`"))?;
    let unit = words.next().map(number).transpose()?;
    resolve_unit(number(first)?, unit)
}

impl FromStr for WatchCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or_else(|| "empty command".to_string())?;

        match command {
            "toggle" | "t" => Ok(WatchCommand::Flip(unit_arg(command, &mut words)?)),
            "check" | "c" => Ok(WatchCommand::Set(unit_arg(command, &mut words)?, true)),
            "uncheck" | "u" => Ok(WatchCommand::Set(unit_arg(command, &mut words)?, false)),
            "reset" => Ok(WatchCommand::Reset {
                confirmed: words.next() == Some("confirm"),
            }),
            "refresh" | "r" => Ok(WatchCommand::Refresh),
            "help" | "h" | "?" => Ok(WatchCommand::Help),
            "quit" | "q" | "exit" => Ok(WatchCommand::Quit),
            other => Err(format!("unknown command `{other}`, try `help`")),
        }
    }
}
