use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::Error;

/// Movement classification reported on the state subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CurtainState {
    Opening,
    Closing,
    #[default]
    Stopped,
}

impl CurtainState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurtainState::Opening => "opening",
            CurtainState::Closing => "closing",
            CurtainState::Stopped => "stopped",
        }
    }
}

impl Display for CurtainState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurtainState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opening" => Ok(CurtainState::Opening),
            "closing" => Ok(CurtainState::Closing),
            "stopped" => Ok(CurtainState::Stopped),
            unsupported => Err(Error::InvalidState(unsupported.to_string())),
        }
    }
}

/// Operator commands accepted by the demo binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move(i32),
    Open,
    Close,
    Query,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "open" => Ok(Command::Open),
            "close" => Ok(Command::Close),
            "query" => Ok(Command::Query),
            "quit" | "exit" => Ok(Command::Quit),
            other => other
                .parse::<i32>()
                .map(Command::Move)
                .map_err(|_| Error::InvalidCommand(other.to_string())),
        }
    }
}
