//! Engine error taxonomy
//!
//! Rejected commands, collisions and obstacle retirement are ordinary control
//! flow. Only configuration errors are fatal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::highscores::LedgerError;
use crate::settings::ConfigError;
use crate::sim::GamePhase;

/// Commands accepted by the game state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Start,
    Jump,
    Reset,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Jump => "jump",
            Command::Reset => "reset",
        }
    }
}

#[derive(Debug)]
pub enum GameError {
    /// Command has no transition in the current phase. The game is unchanged;
    /// callers treat this as a no-op.
    InvalidCommand { command: Command, phase: GamePhase },
    /// World parameters are out of range or contradictory
    InvalidConfiguration(ConfigError),
    /// The ledger failed to record a score. The transition it accompanied has
    /// already happened.
    LedgerWriteFailure(LedgerError),
}

impl GameError {
    /// True for errors that leave the game fully usable
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GameError::InvalidConfiguration(_))
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCommand { command, phase } => {
                write!(f, "{} ignored in phase {:?}", command.as_str(), phase)
            }
            Self::InvalidConfiguration(e) => write!(f, "invalid configuration: {}", e),
            Self::LedgerWriteFailure(e) => write!(f, "ledger write failed: {}", e),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidCommand { .. } => None,
            Self::InvalidConfiguration(e) => Some(e),
            Self::LedgerWriteFailure(e) => Some(e),
        }
    }
}

impl From<ConfigError> for GameError {
    fn from(e: ConfigError) -> Self {
        GameError::InvalidConfiguration(e)
    }
}

impl From<LedgerError> for GameError {
    fn from(e: LedgerError) -> Self {
        GameError::LedgerWriteFailure(e)
    }
}
