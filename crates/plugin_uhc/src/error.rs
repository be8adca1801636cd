//! Error types for the UHC plugin

use crate::types::{Location, MatchPhase, PlayerId};
use thiserror::Error;

/// Team registry errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TeamError {
    #[error("Team name cannot be empty")]
    EmptyName,

    #[error("Team {0} already exists")]
    AlreadyExists(String),

    #[error("Team {0} not found")]
    NotFound(String),
}

/// Match lifecycle errors
#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    #[error("Cannot {action} while the match is {phase}")]
    InvalidStateTransition {
        phase: MatchPhase,
        action: &'static str,
    },

    #[error("Players are still being teleported, please wait")]
    TeleportInProgress,

    #[error("Unable to start the game: {teams} teams but only {spawns} teleportation spots")]
    InsufficientSpawns { teams: usize, spawns: usize },

    #[error("Player {0} is not dead")]
    NotDead(PlayerId),

    #[error("No death location stored for player {0}")]
    NoDeathLocation(PlayerId),

    #[error("No safe spot found around {0}")]
    NoSafeSpot(Location),

    #[error("Team error: {0}")]
    Team(#[from] TeamError),
}

/// Admin command parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    #[error("Invalid team color: {0}")]
    InvalidColor(String),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors talking to the serialized plugin runtime
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("UHC runtime has shut down")]
    Closed,
}

/// Response codes reported back to the command surface
pub mod codes {
    pub const OK: i32 = 0;
    pub const INVALID_STATE: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INSUFFICIENT_RESOURCES: i32 = 3;
    pub const USAGE: i32 = 64;
}

impl GameError {
    pub fn code(&self) -> i32 {
        match self {
            GameError::InvalidStateTransition { .. } | GameError::TeleportInProgress => {
                codes::INVALID_STATE
            }
            GameError::InsufficientSpawns { .. } => codes::INSUFFICIENT_RESOURCES,
            GameError::NotDead(_)
            | GameError::NoDeathLocation(_)
            | GameError::NoSafeSpot(_)
            | GameError::Team(TeamError::NotFound(_)) => codes::NOT_FOUND,
            GameError::Team(_) => codes::INVALID_STATE,
        }
    }
}

impl CommandError {
    pub fn code(&self) -> i32 {
        match self {
            CommandError::UnknownPlayer(_) => codes::NOT_FOUND,
            _ => codes::USAGE,
        }
    }
}

// Result type aliases for convenience
pub type TeamResult<T> = Result<T, TeamError>;
pub type GameResult<T> = Result<T, GameError>;
pub type CommandResult<T> = Result<T, CommandError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
