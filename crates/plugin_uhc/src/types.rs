//! Core identifiers and value types shared by every UHC component.
//!
//! Everything here is plain data: cheap to copy, serializable, and free of any
//! reference to the host server.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Game ticks per second on the host server.
pub const TICKS_PER_SECOND: u64 = 20;

/// Health restored to every player when their team is dropped in.
pub const MAX_HEALTH: f64 = 20.0;

/// Food level restored to every player when their team is dropped in.
pub const MAX_FOOD_LEVEL: u32 = 20;

// ============================================================================
// Core Identifiers
// ============================================================================

/// Unique identifier for players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned by the host scheduler for a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle(pub u64);

/// Whoever issued an admin command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandSender {
    Console,
    Player(PlayerId),
}

// ============================================================================
// World Geometry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    #[default]
    Overworld,
    Nether,
    End,
}

impl Dimension {
    /// Nether-like dimensions have a bedrock roof well below the build limit.
    pub fn has_roof(&self) -> bool {
        matches!(self, Self::Nether)
    }
}

/// Integer block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn above(self) -> Self {
        Self { y: self.y + 1, ..self }
    }

    pub fn below(self) -> Self {
        Self { y: self.y - 1, ..self }
    }
}

/// A precise position inside a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub dimension: Dimension,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(dimension: Dimension, x: f64, y: f64, z: f64) -> Self {
        Self { dimension, x, y, z }
    }

    pub fn block(&self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }

    /// Same column, standing on the given block height.
    pub fn at_height(&self, y: i32) -> Self {
        Self {
            y: f64::from(y),
            ..*self
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} ({:.1}, {:.1}, {:.1})",
            self.dimension, self.x, self.y, self.z
        )
    }
}

/// The block materials the plugin needs to reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Air,
    TallGrass,
    Torch,
    Water,
    Lava,
    Stone,
    Dirt,
    Grass,
    Sand,
    Gravel,
    Leaves,
    Glass,
    Netherrack,
    Bedrock,
}

impl Material {
    /// Blocks a player can stand inside without suffocating.
    pub fn is_transparent(&self) -> bool {
        matches!(self, Self::Air | Self::TallGrass | Self::Torch)
    }

    pub fn is_liquid(&self) -> bool {
        matches!(self, Self::Water | Self::Lava)
    }

    pub fn is_solid(&self) -> bool {
        !self.is_transparent() && !self.is_liquid()
    }

    /// Transparent or liquid: breathable enough to be teleported into.
    pub fn is_passable(&self) -> bool {
        self.is_transparent() || self.is_liquid()
    }
}

// ============================================================================
// Host Enumerations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Peaceful,
    Easy,
    Normal,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamColor {
    #[default]
    White,
    Red,
    Blue,
    Green,
    Yellow,
    Aqua,
    Gold,
    Gray,
    LightPurple,
    DarkRed,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkPurple,
    Black,
}

impl FromStr for TeamColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let color = match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "white" => Self::White,
            "red" => Self::Red,
            "blue" => Self::Blue,
            "green" => Self::Green,
            "yellow" => Self::Yellow,
            "aqua" => Self::Aqua,
            "gold" => Self::Gold,
            "gray" | "grey" => Self::Gray,
            "light_purple" => Self::LightPurple,
            "dark_red" => Self::DarkRed,
            "dark_blue" => Self::DarkBlue,
            "dark_green" => Self::DarkGreen,
            "dark_aqua" => Self::DarkAqua,
            "dark_purple" => Self::DarkPurple,
            "black" => Self::Black,
            other => return Err(format!("unknown team color '{other}'")),
        };
        Ok(color)
    }
}

// ============================================================================
// Match State
// ============================================================================

/// Per-player state once a match has been started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Alive,
    Dead,
    Spectator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    #[default]
    NotStarted,
    SlowStartTeleporting,
    Running,
    Paused,
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::SlowStartTeleporting => "teleporting teams",
            Self::Running => "running",
            Self::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Why an episode ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftReason {
    /// Forced by an admin; carries the actor's display name.
    Manual(String),
    TimerExpired,
}

impl fmt::Display for ShiftReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual(actor) => write!(f, "manual:{actor}"),
            Self::TimerExpired => f.write_str("timer-expired"),
        }
    }
}

/// Read-only view pushed to the scoreboard renderer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreboardSnapshot {
    pub episode: u32,
    pub minutes_left: i64,
    pub seconds_left: i64,
    pub alive_players: usize,
    pub alive_teams: usize,
    pub running: bool,
    pub with_teams: bool,
    pub timer_paused: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_classes() {
        assert!(Material::Air.is_passable());
        assert!(Material::Water.is_passable());
        assert!(!Material::Lava.is_solid());
        assert!(Material::Stone.is_solid());
        assert!(Material::Glass.is_solid());
        assert!(!Material::Glass.is_passable());
    }

    #[test]
    fn test_location_block_floors_negative_coordinates() {
        let loc = Location::new(Dimension::Overworld, -0.5, 64.9, 10.2);
        assert_eq!(loc.block(), BlockPos::new(-1, 64, 10));
        assert_eq!(loc.at_height(70).y, 70.0);
    }

    #[test]
    fn test_team_color_parsing() {
        assert_eq!("Dark-Red".parse::<TeamColor>(), Ok(TeamColor::DarkRed));
        assert_eq!("grey".parse::<TeamColor>(), Ok(TeamColor::Gray));
        assert!("rainbow".parse::<TeamColor>().is_err());
    }

    #[test]
    fn test_shift_reason_display() {
        assert_eq!(ShiftReason::Manual("amaury".into()).to_string(), "manual:amaury");
        assert_eq!(ShiftReason::TimerExpired.to_string(), "timer-expired");
    }
}
