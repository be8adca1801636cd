//! Interfaces the host server exposes to the plugin.
//!
//! The plugin never touches engine objects directly. Each concern is a narrow trait so
//! components can be handed exactly the collaborators they use, and so the sandbox host
//! can stand in for a real server in tests.

use crate::clock::Countdown;
use crate::events::UhcEvent;
use crate::types::{
    BlockPos, CommandSender, Difficulty, Dimension, GameMode, Location, Material, PlayerId,
    ScoreboardSnapshot, TaskHandle,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// World state queries and mutations.
pub trait World: Send + Sync {
    fn material_at(&self, dimension: Dimension, pos: BlockPos) -> Material;
    /// Build limit of the given dimension.
    fn max_height(&self, dimension: Dimension) -> i32;
    /// Y of the highest non-air block in an overworld column.
    fn highest_block_y(&self, x: i32, z: i32) -> i32;

    fn set_time(&self, time: i64);
    fn set_storm(&self, storm: bool);
    fn set_difficulty(&self, difficulty: Difficulty);
    fn set_game_rule(&self, rule: &str, value: bool);

    /// Returns false when the host refused the teleport.
    fn teleport(&self, player: PlayerId, to: Location) -> bool;
}

/// Connected players and per-player mutations.
pub trait Players: Send + Sync {
    fn online(&self) -> Vec<PlayerId>;
    fn is_online(&self, player: PlayerId) -> bool;
    fn name(&self, player: PlayerId) -> Option<String>;
    fn find_by_name(&self, name: &str) -> Option<PlayerId>;
    fn location(&self, player: PlayerId) -> Option<Location>;

    fn set_health(&self, player: PlayerId, health: f64);
    fn set_food_level(&self, player: PlayerId, food: u32);
    fn clear_inventory(&self, player: PlayerId);
    fn set_game_mode(&self, player: PlayerId, mode: GameMode);
    fn set_allow_flight(&self, player: PlayerId, allow: bool);
    fn set_flying(&self, player: PlayerId, flying: bool);

    fn send_message(&self, player: PlayerId, message: &str);
    fn broadcast(&self, message: &str);
}

/// Delayed and periodic work, expressed in game ticks.
///
/// Due tasks are handed back to the plugin through [`crate::UhcPlugin::run_task`] on the
/// same serialized context that submitted them.
pub trait Scheduler: Send + Sync {
    fn run_after(&self, delay_ticks: u64, task: Task) -> TaskHandle;
    fn run_periodic(&self, initial_delay_ticks: u64, period_ticks: u64, task: Task) -> TaskHandle;
    /// Returns false when the task already finished or was never scheduled.
    fn cancel(&self, handle: TaskHandle) -> bool;
}

/// Scoreboard and timer display.
pub trait Display: Send + Sync {
    fn register_timer(&self, timer: &Countdown);
    fn unregister_timer(&self, name: &str);
    fn update(&self, snapshot: &ScoreboardSnapshot);
}

/// Optional spectator-mode integration provided by a third-party plugin.
pub trait SpectatorMode: Send + Sync {
    fn set_spectating(&self, player: PlayerId, spectating: bool);
}

/// Outbound plugin events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &UhcEvent);
}

/// Wall-clock source.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Work submitted to the host scheduler.
///
/// Tasks carry only the data they need; every effect is applied when the plugin runs
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum Task {
    /// Drop one team on its spawn point.
    TeamStart {
        team: String,
        location: Location,
        slow: bool,
        /// 1-based position in the teleport order
        index: usize,
        total: usize,
        requested_by: CommandSender,
    },
    /// End of the damage-immunity window.
    EnableDamage,
    /// Once per second while the episode clock runs.
    TimerTick,
    /// Periodic border warning; stale generations are ignored.
    BorderWarning { generation: u64 },
}

/// Every collaborator the plugin can be given.
#[derive(Clone)]
pub struct HostContext {
    pub world: Arc<dyn World>,
    pub players: Arc<dyn Players>,
    pub scheduler: Arc<dyn Scheduler>,
    pub display: Arc<dyn Display>,
    pub events: Arc<dyn EventSink>,
    pub time: Arc<dyn TimeSource>,
    /// Absent when the spectator plugin is not installed.
    pub spectator_mode: Option<Arc<dyn SpectatorMode>>,
}

impl HostContext {
    /// Display name used in messages, falling back to the raw id.
    pub fn display_name(&self, player: PlayerId) -> String {
        self.players
            .name(player)
            .unwrap_or_else(|| player.to_string())
    }

    pub fn sender_name(&self, sender: CommandSender) -> String {
        match sender {
            CommandSender::Console => "console".to_string(),
            CommandSender::Player(player) => self.display_name(player),
        }
    }

    /// Delivers a message to whoever issued a command.
    pub fn reply(&self, sender: CommandSender, message: &str) {
        match sender {
            CommandSender::Console => tracing::info!(target: "uhc::console", "{}", message),
            CommandSender::Player(player) => self.players.send_message(player, message),
        }
    }

    pub fn set_spectating(&self, player: PlayerId, spectating: bool) {
        if let Some(integration) = &self.spectator_mode {
            integration.set_spectating(player, spectating);
        }
    }
}
