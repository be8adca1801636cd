//! In-memory host.
//!
//! [`Sandbox`] implements every host trait over a flat, mutable world and a tick-based
//! scheduler. The dev server runs the plugin against it, and tests use it to drive
//! the match and inspect everything the plugin did.

use crate::clock::Countdown;
use crate::events::UhcEvent;
use crate::host::{
    Display, EventSink, HostContext, Players, Scheduler, SpectatorMode, Task, TimeSource, World,
};
use crate::types::{
    BlockPos, Difficulty, Dimension, GameMode, Location, Material, PlayerId, ScoreboardSnapshot,
    TaskHandle,
};
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Surface height of the generated terrain.
pub const GROUND_LEVEL: i32 = 64;

const OVERWORLD_HEIGHT: i32 = 256;
const NETHER_HEIGHT: i32 = 128;
const MILLIS_PER_TICK: i64 = 50;
const STARTING_ITEMS: u32 = 5;

/// A connected (or previously connected) player.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxPlayer {
    pub id: PlayerId,
    pub name: String,
    pub online: bool,
    pub location: Location,
    pub health: f64,
    pub food_level: u32,
    pub game_mode: GameMode,
    pub allow_flight: bool,
    pub flying: bool,
    pub inventory_items: u32,
    pub spectating: bool,
    pub messages: Vec<String>,
}

/// World-wide settings the plugin can change.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSettings {
    pub time: i64,
    pub storm: bool,
    pub difficulty: Difficulty,
    pub game_rules: HashMap<String, bool>,
}

#[derive(Debug)]
struct ScheduledTask {
    handle: TaskHandle,
    due_tick: u64,
    period: Option<u64>,
    task: Task,
}

struct SandboxState {
    blocks: HashMap<(Dimension, BlockPos), Material>,
    players: Vec<SandboxPlayer>,
    world: WorldSettings,
    broadcasts: Vec<String>,
    events: Vec<UhcEvent>,
    timers: Vec<String>,
    snapshots: Vec<ScoreboardSnapshot>,
    scheduled: Vec<ScheduledTask>,
    next_handle: u64,
    tick: u64,
    now: DateTime<Utc>,
}

impl SandboxState {
    fn player(&self, id: PlayerId) -> Option<&SandboxPlayer> {
        self.players.iter().find(|p| p.id == id)
    }

    fn player_mut(&mut self, id: PlayerId) -> Option<&mut SandboxPlayer> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    fn schedule(&mut self, delay: u64, period: Option<u64>, task: Task) -> TaskHandle {
        self.next_handle += 1;
        let handle = TaskHandle(self.next_handle);
        self.scheduled.push(ScheduledTask {
            handle,
            due_tick: self.tick.saturating_add(delay),
            period,
            task,
        });
        handle
    }
}

pub struct Sandbox {
    state: Mutex<SandboxState>,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SandboxState {
                blocks: HashMap::new(),
                players: Vec::new(),
                world: WorldSettings {
                    time: 0,
                    storm: true,
                    difficulty: Difficulty::Normal,
                    game_rules: HashMap::new(),
                },
                broadcasts: Vec::new(),
                events: Vec::new(),
                timers: Vec::new(),
                snapshots: Vec::new(),
                scheduled: Vec::new(),
                next_handle: 0,
                tick: 0,
                // 2024-01-01T00:00:00Z
                now: DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(1_704_067_200),
            }),
        }
    }

    /// Host context backed entirely by this sandbox.
    pub fn context(self: &Arc<Self>) -> HostContext {
        HostContext {
            world: self.clone(),
            players: self.clone(),
            scheduler: self.clone(),
            display: self.clone(),
            events: self.clone(),
            time: self.clone(),
            spectator_mode: Some(self.clone()),
        }
    }

    // ------------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------------

    /// Connects a new player standing on the ground at the world origin.
    pub fn add_player(&self, name: &str) -> PlayerId {
        let id = PlayerId::new();
        let mut state = self.state.lock();
        state.players.push(SandboxPlayer {
            id,
            name: name.to_string(),
            online: true,
            location: Location::new(Dimension::Overworld, 0.5, f64::from(GROUND_LEVEL + 1), 0.5),
            health: 20.0,
            food_level: 20,
            game_mode: GameMode::Adventure,
            allow_flight: false,
            flying: false,
            inventory_items: STARTING_ITEMS,
            spectating: false,
            messages: Vec::new(),
        });
        debug!(%id, name, "sandbox player connected");
        id
    }

    pub fn disconnect(&self, player: PlayerId) {
        if let Some(p) = self.state.lock().player_mut(player) {
            p.online = false;
        }
    }

    pub fn reconnect(&self, player: PlayerId) {
        if let Some(p) = self.state.lock().player_mut(player) {
            p.online = true;
        }
    }

    pub fn place_player(&self, player: PlayerId, location: Location) {
        if let Some(p) = self.state.lock().player_mut(player) {
            p.location = location;
        }
    }

    pub fn set_block(&self, dimension: Dimension, pos: BlockPos, material: Material) {
        self.state.lock().blocks.insert((dimension, pos), material);
    }

    // ------------------------------------------------------------------------
    // Scheduler driving
    // ------------------------------------------------------------------------

    /// Advances game time by `ticks`, returning the tasks that came due, in order.
    ///
    /// Each tick also moves the wall clock by 50 ms. Tasks cancelled by the caller while
    /// handling a batch only stop firing from the next call, so advance one tick at a
    /// time when that matters.
    pub fn advance(&self, ticks: u64) -> Vec<Task> {
        let mut state = self.state.lock();
        let mut due = Vec::new();

        for _ in 0..ticks {
            state.tick += 1;
            state.now += TimeDelta::milliseconds(MILLIS_PER_TICK);
            let tick = state.tick;

            let mut fired: Vec<(u64, TaskHandle, Task)> = Vec::new();
            state.scheduled.retain_mut(|scheduled| {
                if scheduled.due_tick > tick {
                    return true;
                }
                fired.push((scheduled.due_tick, scheduled.handle, scheduled.task.clone()));
                match scheduled.period {
                    Some(period) => {
                        scheduled.due_tick = tick.saturating_add(period.max(1));
                        true
                    }
                    None => false,
                }
            });
            fired.sort_by_key(|(due_tick, handle, _)| (*due_tick, handle.0));
            due.extend(fired.into_iter().map(|(_, _, task)| task));
        }

        due
    }

    /// Moves the wall clock without running the scheduler.
    pub fn advance_time(&self, delta: TimeDelta) {
        self.state.lock().now += delta;
    }

    pub fn current_tick(&self) -> u64 {
        self.state.lock().tick
    }

    pub fn pending_tasks(&self) -> Vec<Task> {
        self.state
            .lock()
            .scheduled
            .iter()
            .map(|scheduled| scheduled.task.clone())
            .collect()
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    pub fn player(&self, player: PlayerId) -> Option<SandboxPlayer> {
        self.state.lock().player(player).cloned()
    }

    pub fn player_location(&self, player: PlayerId) -> Option<Location> {
        self.state.lock().player(player).map(|p| p.location)
    }

    pub fn messages(&self, player: PlayerId) -> Vec<String> {
        self.state
            .lock()
            .player(player)
            .map(|p| p.messages.clone())
            .unwrap_or_default()
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.state.lock().broadcasts.clone()
    }

    pub fn events(&self) -> Vec<UhcEvent> {
        self.state.lock().events.clone()
    }

    pub fn registered_timers(&self) -> Vec<String> {
        self.state.lock().timers.clone()
    }

    pub fn snapshots(&self) -> Vec<ScoreboardSnapshot> {
        self.state.lock().snapshots.clone()
    }

    pub fn last_snapshot(&self) -> Option<ScoreboardSnapshot> {
        self.state.lock().snapshots.last().cloned()
    }

    pub fn world_settings(&self) -> WorldSettings {
        self.state.lock().world.clone()
    }

    pub fn players(&self) -> Vec<SandboxPlayer> {
        self.state.lock().players.clone()
    }
}

impl World for Sandbox {
    fn material_at(&self, dimension: Dimension, pos: BlockPos) -> Material {
        if let Some(material) = self.state.lock().blocks.get(&(dimension, pos)) {
            return *material;
        }
        match pos.y {
            y if y < 0 || y >= self.max_height(dimension) => Material::Air,
            0 => Material::Bedrock,
            y if y < GROUND_LEVEL => Material::Stone,
            GROUND_LEVEL => Material::Grass,
            _ => Material::Air,
        }
    }

    fn max_height(&self, dimension: Dimension) -> i32 {
        match dimension {
            Dimension::Nether => NETHER_HEIGHT,
            Dimension::Overworld | Dimension::End => OVERWORLD_HEIGHT,
        }
    }

    fn highest_block_y(&self, x: i32, z: i32) -> i32 {
        (0..OVERWORLD_HEIGHT)
            .rev()
            .find(|y| self.material_at(Dimension::Overworld, BlockPos::new(x, *y, z)) != Material::Air)
            .unwrap_or(0)
    }

    fn set_time(&self, time: i64) {
        self.state.lock().world.time = time;
    }

    fn set_storm(&self, storm: bool) {
        self.state.lock().world.storm = storm;
    }

    fn set_difficulty(&self, difficulty: Difficulty) {
        self.state.lock().world.difficulty = difficulty;
    }

    fn set_game_rule(&self, rule: &str, value: bool) {
        self.state
            .lock()
            .world
            .game_rules
            .insert(rule.to_string(), value);
    }

    fn teleport(&self, player: PlayerId, to: Location) -> bool {
        match self.state.lock().player_mut(player) {
            Some(p) if p.online => {
                p.location = to;
                true
            }
            _ => false,
        }
    }
}

impl Players for Sandbox {
    fn online(&self) -> Vec<PlayerId> {
        self.state
            .lock()
            .players
            .iter()
            .filter(|p| p.online)
            .map(|p| p.id)
            .collect()
    }

    fn is_online(&self, player: PlayerId) -> bool {
        self.state.lock().player(player).is_some_and(|p| p.online)
    }

    fn name(&self, player: PlayerId) -> Option<String> {
        self.state.lock().player(player).map(|p| p.name.clone())
    }

    fn find_by_name(&self, name: &str) -> Option<PlayerId> {
        self.state
            .lock()
            .players
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.id)
    }

    fn location(&self, player: PlayerId) -> Option<Location> {
        self.player_location(player)
    }

    fn set_health(&self, player: PlayerId, health: f64) {
        if let Some(p) = self.state.lock().player_mut(player) {
            p.health = health;
        }
    }

    fn set_food_level(&self, player: PlayerId, food: u32) {
        if let Some(p) = self.state.lock().player_mut(player) {
            p.food_level = food;
        }
    }

    fn clear_inventory(&self, player: PlayerId) {
        if let Some(p) = self.state.lock().player_mut(player) {
            p.inventory_items = 0;
        }
    }

    fn set_game_mode(&self, player: PlayerId, mode: GameMode) {
        if let Some(p) = self.state.lock().player_mut(player) {
            p.game_mode = mode;
        }
    }

    fn set_allow_flight(&self, player: PlayerId, allow: bool) {
        if let Some(p) = self.state.lock().player_mut(player) {
            p.allow_flight = allow;
            if !allow {
                p.flying = false;
            }
        }
    }

    fn set_flying(&self, player: PlayerId, flying: bool) {
        if let Some(p) = self.state.lock().player_mut(player) {
            p.flying = flying && p.allow_flight;
        }
    }

    fn send_message(&self, player: PlayerId, message: &str) {
        if let Some(p) = self.state.lock().player_mut(player) {
            debug!(target: "uhc::chat", to = %p.name, "{}", message);
            p.messages.push(message.to_string());
        }
    }

    fn broadcast(&self, message: &str) {
        info!(target: "uhc::chat", "📢 {}", message);
        self.state.lock().broadcasts.push(message.to_string());
    }
}

impl Scheduler for Sandbox {
    fn run_after(&self, delay_ticks: u64, task: Task) -> TaskHandle {
        self.state.lock().schedule(delay_ticks, None, task)
    }

    fn run_periodic(&self, initial_delay_ticks: u64, period_ticks: u64, task: Task) -> TaskHandle {
        self.state
            .lock()
            .schedule(initial_delay_ticks, Some(period_ticks), task)
    }

    fn cancel(&self, handle: TaskHandle) -> bool {
        let mut state = self.state.lock();
        let before = state.scheduled.len();
        state.scheduled.retain(|scheduled| scheduled.handle != handle);
        state.scheduled.len() != before
    }
}

impl Display for Sandbox {
    fn register_timer(&self, timer: &Countdown) {
        let mut state = self.state.lock();
        if !state.timers.iter().any(|name| name == timer.name()) {
            state.timers.push(timer.name().to_string());
        }
    }

    fn unregister_timer(&self, name: &str) {
        self.state.lock().timers.retain(|timer| timer != name);
    }

    fn update(&self, snapshot: &ScoreboardSnapshot) {
        self.state.lock().snapshots.push(snapshot.clone());
    }
}

impl EventSink for Sandbox {
    fn emit(&self, event: &UhcEvent) {
        match serde_json::to_string(event) {
            Ok(json) => debug!(target: "uhc::events", "{}", json),
            Err(e) => debug!(target: "uhc::events", error = %e, "unserializable event"),
        }
        self.state.lock().events.push(event.clone());
    }
}

impl TimeSource for Sandbox {
    fn now(&self) -> DateTime<Utc> {
        self.state.lock().now
    }
}

impl SpectatorMode for Sandbox {
    fn set_spectating(&self, player: PlayerId, spectating: bool) {
        if let Some(p) = self.state.lock().player_mut(player) {
            p.spectating = spectating;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_terrain() {
        let sandbox = Sandbox::new();
        let at = |y| sandbox.material_at(Dimension::Overworld, BlockPos::new(3, y, -8));
        assert_eq!(at(GROUND_LEVEL), Material::Grass);
        assert_eq!(at(GROUND_LEVEL - 1), Material::Stone);
        assert_eq!(at(GROUND_LEVEL + 1), Material::Air);
        assert_eq!(sandbox.highest_block_y(3, -8), GROUND_LEVEL);
    }

    #[test]
    fn test_scheduler_orders_and_repeats() {
        let sandbox = Sandbox::new();
        sandbox.run_after(2, Task::EnableDamage);
        let periodic = sandbox.run_periodic(1, 2, Task::TimerTick);

        assert_eq!(sandbox.advance(1), vec![Task::TimerTick]);
        assert_eq!(sandbox.advance(1), vec![Task::EnableDamage]);
        assert_eq!(sandbox.advance(1), vec![Task::TimerTick]);

        assert!(sandbox.cancel(periodic));
        assert!(!sandbox.cancel(periodic));
        assert!(sandbox.advance(10).is_empty());
    }

    #[test]
    fn test_ticks_move_wall_clock() {
        let sandbox = Sandbox::new();
        let before = sandbox.now();
        sandbox.advance(20);
        assert_eq!(sandbox.now() - before, TimeDelta::seconds(1));
    }
}
