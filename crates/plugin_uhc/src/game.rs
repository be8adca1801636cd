//! Match lifecycle.
//!
//! [`GameManager`] owns every piece of mutable match state: teams, the episode clock,
//! player statuses, spectators, death locations and the spawn pool. All of it is
//! mutated through `&mut self`, so the serialized execution context that owns the
//! manager is the only place state can change.
//!
//! ```text
//! NotStarted ──start──────────────────────────────► Running ◄──resume── Paused
//!     │                                                ▲    ──pause──►
//!     └──start slow──► SlowStartTeleporting ──finalize─┘
//! ```

use crate::clock::{EpisodeShift, MatchClock};
use crate::config::UhcConfig;
use crate::counters::{AliveCounters, CounterSource};
use crate::error::{GameError, GameResult, TeamError};
use crate::events::{EventResponse, HostEvent, UhcEvent};
use crate::host::{HostContext, Task};
use crate::safe_spot::SafeSpotLocator;
use crate::teams::{Team, TeamRegistry};
use crate::types::{
    CommandSender, Difficulty, Dimension, GameMode, Location, MatchPhase, PlayerId,
    PlayerStatus, ScoreboardSnapshot, ShiftReason, TaskHandle, TeamColor, MAX_FOOD_LEVEL,
    MAX_HEALTH, TICKS_PER_SECOND,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Delay before a team is dropped in during a fast start.
pub const FAST_START_DELAY_TICKS: u64 = 10;

/// Length of the damage-immunity window (30 seconds).
pub const DAMAGE_IMMUNITY_TICKS: u64 = 30 * TICKS_PER_SECOND;

/// Time of day forced while waiting for the match.
const LOBBY_TIME: i64 = 6000;

/// Progress of a staggered start.
#[derive(Debug, Clone)]
struct SlowStart {
    requested_by: CommandSender,
    total: usize,
    landed: usize,
    teleport_finished: bool,
}

pub struct GameManager {
    config: UhcConfig,
    host: HostContext,
    locator: SafeSpotLocator,

    teams: TeamRegistry,
    clock: MatchClock,
    counters: AliveCounters,

    phase: MatchPhase,
    statuses: HashMap<PlayerId, PlayerStatus>,
    spectators: HashSet<PlayerId>,
    death_locations: HashMap<PlayerId, Location>,
    spawn_pool: Vec<Location>,

    damage_enabled: bool,
    with_teams: bool,
    slow_start: Option<SlowStart>,
    timer_task: Option<TaskHandle>,
    rng: StdRng,
}

impl GameManager {
    /// Creates a manager in the `NotStarted` phase.
    ///
    /// # Arguments
    ///
    /// * `config` - Resolved plugin configuration, validated by the caller
    /// * `host` - Server capabilities the match acts through
    ///
    /// With `spawns.seed` set, spawn assignment is reproducible.
    pub fn new(config: UhcConfig, host: HostContext) -> Self {
        let rng = match config.spawns.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            locator: SafeSpotLocator::new(host.world.clone()),
            config,
            host,
            teams: TeamRegistry::new(),
            clock: MatchClock::new(),
            counters: AliveCounters::new(),
            phase: MatchPhase::NotStarted,
            statuses: HashMap::new(),
            spectators: HashSet::new(),
            death_locations: HashMap::new(),
            spawn_pool: Vec::new(),
            damage_enabled: false,
            with_teams: true,
            slow_start: None,
            timer_task: None,
            rng,
        }
    }

    // ------------------------------------------------------------------------
    // Environment
    // ------------------------------------------------------------------------

    /// Lenient pre-game world: frozen daytime, clear weather, peaceful.
    pub fn prepare_environment(&self) {
        let world = &self.host.world;
        world.set_game_rule("doDaylightCycle", false);
        world.set_time(LOBBY_TIME);
        world.set_storm(false);
        world.set_difficulty(Difficulty::Peaceful);
    }

    /// Switches the world to match rules. Called once per match start.
    pub fn start_environment(&self) {
        let world = &self.host.world;
        let daylight = &self.config.daylight_cycle;
        world.set_game_rule("doDaylightCycle", daylight.do_cycle);
        world.set_game_rule("keepInventory", false);
        world.set_time(daylight.time);
        world.set_storm(false);
        world.set_difficulty(Difficulty::Hard);
        debug!(do_cycle = daylight.do_cycle, time = daylight.time, "match environment applied");
    }

    // ------------------------------------------------------------------------
    // Start sequence
    // ------------------------------------------------------------------------

    /// Starts the match, instantly or team by team.
    ///
    /// Online players that are not spectators become participants; those without a
    /// team are put in a solo team of their own. Each team then draws a random spawn
    /// point from the pool.
    ///
    /// Every check runs before the first mutation: a failed start leaves teams,
    /// statuses and the spawn pool untouched.
    ///
    /// # Arguments
    ///
    /// * `requested_by` - Who issued the start, credited in the announcements
    /// * `slow` - Teleport teams one by one, `slow_start.delay_between_tp_secs` apart,
    ///   and wait for [`finalize_slow_start`](Self::finalize_slow_start)
    ///
    /// # Errors
    ///
    /// * [`GameError::InvalidStateTransition`] if the match already started
    /// * [`GameError::InsufficientSpawns`] if there are fewer spawn points than teams
    pub fn start(&mut self, requested_by: CommandSender, slow: bool) -> GameResult<()> {
        if self.phase != MatchPhase::NotStarted {
            return Err(GameError::InvalidStateTransition {
                phase: self.phase,
                action: "start the match",
            });
        }

        let online = self.host.players.online();
        let participants: Vec<PlayerId> = online
            .iter()
            .copied()
            .filter(|player| !self.spectators.contains(player))
            .collect();
        let solos: Vec<PlayerId> = participants
            .iter()
            .copied()
            .filter(|player| self.teams.team_of(*player).is_none())
            .collect();

        let team_count = self.teams.len() + solos.len();
        if self.spawn_pool.len() < team_count {
            warn!(
                teams = team_count,
                spawns = self.spawn_pool.len(),
                "❌ Not enough spawn points to start"
            );
            return Err(GameError::InsufficientSpawns {
                teams: team_count,
                spawns: self.spawn_pool.len(),
            });
        }

        self.with_teams = !self.teams.is_empty();

        for player in &online {
            self.host
                .set_spectating(*player, self.spectators.contains(player));
        }

        self.statuses = participants
            .iter()
            .map(|player| (*player, PlayerStatus::Alive))
            .collect();

        for player in solos {
            let name = self.solo_team_name(player);
            self.teams.add_team(name.clone(), TeamColor::White)?;
            self.teams.add_player_to_team(&name, player)?;
        }

        info!(
            teams = self.teams.len(),
            players = self.statuses.len(),
            slow,
            with_teams = self.with_teams,
            "🚀 Starting match"
        );

        let assignments = self.assign_spawns();
        let total = assignments.len();

        if !slow {
            for (i, (team, location)) in assignments.into_iter().enumerate() {
                self.host.scheduler.run_after(
                    FAST_START_DELAY_TICKS,
                    Task::TeamStart {
                        team,
                        location,
                        slow: false,
                        index: i + 1,
                        total,
                        requested_by,
                    },
                );
            }
            self.begin_match(requested_by, false);
            return Ok(());
        }

        self.phase = MatchPhase::SlowStartTeleporting;
        self.slow_start = Some(SlowStart {
            requested_by,
            total,
            landed: 0,
            teleport_finished: false,
        });

        // Shows team and player counts while everyone is still in the lobby.
        self.recompute_counters();
        self.host
            .players
            .broadcast("Teleporting players... Please wait.");

        let delay_secs = self.config.slow_start.delay_between_tp_secs;
        for (i, (team, location)) in assignments.into_iter().enumerate() {
            let index = i + 1;
            self.host.scheduler.run_after(
                TICKS_PER_SECOND
                    .saturating_mul(index as u64)
                    .saturating_mul(delay_secs),
                Task::TeamStart {
                    team,
                    location,
                    slow: true,
                    index,
                    total,
                    requested_by,
                },
            );
        }

        if total == 0 {
            self.complete_slow_start_teleport();
        }

        Ok(())
    }

    /// Finishes a slow start once every team has landed.
    ///
    /// Revokes the flight granted while players were waiting in the air, then begins
    /// the match exactly like a fast start would.
    ///
    /// # Errors
    ///
    /// * [`GameError::InvalidStateTransition`] outside of a slow start
    /// * [`GameError::TeleportInProgress`] while teams are still being teleported
    pub fn finalize_slow_start(&mut self, sender: CommandSender) -> GameResult<()> {
        if self.phase != MatchPhase::SlowStartTeleporting {
            return Err(GameError::InvalidStateTransition {
                phase: self.phase,
                action: "finalize the slow start",
            });
        }
        if !self.slow_start_teleport_finished() {
            return Err(GameError::TeleportInProgress);
        }

        for player in self.host.players.online() {
            self.host.players.set_flying(player, false);
            self.host.players.set_allow_flight(player, false);
        }

        self.slow_start = None;
        self.begin_match(sender, true);
        Ok(())
    }

    /// Completion signal for the staggered teleportation.
    pub fn set_slow_start_teleport_finished(&mut self, finished: bool) {
        if let Some(progress) = self.slow_start.as_mut() {
            progress.teleport_finished = finished;
        }
    }

    pub fn slow_start_teleport_finished(&self) -> bool {
        self.slow_start
            .as_ref()
            .is_some_and(|progress| progress.teleport_finished)
    }

    fn begin_match(&mut self, requested_by: CommandSender, slow: bool) {
        self.start_environment();

        let now = self.host.time.now();
        self.clock.start(
            self.config.episodes.length_minutes,
            self.config.episodes.sync_timer,
            now,
        );

        self.damage_enabled = false;
        self.host
            .scheduler
            .run_after(DAMAGE_IMMUNITY_TICKS, Task::EnableDamage);

        self.stop_timer();
        self.timer_task = Some(self.host.scheduler.run_periodic(
            TICKS_PER_SECOND,
            TICKS_PER_SECOND,
            Task::TimerTick,
        ));

        self.phase = MatchPhase::Running;
        self.host.players.broadcast("--- GO ---");
        info!(by = %self.host.sender_name(requested_by), slow, "🏁 Match running");

        self.host.events.emit(&UhcEvent::MatchStarted {
            requested_by,
            slow,
            teams: self.teams.len(),
            players: self.statuses.len(),
        });
        self.recompute_counters();
    }

    /// Cancels the once-per-second clock task.
    pub fn stop_timer(&mut self) {
        if let Some(handle) = self.timer_task.take() {
            self.host.scheduler.cancel(handle);
        }
    }

    fn assign_spawns(&mut self) -> Vec<(String, Location)> {
        let names: Vec<String> = self
            .teams
            .teams()
            .iter()
            .map(|team| team.name().to_string())
            .collect();

        names
            .into_iter()
            .map(|name| {
                let index = self.rng.gen_range(0..self.spawn_pool.len());
                (name, self.spawn_pool.remove(index))
            })
            .collect()
    }

    fn solo_team_name(&self, player: PlayerId) -> String {
        let base = self.host.display_name(player);
        let base = if base.trim().is_empty() {
            player.to_string()
        } else {
            base
        };

        let mut name = base.clone();
        let mut suffix = 2;
        while self.teams.team(&name).is_some() {
            name = format!("{base} ({suffix})");
            suffix += 1;
        }
        name
    }

    // ------------------------------------------------------------------------
    // Scheduled work
    // ------------------------------------------------------------------------

    /// Runs a task handed back by the scheduler.
    pub fn run_task(&mut self, task: Task) {
        match task {
            Task::TeamStart {
                team,
                location,
                slow,
                index,
                total,
                requested_by,
            } => self.team_start(&team, location, slow, index, total, requested_by),
            Task::EnableDamage => self.enable_damage(),
            Task::TimerTick => self.timer_tick(),
            Task::BorderWarning { .. } => {
                debug!("border warning task routed to the game manager, ignoring");
            }
        }
    }

    fn team_start(
        &mut self,
        team: &str,
        location: Location,
        slow: bool,
        index: usize,
        total: usize,
        requested_by: CommandSender,
    ) {
        let members: Vec<PlayerId> = match self.teams.team(team) {
            Some(team) => team.members().to_vec(),
            None => {
                warn!(%team, "team vanished before its start teleport");
                Vec::new()
            }
        };

        let players = &self.host.players;
        for member in members.into_iter().filter(|m| players.is_online(*m)) {
            players.set_game_mode(member, GameMode::Survival);
            players.set_health(member, MAX_HEALTH);
            players.set_food_level(member, MAX_FOOD_LEVEL);
            players.clear_inventory(member);
            players.set_allow_flight(member, slow);
            players.set_flying(member, slow);

            if !self.host.world.teleport(member, location) {
                warn!(%member, %team, "start teleport refused by host");
            }
        }
        debug!(%team, %location, index, total, "team dropped in");

        if !slow || self.phase != MatchPhase::SlowStartTeleporting {
            return;
        }

        let Some(progress) = self.slow_start.as_mut() else {
            return;
        };
        progress.landed += 1;
        let landed = progress.landed;

        self.host.reply(
            requested_by,
            &format!("Team {team} teleported ({landed}/{total})"),
        );

        if landed >= total {
            self.complete_slow_start_teleport();
        }
    }

    fn complete_slow_start_teleport(&mut self) {
        let Some(progress) = self.slow_start.as_ref() else {
            return;
        };
        let (requested_by, total) = (progress.requested_by, progress.total);

        self.set_slow_start_teleport_finished(true);
        info!(teams = total, "🪂 All teams teleported");
        self.host.reply(
            requested_by,
            "All teams are teleported. Run `start slow go` to start the game.",
        );
        self.host
            .events
            .emit(&UhcEvent::SlowStartTeleportFinished { teams: total });
    }

    fn enable_damage(&mut self) {
        if self.damage_enabled {
            return;
        }
        self.damage_enabled = true;
        info!("🗡️ Immunity ended, damage enabled");
        self.host.events.emit(&UhcEvent::DamageEnabled);
    }

    fn timer_tick(&mut self) {
        let now = self.host.time.now();
        if let Some(shift) = self.clock.tick(now) {
            self.announce_shift(&shift);
        }
        self.recompute_counters();
    }

    fn announce_shift(&self, shift: &EpisodeShift) {
        let message = match &shift.reason {
            ShiftReason::Manual(actor) => format!(
                "-------- End of episode {} [forced by {}] --------",
                shift.ended_episode, actor
            ),
            ShiftReason::TimerExpired => {
                format!("-------- End of episode {} --------", shift.ended_episode)
            }
        };
        self.host.players.broadcast(&message);
        self.host.events.emit(&UhcEvent::EpisodeChanged {
            ended_episode: shift.ended_episode,
            episode: shift.episode,
            reason: shift.reason.clone(),
        });
    }

    // ------------------------------------------------------------------------
    // Match control
    // ------------------------------------------------------------------------

    /// Ends the current episode early and announces the next one.
    ///
    /// # Returns
    ///
    /// The [`EpisodeShift`] that was announced, crediting `sender`.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidStateTransition`] unless the match clock is running.
    pub fn shift_episode(&mut self, sender: CommandSender) -> GameResult<EpisodeShift> {
        let now = self.host.time.now();
        let reason = ShiftReason::Manual(self.host.sender_name(sender));
        let shift = self
            .clock
            .shift_episode(reason, now)
            .ok_or(GameError::InvalidStateTransition {
                phase: self.phase,
                action: "shift the episode",
            })?;

        self.announce_shift(&shift);
        self.recompute_counters();
        Ok(shift)
    }

    /// Freezes the clock and moves the match to `Paused`.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidStateTransition`] unless the match is `Running`.
    pub fn pause(&mut self, sender: CommandSender) -> GameResult<()> {
        if self.phase != MatchPhase::Running {
            return Err(GameError::InvalidStateTransition {
                phase: self.phase,
                action: "pause",
            });
        }

        self.clock.pause(self.host.time.now());
        self.phase = MatchPhase::Paused;
        info!(by = %self.host.sender_name(sender), "⏸️ Match paused");
        self.host.players.broadcast("The game is paused.");
        self.recompute_counters();
        Ok(())
    }

    /// Restarts a paused clock. A synced clock is re-anchored so the pause does not
    /// count against the episode.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidStateTransition`] unless the match is `Paused`.
    pub fn resume(&mut self, sender: CommandSender) -> GameResult<()> {
        if self.phase != MatchPhase::Paused {
            return Err(GameError::InvalidStateTransition {
                phase: self.phase,
                action: "resume",
            });
        }

        self.clock.resume(self.host.time.now());
        self.phase = MatchPhase::Running;
        info!(by = %self.host.sender_name(sender), "▶️ Match resumed");
        self.host.players.broadcast("The game is resumed.");
        self.recompute_counters();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Death and resurrection
    // ------------------------------------------------------------------------

    /// Alive → Dead. Returns false if the player was not alive.
    pub fn mark_dead(&mut self, player: PlayerId) -> bool {
        match self.statuses.get_mut(&player) {
            Some(status) if *status == PlayerStatus::Alive => {
                *status = PlayerStatus::Dead;
                self.recompute_counters();
                true
            }
            _ => false,
        }
    }

    /// Dead → Alive.
    ///
    /// Leaves spectator mode, broadcasts the return and emits
    /// [`UhcEvent::PlayerResurrected`].
    ///
    /// # Returns
    ///
    /// `false` if the player was not dead; nothing is changed in that case.
    pub fn resurrect(&mut self, player: PlayerId) -> bool {
        match self.statuses.get_mut(&player) {
            Some(status) if *status == PlayerStatus::Dead => *status = PlayerStatus::Alive,
            _ => return false,
        }

        self.host.set_spectating(player, false);
        let name = self.host.display_name(player);
        self.host
            .players
            .broadcast(&format!("{name} returned from the dead!"));
        info!(%player, %name, "🧟 Player resurrected");

        self.host
            .events
            .emit(&UhcEvent::PlayerResurrected { player });
        self.recompute_counters();
        true
    }

    pub fn record_death_location(&mut self, player: PlayerId, location: Location) {
        self.death_locations.insert(player, location);
    }

    pub fn clear_death_location(&mut self, player: PlayerId) -> Option<Location> {
        self.death_locations.remove(&player)
    }

    pub fn has_death_location(&self, player: PlayerId) -> bool {
        self.death_locations.contains_key(&player)
    }

    pub fn death_location(&self, player: PlayerId) -> Option<Location> {
        self.death_locations.get(&player).copied()
    }

    /// Safe-teleports a player back to where they died.
    ///
    /// The recorded death location is consumed only when the teleport happened.
    ///
    /// # Arguments
    ///
    /// * `player` - Player to send back
    /// * `force` - Use the death location as-is when no safe spot exists in its column
    ///
    /// # Returns
    ///
    /// Where the player actually landed.
    ///
    /// # Errors
    ///
    /// * [`GameError::NoDeathLocation`] if no death was recorded for the player
    /// * [`GameError::NoSafeSpot`] if nothing safe was found and `force` is off, or the
    ///   host refused the teleport
    pub fn tp_back(&mut self, player: PlayerId, force: bool) -> GameResult<Location> {
        let target = self
            .death_location(player)
            .ok_or(GameError::NoDeathLocation(player))?;

        let landed = self
            .locator
            .safe_teleport(player, target, force)
            .ok_or(GameError::NoSafeSpot(target))?;

        self.clear_death_location(player);
        Ok(landed)
    }

    // ------------------------------------------------------------------------
    // Spectators
    // ------------------------------------------------------------------------

    /// Makes a player a spectator: out of their team and out of the alive count.
    pub fn add_spectator(&mut self, player: PlayerId) {
        if let Some(team) = self.teams.remove_player_from_team(player) {
            debug!(%player, %team, "spectator left team");
        }
        self.statuses.remove(&player);
        self.spectators.insert(player);
        self.recompute_counters();
    }

    /// Only drops the spectator flag; the player has to rejoin a team by hand.
    pub fn remove_spectator(&mut self, player: PlayerId) -> bool {
        self.spectators.remove(&player)
    }

    pub fn is_spectator(&self, player: PlayerId) -> bool {
        self.spectators.contains(&player)
    }

    pub fn spectators(&self) -> &HashSet<PlayerId> {
        &self.spectators
    }

    // ------------------------------------------------------------------------
    // Teams and spawns
    // ------------------------------------------------------------------------

    /// # Errors
    ///
    /// [`GameError::Team`] when the name is empty or already taken.
    pub fn create_team(&mut self, name: &str, color: TeamColor) -> GameResult<()> {
        self.teams.add_team(name, color)?;
        self.recompute_counters();
        Ok(())
    }

    pub fn remove_team(&mut self, name: &str) -> GameResult<Team> {
        let team = self
            .teams
            .remove_team(name)
            .ok_or_else(|| TeamError::NotFound(name.to_string()))?;
        self.recompute_counters();
        Ok(team)
    }

    /// Moves a player into `name`, leaving their previous team.
    pub fn join_team(&mut self, name: &str, player: PlayerId) -> GameResult<()> {
        self.teams.add_player_to_team(name, player)?;
        self.recompute_counters();
        Ok(())
    }

    pub fn leave_team(&mut self, player: PlayerId) -> Option<String> {
        let left = self.teams.remove_player_from_team(player);
        if left.is_some() {
            self.recompute_counters();
        }
        left
    }

    /// Registers a spawn point high above the surface of the given column.
    pub fn add_spawn(&mut self, x: i32, z: i32) -> Location {
        let y = self.host.world.highest_block_y(x, z) + self.config.spawns.height_offset;
        let location = Location::new(Dimension::Overworld, f64::from(x), f64::from(y), f64::from(z));
        self.spawn_pool.push(location);
        debug!(%location, pool = self.spawn_pool.len(), "spawn point added");
        location
    }

    pub fn spawn_pool(&self) -> &[Location] {
        &self.spawn_pool
    }

    // ------------------------------------------------------------------------
    // Host events
    // ------------------------------------------------------------------------

    /// Reacts to a server event.
    ///
    /// # Returns
    ///
    /// [`EventResponse::Cancel`] for damage during the immunity window, otherwise
    /// [`EventResponse::Allow`].
    pub fn handle_event(&mut self, event: &HostEvent) -> EventResponse {
        match event {
            HostEvent::PlayerJoined { player } | HostEvent::PlayerQuit { player } => {
                debug!(%player, "connection change");
                self.recompute_counters();
                EventResponse::Allow
            }
            HostEvent::PlayerDied { player, location } => {
                if self.mark_dead(*player) {
                    self.record_death_location(*player, *location);
                    info!(%player, %location, "💀 Player died");
                    self.host.events.emit(&UhcEvent::PlayerDied {
                        player: *player,
                        location: *location,
                    });
                }
                EventResponse::Allow
            }
            HostEvent::PlayerDamaged { .. } if self.is_damage_immune() => EventResponse::Cancel,
            HostEvent::PlayerDamaged { .. } | HostEvent::BorderChanged { .. } => {
                EventResponse::Allow
            }
        }
    }

    // ------------------------------------------------------------------------
    // Counters and accessors
    // ------------------------------------------------------------------------

    /// Recomputes the alive counters; returns true when the display was updated.
    pub fn recompute_counters(&mut self) -> bool {
        let source = CounterSource {
            statuses: &self.statuses,
            teams: &self.teams,
            players: self.host.players.as_ref(),
            clock: &self.clock,
            running: matches!(self.phase, MatchPhase::Running | MatchPhase::Paused),
            with_teams: self.with_teams,
        };
        self.counters.recompute(&source, self.host.display.as_ref())
    }

    pub fn snapshot(&self) -> ScoreboardSnapshot {
        CounterSource {
            statuses: &self.statuses,
            teams: &self.teams,
            players: self.host.players.as_ref(),
            clock: &self.clock,
            running: self.is_running(),
            with_teams: self.with_teams,
        }
        .snapshot()
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// True once the match went live, including while paused.
    pub fn is_running(&self) -> bool {
        matches!(self.phase, MatchPhase::Running | MatchPhase::Paused)
    }

    pub fn is_damage_enabled(&self) -> bool {
        self.damage_enabled
    }

    fn is_damage_immune(&self) -> bool {
        !self.damage_enabled || self.phase != MatchPhase::Running
    }

    pub fn is_with_teams(&self) -> bool {
        self.with_teams
    }

    pub fn status(&self, player: PlayerId) -> Option<PlayerStatus> {
        if self.spectators.contains(&player) {
            return Some(PlayerStatus::Spectator);
        }
        self.statuses.get(&player).copied()
    }

    pub fn is_alive(&self, player: PlayerId) -> bool {
        self.statuses.get(&player) == Some(&PlayerStatus::Alive)
    }

    pub fn alive_players(&self) -> Vec<PlayerId> {
        self.statuses
            .iter()
            .filter(|(_, status)| **status == PlayerStatus::Alive)
            .map(|(player, _)| *player)
            .collect()
    }

    pub fn teams(&self) -> &TeamRegistry {
        &self.teams
    }

    pub fn clock(&self) -> &MatchClock {
        &self.clock
    }

    pub fn counters(&self) -> &AliveCounters {
        &self.counters
    }

    pub fn host(&self) -> &HostContext {
        &self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::Sandbox;
    use std::sync::Arc;

    fn manager(players: &[&str], spawns: usize) -> (Arc<Sandbox>, GameManager, Vec<PlayerId>) {
        let sandbox = Arc::new(Sandbox::new());
        let ids = players.iter().map(|name| sandbox.add_player(name)).collect();
        let mut config = UhcConfig::default();
        config.spawns.seed = Some(7);
        let mut game = GameManager::new(config, sandbox.context());
        for i in 0..spawns {
            game.add_spawn(i as i32 * 100, 0);
        }
        (sandbox, game, ids)
    }

    #[test]
    fn test_teamless_start_creates_solo_teams() {
        let (_sandbox, mut game, ids) = manager(&["alice", "bob"], 2);
        game.start(CommandSender::Console, false).unwrap();

        assert_eq!(game.phase(), MatchPhase::Running);
        assert!(!game.is_with_teams());
        assert_eq!(game.teams().len(), 2);
        assert_eq!(game.teams().team_of(ids[0]).map(Team::name), Some("alice"));
        assert!(game.spawn_pool().is_empty());
    }

    #[test]
    fn test_double_start_is_rejected_without_changes() {
        let (_sandbox, mut game, _ids) = manager(&["alice", "bob"], 4);
        game.start(CommandSender::Console, false).unwrap();
        let snapshot = game.snapshot();
        let pool = game.spawn_pool().len();

        let err = game.start(CommandSender::Console, true).unwrap_err();
        assert!(matches!(err, GameError::InvalidStateTransition { .. }));
        assert_eq!(game.phase(), MatchPhase::Running);
        assert_eq!(game.snapshot(), snapshot);
        assert_eq!(game.spawn_pool().len(), pool);
    }

    #[test]
    fn test_insufficient_spawns_does_not_mutate() {
        let (sandbox, mut game, ids) = manager(&["alice", "bob", "carol"], 2);
        game.create_team("red", TeamColor::Red).unwrap();
        game.join_team("red", ids[0]).unwrap();

        let err = game.start(CommandSender::Console, false).unwrap_err();
        assert_eq!(err, GameError::InsufficientSpawns { teams: 3, spawns: 2 });
        assert_eq!(game.phase(), MatchPhase::NotStarted);
        assert_eq!(game.teams().len(), 1);
        assert_eq!(game.status(ids[1]), None);
        assert_eq!(game.spawn_pool().len(), 2);
        assert!(sandbox.pending_tasks().is_empty());
    }

    #[test]
    fn test_spectators_are_left_out() {
        let (_sandbox, mut game, ids) = manager(&["alice", "bob"], 2);
        game.add_spectator(ids[1]);
        game.start(CommandSender::Console, false).unwrap();

        assert_eq!(game.alive_players(), vec![ids[0]]);
        assert_eq!(game.status(ids[1]), Some(PlayerStatus::Spectator));
        assert!(game.teams().team_of(ids[1]).is_none());
    }

    #[test]
    fn test_resurrect_only_dead_players() {
        let (sandbox, mut game, ids) = manager(&["alice", "bob"], 2);
        game.start(CommandSender::Console, false).unwrap();

        assert!(!game.resurrect(ids[0]));
        assert!(!sandbox.broadcasts().iter().any(|m| m.contains("returned")));

        assert!(game.mark_dead(ids[0]));
        assert!(!game.mark_dead(ids[0]));
        assert!(game.resurrect(ids[0]));
        assert!(!game.resurrect(ids[0]));

        let alive = game.alive_players();
        assert_eq!(alive.iter().filter(|p| **p == ids[0]).count(), 1);
        assert_eq!(
            sandbox
                .broadcasts()
                .iter()
                .filter(|m| m.as_str() == "alice returned from the dead!")
                .count(),
            1
        );
    }

    #[test]
    fn test_spectator_round_trip_leaves_player_teamless() {
        let (_sandbox, mut game, ids) = manager(&["alice"], 1);
        game.create_team("red", TeamColor::Red).unwrap();
        game.join_team("red", ids[0]).unwrap();

        game.add_spectator(ids[0]);
        assert!(game.remove_spectator(ids[0]));

        assert!(!game.is_spectator(ids[0]));
        assert!(game.teams().team_of(ids[0]).is_none());
    }

    #[test]
    fn test_damage_cancelled_during_immunity() {
        let (_sandbox, mut game, ids) = manager(&["alice"], 1);
        let hit = HostEvent::PlayerDamaged { player: ids[0] };
        assert_eq!(game.handle_event(&hit), EventResponse::Cancel);

        game.start(CommandSender::Console, false).unwrap();
        assert_eq!(game.handle_event(&hit), EventResponse::Cancel);

        game.run_task(Task::EnableDamage);
        assert_eq!(game.handle_event(&hit), EventResponse::Allow);
    }

    #[test]
    fn test_death_location_bookkeeping() {
        let (_sandbox, mut game, ids) = manager(&["alice"], 1);
        game.start(CommandSender::Console, false).unwrap();
        let spot = Location::new(Dimension::Overworld, 12.0, 65.0, -3.0);

        game.handle_event(&HostEvent::PlayerDied {
            player: ids[0],
            location: spot,
        });
        assert_eq!(game.status(ids[0]), Some(PlayerStatus::Dead));
        assert_eq!(game.death_location(ids[0]), Some(spot));

        assert!(game.resurrect(ids[0]));
        assert!(game.has_death_location(ids[0]));
        assert_eq!(game.clear_death_location(ids[0]), Some(spot));
        assert!(!game.has_death_location(ids[0]));
    }

    #[test]
    fn test_add_spawn_uses_height_offset() {
        let (_sandbox, mut game, _ids) = manager(&[], 0);
        let spawn = game.add_spawn(40, -40);
        assert_eq!(spawn.block().y, 64 + 120);
        assert_eq!(game.spawn_pool(), &[spawn]);
    }
}
