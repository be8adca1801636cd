//! Alive-player and alive-team aggregation for the scoreboard.

use crate::clock::MatchClock;
use crate::host::{Display, Players};
use crate::teams::TeamRegistry;
use crate::types::{PlayerId, PlayerStatus, ScoreboardSnapshot};
use std::collections::HashMap;
use tracing::trace;

/// Borrowed view of everything a snapshot is derived from.
pub struct CounterSource<'a> {
    pub statuses: &'a HashMap<PlayerId, PlayerStatus>,
    pub teams: &'a TeamRegistry,
    pub players: &'a dyn Players,
    pub clock: &'a MatchClock,
    pub running: bool,
    pub with_teams: bool,
}

impl CounterSource<'_> {
    pub fn snapshot(&self) -> ScoreboardSnapshot {
        let is_alive =
            |player: PlayerId| self.statuses.get(&player) == Some(&PlayerStatus::Alive);

        ScoreboardSnapshot {
            episode: self.clock.episode(),
            minutes_left: self.clock.minutes_left(),
            seconds_left: self.clock.seconds_left(),
            alive_players: self
                .statuses
                .values()
                .filter(|status| **status == PlayerStatus::Alive)
                .count(),
            alive_teams: self
                .teams
                .alive_teams(|player| is_alive(player) && self.players.is_online(player))
                .len(),
            running: self.running,
            with_teams: self.with_teams,
            timer_paused: self.clock.is_paused(),
        }
    }
}

/// Keeps the last published snapshot so the display only sees real changes.
#[derive(Debug, Default)]
pub struct AliveCounters {
    last: Option<ScoreboardSnapshot>,
}

impl AliveCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the counters and publishes them if anything changed.
    ///
    /// Returns true when the display was updated.
    pub fn recompute(&mut self, source: &CounterSource<'_>, display: &dyn Display) -> bool {
        let snapshot = source.snapshot();
        if self.last.as_ref() == Some(&snapshot) {
            return false;
        }

        trace!(
            alive_players = snapshot.alive_players,
            alive_teams = snapshot.alive_teams,
            episode = snapshot.episode,
            "scoreboard updated"
        );
        display.update(&snapshot);
        self.last = Some(snapshot);
        true
    }

    pub fn last(&self) -> Option<&ScoreboardSnapshot> {
        self.last.as_ref()
    }

    pub fn alive_players(&self) -> usize {
        self.last.as_ref().map_or(0, |s| s.alive_players)
    }

    pub fn alive_teams(&self) -> usize {
        self.last.as_ref().map_or(0, |s| s.alive_teams)
    }
}
