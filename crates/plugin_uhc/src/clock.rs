//! Episode clock and named countdowns.
//!
//! The match clock runs in one of two modes. When synced, the time left is always
//! derived from the wall clock so server lag never stretches an episode. When unsynced,
//! every tick takes exactly one second off the countdown, whatever the wall clock says.

use crate::types::ShiftReason;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Outcome of an episode rollover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeShift {
    pub ended_episode: u32,
    pub episode: u32,
    pub reason: ShiftReason,
}

#[derive(Debug, Clone)]
pub struct MatchClock {
    state: ClockState,
    episode: u32,
    minutes_left: i64,
    seconds_left: i64,
    length_minutes: u32,
    synced: bool,
    episode_start: DateTime<Utc>,
    /// Time already spent in the episode when the clock was paused.
    paused_elapsed: TimeDelta,
}

impl Default for MatchClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchClock {
    pub fn new() -> Self {
        Self {
            state: ClockState::Stopped,
            episode: 0,
            minutes_left: 0,
            seconds_left: 0,
            length_minutes: 0,
            synced: true,
            episode_start: DateTime::<Utc>::UNIX_EPOCH,
            paused_elapsed: TimeDelta::zero(),
        }
    }

    /// Starts episode 1 with a full countdown.
    pub fn start(&mut self, length_minutes: u32, synced: bool, now: DateTime<Utc>) {
        self.state = ClockState::Running;
        self.episode = 1;
        self.length_minutes = length_minutes;
        self.synced = synced;
        self.minutes_left = i64::from(length_minutes);
        self.seconds_left = 0;
        self.episode_start = now;
        self.paused_elapsed = TimeDelta::zero();

        info!(length_minutes, synced, "⏱️ Match clock started");
    }

    /// Returns false when the clock was not running.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != ClockState::Running {
            return false;
        }
        self.paused_elapsed = now - self.episode_start;
        self.state = ClockState::Paused;
        debug!(episode = self.episode, "clock paused");
        true
    }

    /// Returns false when the clock was not paused.
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != ClockState::Paused {
            return false;
        }
        self.episode_start = now - self.paused_elapsed;
        self.paused_elapsed = TimeDelta::zero();
        self.state = ClockState::Running;
        debug!(episode = self.episode, "clock resumed");
        true
    }

    /// Advances the countdown by one second-equivalent.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<EpisodeShift> {
        if self.state != ClockState::Running {
            return None;
        }

        let length_secs = i64::from(self.length_minutes) * 60;

        if self.synced {
            let elapsed_secs = (now - self.episode_start).num_seconds().max(0);
            if elapsed_secs / 60 >= i64::from(self.length_minutes) {
                return self.shift_episode(ShiftReason::TimerExpired, now);
            }
            let remaining = length_secs - elapsed_secs;
            self.minutes_left = remaining / 60;
            self.seconds_left = remaining % 60;
        } else {
            self.seconds_left -= 1;
            if self.seconds_left < 0 {
                self.seconds_left = 59;
                self.minutes_left -= 1;
            }
            // Shifts at 0:00 so a 1-minute episode rolls over after exactly 60 ticks, see test_unsynced_sixty_ticks_shift_once.
            if self.minutes_left < 0 || (self.minutes_left == 0 && self.seconds_left == 0) {
                return self.shift_episode(ShiftReason::TimerExpired, now);
            }
        }

        None
    }

    /// Moves to the next episode. Ignored unless the clock is running.
    pub fn shift_episode(&mut self, reason: ShiftReason, now: DateTime<Utc>) -> Option<EpisodeShift> {
        if self.state != ClockState::Running {
            debug!(state = ?self.state, %reason, "episode shift ignored");
            return None;
        }

        let ended_episode = self.episode;
        self.episode += 1;
        self.minutes_left = i64::from(self.length_minutes);
        self.seconds_left = 0;
        self.episode_start = now;

        info!(ended_episode, episode = self.episode, %reason, "📺 Episode shifted");
        Some(EpisodeShift {
            ended_episode,
            episode: self.episode,
            reason,
        })
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == ClockState::Paused
    }

    pub fn episode(&self) -> u32 {
        self.episode
    }

    pub fn minutes_left(&self) -> i64 {
        self.minutes_left
    }

    pub fn seconds_left(&self) -> i64 {
        self.seconds_left
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn length_minutes(&self) -> u32 {
        self.length_minutes
    }
}

/// A named countdown shown by the timer display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    name: String,
    duration_secs: i64,
    started_at: Option<DateTime<Utc>>,
}

impl Countdown {
    pub fn new(name: impl Into<String>, duration_secs: i64) -> Self {
        Self {
            name: name.into(),
            duration_secs: duration_secs.max(0),
            started_at: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration_secs(&self) -> i64 {
        self.duration_secs
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.started_at = Some(now);
    }

    pub fn stop(&mut self) {
        self.started_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time left, never negative. A stopped countdown reports its full duration.
    pub fn remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        let total = TimeDelta::seconds(self.duration_secs);
        match self.started_at {
            Some(started) => (total - (now - started)).max(TimeDelta::zero()),
            None => total,
        }
    }

    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_running() && self.remaining(now).is_zero()
    }
}
