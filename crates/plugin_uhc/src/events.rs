//! Events exchanged with the host server.
//!
//! [`HostEvent`] flows in from the server's own event dispatch, [`UhcEvent`] flows out
//! to anything else listening on the `uhc` plugin namespace.

use crate::types::{CommandSender, Location, PlayerId, ShiftReason};
use serde::{Deserialize, Serialize};

/// Server-side happenings the plugin reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    PlayerJoined { player: PlayerId },
    PlayerQuit { player: PlayerId },
    PlayerDied { player: PlayerId, location: Location },
    PlayerDamaged { player: PlayerId },
    /// The world border was changed by the border management plugin.
    BorderChanged { diameter: u32 },
}

/// What the host should do with the event that was just dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventResponse {
    Allow,
    Cancel,
}

/// Notifications emitted by the plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UhcEvent {
    MatchStarted {
        requested_by: CommandSender,
        slow: bool,
        teams: usize,
        players: usize,
    },
    SlowStartTeleportFinished {
        teams: usize,
    },
    DamageEnabled,
    EpisodeChanged {
        ended_episode: u32,
        episode: u32,
        reason: ShiftReason,
    },
    PlayerDied {
        player: PlayerId,
        location: Location,
    },
    PlayerResurrected {
        player: PlayerId,
    },
    BorderWarningArmed {
        diameter: u32,
        seconds_left: Option<i64>,
    },
    BorderWarningCancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uhc_event_json_shape() {
        let event = UhcEvent::EpisodeChanged {
            ended_episode: 1,
            episode: 2,
            reason: ShiftReason::TimerExpired,
        };
        let json = serde_json::to_value(&event).expect("event serializes");
        assert_eq!(json["event"], "episode_changed");
        assert_eq!(json["episode"], 2);
        assert_eq!(json["reason"], "timer_expired");
    }

    #[test]
    fn test_host_event_from_json() {
        let player = PlayerId::new();
        let raw = serde_json::json!({ "type": "player_quit", "player": player });
        let event: HostEvent = serde_json::from_value(raw).expect("event deserializes");
        assert_eq!(event, HostEvent::PlayerQuit { player });
    }
}
