//! Admin command surface.
//!
//! Commands arrive as plain text lines from the console or an operator. Each one is
//! parsed into an [`AdminCommand`] and executed against the match, producing a
//! [`CommandOutcome`] with user-facing text and a numeric response code.

use crate::border_warning::WarningScheduler;
use crate::error::{codes, CommandError, CommandResult, GameError};
use crate::game::GameManager;
use crate::types::{CommandSender, PlayerId, PlayerStatus, TeamColor};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

const USAGE: &str = "start [slow] | start slow go | shift | pause | resume | resurrect <player> \
| spec add|remove <player> | team add <name> [color] | team remove <name> \
| team join <name> <player> | team leave <player> | spawn add <x> <z> \
| border warn <diameter> [minutes] | border cancel | tpback <player> [force] | status";

/// A parsed admin command.
///
/// Parsing only checks shape and literal arguments; player names are resolved
/// against the host when the command runs.
///
/// # Examples
///
/// ```
/// use plugin_uhc::AdminCommand;
///
/// let command: AdminCommand = "tpback alice force".parse().unwrap();
/// assert_eq!(
///     command,
///     AdminCommand::TpBack { player: "alice".into(), force: true }
/// );
/// assert!("border warn 500 -3".parse::<AdminCommand>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Start { slow: bool },
    FinalizeSlowStart,
    Shift,
    Pause,
    Resume,
    Resurrect { player: String },
    SpectatorAdd { player: String },
    SpectatorRemove { player: String },
    TeamAdd { name: String, color: TeamColor },
    TeamRemove { name: String },
    TeamJoin { name: String, player: String },
    TeamLeave { player: String },
    SpawnAdd { x: i32, z: i32 },
    /// Warns players outside a future border, optionally counting down `time_left`.
    BorderWarn {
        diameter: u32,
        time_left: Option<TimeDelta>,
    },
    BorderCancel,
    TpBack { player: String, force: bool },
    Status,
}

impl FromStr for AdminCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let command = match words.as_slice() {
            [] => return Err(CommandError::Usage(USAGE)),
            ["start"] => Self::Start { slow: false },
            ["start", "slow"] => Self::Start { slow: true },
            ["start", "slow", "go"] => Self::FinalizeSlowStart,
            ["start", ..] => return Err(CommandError::Usage("start [slow] | start slow go")),
            ["shift"] => Self::Shift,
            ["pause"] => Self::Pause,
            ["resume"] => Self::Resume,
            ["resurrect", player] => Self::Resurrect {
                player: player.to_string(),
            },
            ["resurrect", ..] => return Err(CommandError::Usage("resurrect <player>")),
            ["spec", "add", player] => Self::SpectatorAdd {
                player: player.to_string(),
            },
            ["spec", "remove", player] => Self::SpectatorRemove {
                player: player.to_string(),
            },
            ["spec", ..] => return Err(CommandError::Usage("spec add|remove <player>")),
            ["team", "add", name] => Self::TeamAdd {
                name: name.to_string(),
                color: TeamColor::default(),
            },
            ["team", "add", name, color] => Self::TeamAdd {
                name: name.to_string(),
                color: color
                    .parse()
                    .map_err(|_| CommandError::InvalidColor(color.to_string()))?,
            },
            ["team", "remove", name] => Self::TeamRemove {
                name: name.to_string(),
            },
            ["team", "join", name, player] => Self::TeamJoin {
                name: name.to_string(),
                player: player.to_string(),
            },
            ["team", "leave", player] => Self::TeamLeave {
                player: player.to_string(),
            },
            ["team", ..] => {
                return Err(CommandError::Usage(
                    "team add <name> [color] | team remove <name> | team join <name> <player> | team leave <player>",
                ))
            }
            ["spawn", "add", x, z] => Self::SpawnAdd {
                x: parse_number(x)?,
                z: parse_number(z)?,
            },
            ["spawn", ..] => return Err(CommandError::Usage("spawn add <x> <z>")),
            ["border", "warn", diameter] => Self::BorderWarn {
                diameter: parse_number(diameter)?,
                time_left: None,
            },
            ["border", "warn", diameter, minutes] => Self::BorderWarn {
                diameter: parse_number(diameter)?,
                time_left: Some(parse_minutes(minutes)?),
            },
            ["border", "cancel"] => Self::BorderCancel,
            ["border", ..] => {
                return Err(CommandError::Usage(
                    "border warn <diameter> [minutes] | border cancel",
                ))
            }
            ["tpback", player] => Self::TpBack {
                player: player.to_string(),
                force: false,
            },
            ["tpback", player, "force"] => Self::TpBack {
                player: player.to_string(),
                force: true,
            },
            ["tpback", ..] => return Err(CommandError::Usage("tpback <player> [force]")),
            ["status"] => Self::Status,
            [other, ..] => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn parse_number<T: FromStr>(raw: &str) -> CommandResult<T> {
    raw.parse()
        .map_err(|_| CommandError::InvalidNumber(raw.to_string()))
}

/// Non-negative minute counts that fit in a [`TimeDelta`].
fn parse_minutes(raw: &str) -> CommandResult<TimeDelta> {
    parse_number::<i64>(raw)
        .ok()
        .filter(|minutes| *minutes >= 0)
        .and_then(TimeDelta::try_minutes)
        .ok_or_else(|| CommandError::InvalidNumber(raw.to_string()))
}

/// Feedback for whoever issued a command.
///
/// `code` is [`codes::OK`] on success; failures carry the code of the error that
/// caused them, with [`codes::USAGE`] for anything the parser rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: String,
    pub code: i32,
}

impl CommandOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            code: codes::OK,
        }
    }

    pub fn failure(message: impl Into<String>, code: i32) -> Self {
        Self {
            success: false,
            message: message.into(),
            code,
        }
    }
}

impl From<GameError> for CommandOutcome {
    fn from(err: GameError) -> Self {
        Self::failure(err.to_string(), err.code())
    }
}

impl From<CommandError> for CommandOutcome {
    fn from(err: CommandError) -> Self {
        Self::failure(err.to_string(), err.code())
    }
}

/// Runs a parsed command against the match.
///
/// # Arguments
///
/// * `game` - Match state the command acts on
/// * `warnings` - Border warning scheduler, for `border warn` and `border cancel`
/// * `sender` - Who issued the command, credited in announcements
/// * `command` - The parsed command
///
/// # Returns
///
/// A [`CommandOutcome`]. Failures are reported through it and never abort the
/// caller.
pub fn execute(
    game: &mut GameManager,
    warnings: &mut WarningScheduler,
    sender: CommandSender,
    command: AdminCommand,
) -> CommandOutcome {
    debug!(?command, "executing admin command");
    run(game, warnings, sender, command).unwrap_or_else(|failure| failure)
}

fn run(
    game: &mut GameManager,
    warnings: &mut WarningScheduler,
    sender: CommandSender,
    command: AdminCommand,
) -> Result<CommandOutcome, CommandOutcome> {
    let outcome = match command {
        AdminCommand::Start { slow: false } => {
            game.start(sender, false)?;
            CommandOutcome::ok("Match started.")
        }
        AdminCommand::Start { slow: true } => {
            game.start(sender, true)?;
            CommandOutcome::ok("Slow start in progress, teams are being teleported.")
        }
        AdminCommand::FinalizeSlowStart => {
            game.finalize_slow_start(sender)?;
            CommandOutcome::ok("Match started.")
        }
        AdminCommand::Shift => {
            let shift = game.shift_episode(sender)?;
            CommandOutcome::ok(format!("Episode {} started.", shift.episode))
        }
        AdminCommand::Pause => {
            game.pause(sender)?;
            CommandOutcome::ok("Match paused.")
        }
        AdminCommand::Resume => {
            game.resume(sender)?;
            CommandOutcome::ok("Match resumed.")
        }
        AdminCommand::Resurrect { player } => {
            let id = resolve(game, &player)?;
            if !game.resurrect(id) {
                return Err(GameError::NotDead(id).into());
            }
            CommandOutcome::ok(format!("{player} resurrected."))
        }
        AdminCommand::SpectatorAdd { player } => {
            let id = resolve(game, &player)?;
            game.add_spectator(id);
            CommandOutcome::ok(format!("{player} is now a spectator."))
        }
        AdminCommand::SpectatorRemove { player } => {
            let id = resolve(game, &player)?;
            if !game.remove_spectator(id) {
                return Err(CommandOutcome::failure(
                    format!("{player} is not a spectator."),
                    codes::NOT_FOUND,
                ));
            }
            CommandOutcome::ok(format!("{player} is no longer a spectator."))
        }
        AdminCommand::TeamAdd { name, color } => {
            game.create_team(&name, color)?;
            CommandOutcome::ok(format!("Team {name} created."))
        }
        AdminCommand::TeamRemove { name } => {
            game.remove_team(&name)?;
            CommandOutcome::ok(format!("Team {name} removed."))
        }
        AdminCommand::TeamJoin { name, player } => {
            let id = resolve(game, &player)?;
            game.join_team(&name, id)?;
            CommandOutcome::ok(format!("{player} joined team {name}."))
        }
        AdminCommand::TeamLeave { player } => {
            let id = resolve(game, &player)?;
            match game.leave_team(id) {
                Some(team) => CommandOutcome::ok(format!("{player} left team {team}.")),
                None => {
                    return Err(CommandOutcome::failure(
                        format!("{player} is not in a team."),
                        codes::NOT_FOUND,
                    ))
                }
            }
        }
        AdminCommand::SpawnAdd { x, z } => {
            let spawn = game.add_spawn(x, z);
            CommandOutcome::ok(format!(
                "Spawn point added at {spawn} ({} registered).",
                game.spawn_pool().len()
            ))
        }
        AdminCommand::BorderWarn {
            diameter,
            time_left,
        } => {
            warnings.arm(diameter, time_left, Some(sender));
            CommandOutcome::ok(format!("Players outside a {diameter} blocks border will be warned."))
        }
        AdminCommand::BorderCancel => {
            if !warnings.cancel() {
                return Err(CommandOutcome::failure(
                    "No border warning is armed.",
                    codes::NOT_FOUND,
                ));
            }
            CommandOutcome::ok("Border warning cancelled.")
        }
        AdminCommand::TpBack { player, force } => {
            let id = resolve(game, &player)?;
            let landed = game.tp_back(id, force)?;
            CommandOutcome::ok(format!("{player} teleported back to {landed}."))
        }
        AdminCommand::Status => CommandOutcome::ok(status_report(game, warnings)),
    };
    Ok(outcome)
}

fn resolve(game: &GameManager, name: &str) -> Result<PlayerId, CommandOutcome> {
    game.host()
        .players
        .find_by_name(name)
        .ok_or_else(|| CommandError::UnknownPlayer(name.to_string()).into())
}

fn status_report(game: &GameManager, warnings: &WarningScheduler) -> String {
    let clock = game.clock();
    let snapshot = game.snapshot();
    let dead = game
        .teams()
        .teams()
        .iter()
        .flat_map(|team| team.members())
        .filter(|player| game.status(**player) == Some(PlayerStatus::Dead))
        .count();

    let mut report = format!(
        "Match {} | episode {} | {:02}:{:02} left | {} players alive ({} dead) | {} teams alive | damage {}",
        game.phase(),
        clock.episode(),
        clock.minutes_left(),
        clock.seconds_left(),
        snapshot.alive_players,
        dead,
        snapshot.alive_teams,
        if game.is_damage_enabled() { "on" } else { "off" },
    );
    report.push_str(&format!(" | {} spawn points", game.spawn_pool().len()));
    if let Some(diameter) = warnings.diameter() {
        report.push_str(&format!(" | border warning at {diameter}"));
    }
    report
}
