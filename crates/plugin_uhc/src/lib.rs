//! # UHC Plugin
//!
//! An "Ultra Hardcore" match mode for a voxel-game server: teams are dropped at random
//! spawn points, natural regeneration is off, and the last team standing wins.
//!
//! ## Components
//!
//! - **Team registry** ([`teams`]): membership, at most one team per player
//! - **Safe-spot locator** ([`safe_spot`]): vertical search for a spot a player can stand in
//! - **Match clock** ([`clock`]): episode countdown, synced to wall time or decremented per tick
//! - **Game lifecycle** ([`game`]): start (fast or slow), immunity window, deaths, spectators
//! - **Border warnings** ([`border_warning`]): periodic reminders before the border shrinks
//! - **Alive counters** ([`counters`]): scoreboard figures pushed to the display
//!
//! ## Execution model
//!
//! The host talks to the plugin through the traits in [`host`]. All state lives in
//! [`UhcPlugin`] and is mutated through `&mut self` only; [`runtime::spawn`] moves the
//! plugin into a single tokio task fed by a channel, which gives one serialized
//! execution context no matter how many threads the host runs. Delayed work is
//! submitted to the host scheduler as plain [`Task`] values and comes back through
//! [`UhcPlugin::run_task`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plugin_uhc::{runtime, sandbox::Sandbox, CommandSender, UhcConfig, UhcPlugin};
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), plugin_uhc::RuntimeError> {
//! let sandbox = Arc::new(Sandbox::new());
//! let plugin = UhcPlugin::new(UhcConfig::default(), sandbox.context());
//! let (handle, _task) = runtime::spawn(plugin);
//!
//! let outcome = handle.execute(CommandSender::Console, "spawn add 100 -200").await?;
//! assert!(outcome.success);
//! # Ok(())
//! # }
//! ```

pub mod border_warning;
pub mod clock;
pub mod commands;
pub mod config;
pub mod counters;
pub mod error;
pub mod events;
pub mod game;
pub mod host;
pub mod runtime;
pub mod safe_spot;
pub mod sandbox;
pub mod teams;
pub mod types;

pub use crate::border_warning::WarningScheduler;
pub use crate::clock::{ClockState, Countdown, EpisodeShift, MatchClock};
pub use crate::commands::{AdminCommand, CommandOutcome};
pub use crate::config::UhcConfig;
pub use crate::error::*;
pub use crate::events::{EventResponse, HostEvent, UhcEvent};
pub use crate::game::GameManager;
pub use crate::host::{HostContext, Task};
pub use crate::safe_spot::SafeSpotLocator;
pub use crate::teams::{Team, TeamRegistry};
pub use crate::types::*;

use tracing::{debug, info};

// ============================================================================
// Plugin
// ============================================================================

/// The plugin: every component, assembled once from a typed configuration.
pub struct UhcPlugin {
    name: String,
    version: String,
    config: UhcConfig,
    game: GameManager,
    warnings: WarningScheduler,
}

impl UhcPlugin {
    /// Builds every component from `config`.
    ///
    /// Nothing touches the world until [`on_enable`](Self::on_enable) runs. The
    /// configuration is expected to have passed [`UhcConfig::validate`].
    pub fn new(config: UhcConfig, host: HostContext) -> Self {
        info!("🏔️ UhcPlugin: Creating new instance");
        Self {
            name: "uhc".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            game: GameManager::new(config.clone(), host.clone()),
            warnings: WarningScheduler::new(config.border.clone(), host),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Puts the world in its pre-game state.
    pub fn on_enable(&mut self) {
        info!(
            name = %self.name,
            version = %self.version,
            episode_minutes = self.config.episodes.length_minutes,
            synced = self.config.episodes.sync_timer,
            "🔌 UHC plugin enabled"
        );
        self.game.prepare_environment();
        self.game.recompute_counters();
    }

    /// Stops every periodic task the plugin owns.
    pub fn on_disable(&mut self) {
        self.warnings.cancel();
        self.game.stop_timer();
        info!("🔌 UHC plugin disabled");
    }

    /// Runs a task that came due on the host scheduler.
    pub fn run_task(&mut self, task: Task) {
        match task {
            Task::BorderWarning { generation } => {
                let game = &self.game;
                self.warnings
                    .announce(generation, |player| game.is_alive(player));
            }
            other => self.game.run_task(other),
        }
    }

    /// Forwards a server event to the match.
    ///
    /// A border change also cancels an armed border warning.
    pub fn handle_event(&mut self, event: &HostEvent) -> EventResponse {
        if let HostEvent::BorderChanged { diameter } = event {
            self.warnings.on_border_changed(*diameter);
        }
        self.game.handle_event(event)
    }

    /// Parses and runs one admin command line.
    ///
    /// # Returns
    ///
    /// The [`CommandOutcome`] to show the sender. Malformed lines come back with
    /// [`codes::USAGE`] and leave the match untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use plugin_uhc::{codes, sandbox::Sandbox, CommandSender, UhcConfig, UhcPlugin};
    /// use std::sync::Arc;
    ///
    /// let sandbox = Arc::new(Sandbox::new());
    /// let mut plugin = UhcPlugin::new(UhcConfig::default(), sandbox.context());
    ///
    /// assert!(plugin.execute(CommandSender::Console, "team add wolves red").success);
    /// assert_eq!(plugin.execute(CommandSender::Console, "fly").code, codes::USAGE);
    /// ```
    pub fn execute(&mut self, sender: CommandSender, line: &str) -> CommandOutcome {
        let outcome = match line.parse::<AdminCommand>() {
            Ok(command) => commands::execute(&mut self.game, &mut self.warnings, sender, command),
            Err(err) => err.into(),
        };

        if outcome.success {
            info!(command = %line.trim(), code = outcome.code, "✅ {}", outcome.message);
        } else {
            debug!(command = %line.trim(), code = outcome.code, "❌ {}", outcome.message);
        }
        outcome
    }

    pub fn config(&self) -> &UhcConfig {
        &self.config
    }

    pub fn game(&self) -> &GameManager {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut GameManager {
        &mut self.game
    }

    pub fn warnings(&self) -> &WarningScheduler {
        &self.warnings
    }

    pub fn warnings_mut(&mut self) -> &mut WarningScheduler {
        &mut self.warnings
    }
}
