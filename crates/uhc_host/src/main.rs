//! UHC development host
//!
//! Loads the configuration, runs the plugin runtime against the in-memory sandbox
//! world, drives the scheduler on a fixed tick interval and reads admin commands
//! from stdin until a shutdown signal arrives.

mod cli;
mod config;
mod console;
mod signals;

use cli::CliArgs;
use config::{AppConfig, LoggingSettings};
use plugin_uhc::runtime::{self, RuntimeHandle};
use plugin_uhc::sandbox::Sandbox;
use plugin_uhc::{CommandSender, UhcPlugin};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(config: &LoggingSettings) -> anyhow::Result<()> {
    let log_level = config.level.as_str();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_names(true),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_file(false)
                    .with_line_number(false)
                    .with_target(true),
            )
            .try_init()?;
    }

    info!("🔧 Logging initialized with level: {}", log_level);
    Ok(())
}

// ============================================================================
// Application
// ============================================================================

pub struct Application {
    config: AppConfig,
    sandbox: Arc<Sandbox>,
}

impl Application {
    pub async fn new(args: CliArgs) -> anyhow::Result<Self> {
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(tick_interval_ms) = args.tick_interval_ms {
            config.server.tick_interval_ms = tick_interval_ms;
        }
        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }

        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;

        setup_logging(&config.logging)?;

        let sandbox = Arc::new(Sandbox::new());
        for name in &config.sandbox.players {
            sandbox.add_player(name);
        }

        info!(
            "🏔️ UHC host v{} | config: {}",
            env!("CARGO_PKG_VERSION"),
            args.config_path.display()
        );

        Ok(Self { config, sandbox })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let plugin = UhcPlugin::new(self.config.uhc.clone(), self.sandbox.context());
        let (runtime, plugin_task) = runtime::spawn(plugin);

        for [x, z] in &self.config.sandbox.spawns {
            let outcome = runtime
                .execute(CommandSender::Console, format!("spawn add {x} {z}"))
                .await?;
            if !outcome.success {
                warn!("❌ {}", outcome.message);
            }
        }

        info!("📋 Configuration Summary:");
        info!("  ⏱️ Tick interval: {} ms", self.config.server.tick_interval_ms);
        info!("  📺 Episode length: {} min", self.config.uhc.episodes.length_minutes);
        info!("  👥 Players: {}", self.config.sandbox.players.len());
        info!("  📍 Spawn points: {}", self.config.sandbox.spawns.len());

        let ticker = spawn_ticker(
            self.sandbox.clone(),
            runtime.clone(),
            self.config.server.tick_interval_ms,
        );
        let console = spawn_console(self.sandbox.clone(), runtime.clone());

        info!("✅ UHC host is running, type admin commands below");
        info!("🛑 Press Ctrl+C to shut down");

        tokio::select! {
            result = signals::wait_for_shutdown() => {
                result?;
                info!("🛑 Shutdown signal received");
            }
            _ = console => {
                info!("🛑 Console closed");
            }
        }

        ticker.abort();
        if runtime.shutdown().await.is_err() {
            warn!("runtime already stopped");
        }
        let plugin = plugin_task.await?;
        let snapshot = plugin.game().snapshot();
        info!(
            phase = %plugin.game().phase(),
            episode = snapshot.episode,
            alive_players = snapshot.alive_players,
            alive_teams = snapshot.alive_teams,
            "👋 UHC host stopped"
        );

        Ok(())
    }
}

/// Advances the sandbox one tick per interval and hands due tasks to the runtime.
fn spawn_ticker(sandbox: Arc<Sandbox>, runtime: RuntimeHandle, interval_ms: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if runtime.deliver(sandbox.advance(1)).await.is_err() {
                break;
            }
        }
    })
}

fn spawn_console(sandbox: Arc<Sandbox>, runtime: RuntimeHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!("❌ Console read failed: {e}");
                    break;
                }
            };

            match console::handle_line(&sandbox, &runtime, &line).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    error!("❌ {e}");
                    break;
                }
            }
        }
    })
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let app = match Application::new(args).await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    };

    if let Err(e) = app.run().await {
        error!("❌ Application error: {e:?}");
        std::process::exit(1);
    }

    // A pending stdin read would otherwise keep the runtime from shutting down.
    std::process::exit(0)
}
