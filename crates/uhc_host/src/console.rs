//! Stdin admin console.
//!
//! Lines are either sandbox controls that simulate player activity (`join`, `quit`,
//! `kill`, `border set`) or admin commands forwarded to the plugin verbatim.

use plugin_uhc::host::Players;
use plugin_uhc::runtime::RuntimeHandle;
use plugin_uhc::sandbox::Sandbox;
use plugin_uhc::{CommandSender, HostEvent};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Join(String),
    Quit(String),
    Kill(String),
    SetBorder(u32),
    Stop,
    Admin(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let command = match words.as_slice() {
            [] => return None,
            ["join", name] => Self::Join(name.to_string()),
            ["quit", name] => Self::Quit(name.to_string()),
            ["kill", name] => Self::Kill(name.to_string()),
            ["border", "set", diameter] => match diameter.parse() {
                Ok(diameter) => Self::SetBorder(diameter),
                Err(_) => Self::Admin(line.trim().to_string()),
            },
            ["stop"] | ["exit"] => Self::Stop,
            _ => Self::Admin(line.trim().to_string()),
        };
        Some(command)
    }
}

/// Runs one console line. Returns false when the console asked to stop.
pub async fn handle_line(
    sandbox: &Sandbox,
    runtime: &RuntimeHandle,
    line: &str,
) -> anyhow::Result<bool> {
    let Some(command) = ConsoleCommand::parse(line) else {
        return Ok(true);
    };

    match command {
        ConsoleCommand::Join(name) => {
            let player = match sandbox.find_by_name(&name) {
                Some(player) => {
                    sandbox.reconnect(player);
                    player
                }
                None => sandbox.add_player(&name),
            };
            runtime.dispatch(HostEvent::PlayerJoined { player }).await?;
            info!(%name, "👋 Player joined");
        }
        ConsoleCommand::Quit(name) => match sandbox.find_by_name(&name) {
            Some(player) => {
                sandbox.disconnect(player);
                runtime.dispatch(HostEvent::PlayerQuit { player }).await?;
                info!(%name, "🚪 Player left");
            }
            None => warn!(%name, "unknown player"),
        },
        ConsoleCommand::Kill(name) => {
            let target = sandbox
                .find_by_name(&name)
                .and_then(|player| sandbox.player_location(player).map(|at| (player, at)));
            match target {
                Some((player, location)) => {
                    runtime
                        .dispatch(HostEvent::PlayerDied { player, location })
                        .await?;
                }
                None => warn!(%name, "unknown player"),
            }
        }
        ConsoleCommand::SetBorder(diameter) => {
            runtime
                .dispatch(HostEvent::BorderChanged { diameter })
                .await?;
            info!(diameter, "🧱 World border changed");
        }
        ConsoleCommand::Stop => return Ok(false),
        ConsoleCommand::Admin(line) => {
            let outcome = runtime.execute(CommandSender::Console, line).await?;
            if outcome.success {
                info!("✅ {}", outcome.message);
            } else {
                warn!(code = outcome.code, "❌ {}", outcome.message);
            }
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugin_uhc::runtime;
    use plugin_uhc::{UhcConfig, UhcPlugin};
    use std::sync::Arc;

    #[test]
    fn test_console_parsing() {
        assert_eq!(ConsoleCommand::parse("   "), None);
        assert_eq!(
            ConsoleCommand::parse("join steve"),
            Some(ConsoleCommand::Join("steve".into()))
        );
        assert_eq!(
            ConsoleCommand::parse("border set 300"),
            Some(ConsoleCommand::SetBorder(300))
        );
        assert_eq!(
            ConsoleCommand::parse(" border warn 300 "),
            Some(ConsoleCommand::Admin("border warn 300".into()))
        );
        assert_eq!(ConsoleCommand::parse("stop"), Some(ConsoleCommand::Stop));
    }

    #[tokio::test]
    async fn test_console_drives_the_plugin() {
        let sandbox = Arc::new(Sandbox::new());
        let plugin = UhcPlugin::new(UhcConfig::default(), sandbox.context());
        let (handle, task) = runtime::spawn(plugin);

        for line in ["join steve", "join alex", "quit alex", "spawn add 0 0"] {
            assert!(handle_line(&sandbox, &handle, line).await.expect("runtime is alive"));
        }
        assert_eq!(sandbox.online().len(), 1);

        assert!(handle_line(&sandbox, &handle, "start")
            .await
            .expect("runtime is alive"));
        assert!(handle_line(&sandbox, &handle, "kill steve")
            .await
            .expect("runtime is alive"));
        let status = handle.status().await.expect("runtime is alive");
        assert_eq!(status.snapshot.alive_players, 0);

        assert!(!handle_line(&sandbox, &handle, "stop")
            .await
            .expect("runtime is alive"));
        handle.shutdown().await.expect("runtime is alive");
        task.await.expect("runtime task completes");
    }
}
