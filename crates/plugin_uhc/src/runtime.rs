//! Serialized execution context.
//!
//! The plugin is moved into a single tokio task that owns it outright. Everything that
//! touches match state (host events, admin commands, due scheduler tasks) is sent to
//! that task as a [`RuntimeMessage`] and handled one message at a time, so no two
//! mutations can ever interleave.

use crate::commands::CommandOutcome;
use crate::error::RuntimeError;
use crate::events::{EventResponse, HostEvent};
use crate::host::Task;
use crate::types::{CommandSender, MatchPhase, ScoreboardSnapshot};
use crate::UhcPlugin;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Capacity of the runtime inbox.
pub const INBOX_CAPACITY: usize = 1024;

#[derive(Debug)]
pub enum RuntimeMessage {
    Event {
        event: HostEvent,
        reply: oneshot::Sender<EventResponse>,
    },
    Command {
        sender: CommandSender,
        line: String,
        reply: oneshot::Sender<CommandOutcome>,
    },
    /// Tasks that came due on the host scheduler, in firing order.
    Tasks(Vec<Task>),
    Inspect {
        reply: oneshot::Sender<RuntimeStatus>,
    },
    Shutdown,
}

/// Point-in-time view of the match, for hosts that need to poll it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStatus {
    pub phase: MatchPhase,
    pub snapshot: ScoreboardSnapshot,
    pub damage_enabled: bool,
    pub border_warning: Option<u32>,
}

/// Cheap, cloneable sender side of the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    tx: mpsc::Sender<RuntimeMessage>,
}

impl RuntimeHandle {
    /// Dispatches a host event and waits for the plugin's verdict.
    pub async fn dispatch(&self, event: HostEvent) -> Result<EventResponse, RuntimeError> {
        let (reply, response) = oneshot::channel();
        self.send(RuntimeMessage::Event { event, reply }).await?;
        response.await.map_err(|_| RuntimeError::Closed)
    }

    pub async fn execute(
        &self,
        sender: CommandSender,
        line: impl Into<String>,
    ) -> Result<CommandOutcome, RuntimeError> {
        let (reply, response) = oneshot::channel();
        self.send(RuntimeMessage::Command {
            sender,
            line: line.into(),
            reply,
        })
        .await?;
        response.await.map_err(|_| RuntimeError::Closed)
    }

    /// Hands due tasks to the plugin. Does not wait for them to run.
    pub async fn deliver(&self, tasks: Vec<Task>) -> Result<(), RuntimeError> {
        if tasks.is_empty() {
            return Ok(());
        }
        self.send(RuntimeMessage::Tasks(tasks)).await
    }

    pub async fn status(&self) -> Result<RuntimeStatus, RuntimeError> {
        let (reply, response) = oneshot::channel();
        self.send(RuntimeMessage::Inspect { reply }).await?;
        response.await.map_err(|_| RuntimeError::Closed)
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.send(RuntimeMessage::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, message: RuntimeMessage) -> Result<(), RuntimeError> {
        self.tx.send(message).await.map_err(|_| RuntimeError::Closed)
    }
}

/// Moves the plugin into its own task and returns a handle to it.
///
/// The join handle yields the plugin back once the runtime shut down.
pub fn spawn(plugin: UhcPlugin) -> (RuntimeHandle, JoinHandle<UhcPlugin>) {
    let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
    let task = tokio::spawn(plugin_task(plugin, rx));
    (RuntimeHandle { tx }, task)
}

async fn plugin_task(mut plugin: UhcPlugin, mut inbox: mpsc::Receiver<RuntimeMessage>) -> UhcPlugin {
    plugin.on_enable();

    while let Some(message) = inbox.recv().await {
        match message {
            RuntimeMessage::Event { event, reply } => {
                let response = plugin.handle_event(&event);
                let _ = reply.send(response);
            }
            RuntimeMessage::Command {
                sender,
                line,
                reply,
            } => {
                let outcome = plugin.execute(sender, &line);
                let _ = reply.send(outcome);
            }
            RuntimeMessage::Tasks(tasks) => {
                for task in tasks {
                    plugin.run_task(task);
                }
            }
            RuntimeMessage::Inspect { reply } => {
                let _ = reply.send(RuntimeStatus {
                    phase: plugin.game().phase(),
                    snapshot: plugin.game().snapshot(),
                    damage_enabled: plugin.game().is_damage_enabled(),
                    border_warning: plugin.warnings().diameter(),
                });
            }
            RuntimeMessage::Shutdown => {
                debug!("runtime shutdown requested");
                break;
            }
        }
    }

    plugin.on_disable();
    info!("🛑 UHC runtime stopped");
    plugin
}
