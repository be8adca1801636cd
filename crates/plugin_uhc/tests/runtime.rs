//! Runtime actor tests
//!
//! The plugin runs inside its own task; these tests talk to it only through
//! [`RuntimeHandle`] the way a server integration would.

use plugin_uhc::runtime::{self, RuntimeHandle};
use plugin_uhc::sandbox::Sandbox;
use plugin_uhc::{
    CommandSender, EventResponse, HostEvent, MatchPhase, PlayerId, RuntimeError, UhcConfig,
    UhcPlugin,
};
use std::sync::Arc;

fn spawn_runtime(
    players: &[&str],
) -> (
    Arc<Sandbox>,
    RuntimeHandle,
    tokio::task::JoinHandle<UhcPlugin>,
    Vec<PlayerId>,
) {
    let sandbox = Arc::new(Sandbox::new());
    let ids = players.iter().map(|name| sandbox.add_player(name)).collect();
    let mut config = UhcConfig::default();
    config.spawns.seed = Some(1);

    let plugin = UhcPlugin::new(config, sandbox.context());
    let (handle, task) = runtime::spawn(plugin);
    (sandbox, handle, task, ids)
}

async fn drive(sandbox: &Sandbox, handle: &RuntimeHandle, ticks: u64) {
    for _ in 0..ticks {
        handle
            .deliver(sandbox.advance(1))
            .await
            .expect("runtime is alive");
    }
}

#[tokio::test]
async fn test_match_runs_through_the_runtime() {
    let (sandbox, handle, task, ids) = spawn_runtime(&["alice", "bob"]);

    for line in ["spawn add 100 100", "spawn add -100 -100"] {
        let outcome = handle
            .execute(CommandSender::Console, line)
            .await
            .expect("runtime is alive");
        assert!(outcome.success, "{}", outcome.message);
    }
    let outcome = handle
        .execute(CommandSender::Console, "start")
        .await
        .expect("runtime is alive");
    assert!(outcome.success, "{}", outcome.message);

    let hit = HostEvent::PlayerDamaged { player: ids[0] };
    assert_eq!(handle.dispatch(hit.clone()).await, Ok(EventResponse::Cancel));

    drive(&sandbox, &handle, 600).await;
    let status = handle.status().await.expect("runtime is alive");
    assert_eq!(status.phase, MatchPhase::Running);
    assert!(status.damage_enabled);
    assert_eq!(status.snapshot.alive_players, 2);
    assert_eq!(status.snapshot.minutes_left, 19);
    assert_eq!(status.snapshot.seconds_left, 30);
    assert_eq!(status.border_warning, None);
    assert_eq!(handle.dispatch(hit).await, Ok(EventResponse::Allow));

    handle.shutdown().await.expect("runtime is alive");
    let plugin = task.await.expect("runtime task completes");
    assert_eq!(plugin.game().phase(), MatchPhase::Running);
    assert!(sandbox.pending_tasks().iter().all(|task| !matches!(
        task,
        plugin_uhc::Task::TimerTick
    )));
}

#[tokio::test]
async fn test_handle_reports_closed_runtime() {
    let (_sandbox, handle, task, _ids) = spawn_runtime(&[]);
    assert!(!handle.is_closed());

    handle.shutdown().await.expect("runtime is alive");
    task.await.expect("runtime task completes");

    assert!(handle.is_closed());
    assert_eq!(
        handle.execute(CommandSender::Console, "status").await,
        Err(RuntimeError::Closed)
    );
    assert_eq!(handle.status().await.err(), Some(RuntimeError::Closed));
}

#[tokio::test]
async fn test_oversized_warning_duration_keeps_runtime_alive() {
    let (_sandbox, handle, task, _ids) = spawn_runtime(&[]);

    let outcome = handle
        .execute(CommandSender::Console, "border warn 500 999999999999999")
        .await
        .expect("runtime is alive");
    assert!(!outcome.success);
    assert_eq!(outcome.code, plugin_uhc::codes::USAGE);

    let outcome = handle
        .execute(CommandSender::Console, "border warn 500 -1")
        .await
        .expect("runtime is alive");
    assert_eq!(outcome.code, plugin_uhc::codes::USAGE);

    let status = handle.status().await.expect("runtime is alive");
    assert_eq!(status.border_warning, None);
    let outcome = handle
        .execute(CommandSender::Console, "border warn 500 10")
        .await
        .expect("runtime is alive");
    assert!(outcome.success, "{}", outcome.message);

    handle.shutdown().await.expect("runtime is alive");
    task.await.expect("runtime task completes");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_commands_are_serialized() {
    let (_sandbox, handle, task, _ids) = spawn_runtime(&[]);

    let mut joins = Vec::new();
    for i in 0..16 {
        let handle = handle.clone();
        joins.push(tokio::spawn(async move {
            handle
                .execute(CommandSender::Console, format!("team add team{i}"))
                .await
        }));
    }
    for join in joins {
        let outcome = join
            .await
            .expect("sender task completes")
            .expect("runtime is alive");
        assert!(outcome.success, "{}", outcome.message);
    }

    let duplicate = handle
        .execute(CommandSender::Console, "team add team3")
        .await
        .expect("runtime is alive");
    assert!(!duplicate.success);

    handle.shutdown().await.expect("runtime is alive");
    let plugin = task.await.expect("runtime task completes");
    assert_eq!(plugin.game().teams().len(), 16);
}

#[tokio::test]
async fn test_enable_runs_inside_the_runtime() {
    let (sandbox, handle, task, _ids) = spawn_runtime(&["alice"]);

    let status = handle.status().await.expect("runtime is alive");
    assert_eq!(status.phase, MatchPhase::NotStarted);
    assert_eq!(
        sandbox.world_settings().difficulty,
        plugin_uhc::Difficulty::Peaceful
    );

    handle.shutdown().await.expect("runtime is alive");
    task.await.expect("runtime task completes");
}
