//! Integration Tests for Dispatch Flows
//!
//! End-to-end behavior of `ExecutionDispatcher::run` against a mock host and
//! a mock PTY: host launch, embedded fallback, host-only scripts and the
//! force-embedded hint.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use portal_launcher::models::{Action, ExecutionResult, NO_SCRIPT};
use portal_launcher::{DispatchOutcome, ExecutionDispatcher, ExecutionTier};
use std::sync::Arc;
use std::time::Duration;
use test_utils::{dispatcher_with, test_config, MockBridge, MockPtyBackend, RecordingSink};

const RESULT_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_echo_without_host_terminal_runs_embedded() {
    let bridge = Arc::new(MockBridge::new());
    let backend = Arc::new(MockPtyBackend::exiting_with(0).with_output("hi\r\n"));
    let sink = RecordingSink::new();
    let (dispatcher, surfaces) =
        dispatcher_with(test_config(), bridge.clone(), backend.clone(), sink.clone());

    let outcome = dispatcher.run("Say hi", "echo hi").await;
    let mut handle = outcome.into_handle().expect("embedded handle");
    assert_eq!(handle.tier(), ExecutionTier::Embedded);
    assert_eq!(handle.title(), "Say hi");

    let result = handle.wait().await;
    assert_eq!(result, ExecutionResult::exited("Say hi", 0));
    assert_eq!(sink.wait_for(1, RESULT_TIMEOUT).await, vec![result]);

    // Every default candidate was probed once, in order
    assert_eq!(
        bridge.probes(),
        vec!["ptyxis", "konsole", "gnome-terminal", "xterm"]
    );
    assert!(bridge.launches().is_empty());
    assert_eq!(backend.spawn_count(), 1);
    assert_eq!(
        backend.spawns()[0],
        vec!["bash", "--noprofile", "--norc", "-lc", "echo hi"]
    );

    let surface = surfaces.latest().unwrap();
    assert_eq!(surface.title(), "Running: Say hi");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(surface.lines(), vec!["hi"]);
}

#[tokio::test]
async fn test_false_with_xterm_is_fire_and_forget() {
    let bridge = Arc::new(MockBridge::with_installed(&["xterm"]));
    let backend = Arc::new(MockPtyBackend::new());
    let sink = RecordingSink::new();
    let (dispatcher, _) = dispatcher_with(test_config(), bridge.clone(), backend.clone(), sink.clone());

    let outcome = dispatcher.run("Fail", "false").await;
    match outcome {
        DispatchOutcome::HostLaunched { program } => assert_eq!(program, "xterm"),
        other => panic!("Expected host launch, got {:?}", other),
    }

    assert_eq!(
        bridge.launches(),
        vec![vec!["xterm", "-e", "bash", "--noprofile", "--norc", "-lc", "false"]]
    );
    assert_eq!(backend.spawn_count(), 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(sink.results().is_empty(), "host launches never report");
}

#[tokio::test]
async fn test_empty_script_touches_nothing() {
    let bridge = Arc::new(MockBridge::with_installed(&["xterm"]));
    let backend = Arc::new(MockPtyBackend::new());
    let sink = RecordingSink::new();
    let (dispatcher, _) = dispatcher_with(test_config(), bridge.clone(), backend.clone(), sink.clone());

    let outcome = dispatcher.run("Empty", "").await;
    assert!(matches!(outcome, DispatchOutcome::NothingToRun));

    let results = sink.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].exit_code, None);
    assert_eq!(results[0].error.as_deref(), Some(NO_SCRIPT));
    assert!(bridge.probes().is_empty());
    assert!(bridge.launches().is_empty());
    assert_eq!(backend.spawn_count(), 0);
}

#[tokio::test]
async fn test_action_without_script() {
    let sink = RecordingSink::new();
    let (dispatcher, _) = dispatcher_with(
        test_config(),
        Arc::new(MockBridge::new()),
        Arc::new(MockPtyBackend::new()),
        sink.clone(),
    );

    let action: Action = serde_json::from_str(r#"{"title": "Placeholder"}"#).unwrap();
    let outcome = dispatcher.run_action(&action).await;

    assert!(matches!(outcome, DispatchOutcome::NothingToRun));
    assert_eq!(sink.results()[0], ExecutionResult::nothing_to_run("Placeholder"));
}

#[tokio::test]
async fn test_non_zero_exit_is_reported_not_retried() {
    let backend = Arc::new(MockPtyBackend::exiting_with(2));
    let sink = RecordingSink::new();
    let (dispatcher, _) = dispatcher_with(
        test_config(),
        Arc::new(MockBridge::new()),
        backend.clone(),
        sink.clone(),
    );

    let mut handle = dispatcher
        .run_action(&Action::new("Check", "exit 2"))
        .await
        .into_handle()
        .unwrap();

    let result = handle.wait().await;
    assert_eq!(result.exit_code, Some(2));
    assert!(!result.is_success());
    assert_eq!(backend.spawn_count(), 1);
    assert_eq!(sink.wait_for(1, RESULT_TIMEOUT).await.len(), 1);
}

#[tokio::test]
async fn test_embedded_spawn_failure_reports_once() {
    let bridge = Arc::new(MockBridge::new());
    let backend = Arc::new(MockPtyBackend::failing("No such file or directory"));
    let sink = RecordingSink::new();
    let (dispatcher, _) = dispatcher_with(test_config(), bridge, backend.clone(), sink.clone());

    let outcome = dispatcher.run("Broken", "echo hi").await;
    let DispatchOutcome::Failed(result) = outcome else {
        panic!("Expected failure");
    };

    assert_eq!(result.exit_code, None);
    assert!(result.error.as_deref().unwrap().contains("No such file"));
    assert_eq!(backend.spawn_count(), 1);
    assert_eq!(sink.results(), vec![result]);
    assert_eq!(dispatcher.monitor().active_count().await, 0);
}

#[tokio::test]
async fn test_host_only_script_does_not_fall_back() {
    let bridge = Arc::new(MockBridge::new());
    let backend = Arc::new(MockPtyBackend::new());
    let sink = RecordingSink::new();
    let dispatcher = ExecutionDispatcher::builder()
        .config(test_config())
        .bridge(bridge.clone())
        .pty_backend(backend.clone())
        .sink(sink.clone())
        .host_only(|script| script.contains("flatpak update"))
        .build()
        .unwrap();

    let outcome = dispatcher.run("Update apps", "flatpak update -y").await;
    let DispatchOutcome::Failed(result) = outcome else {
        panic!("Expected host-only failure");
    };
    assert!(result.is_launch_failure());
    assert!(result.error.unwrap().contains("No host terminal available"));
    assert_eq!(backend.spawn_count(), 0);
    assert_eq!(sink.count(), 1);

    // Other scripts still fall back
    let outcome = dispatcher.run("List", "ls").await;
    assert_eq!(outcome.tier(), Some(ExecutionTier::Embedded));
    assert_eq!(backend.spawn_count(), 1);
}

#[tokio::test]
async fn test_force_embedded_skips_host_tier() {
    let bridge = Arc::new(MockBridge::with_installed(&["ptyxis", "xterm"]));
    let backend = Arc::new(MockPtyBackend::exiting_with(0));
    let sink = RecordingSink::new();
    let mut config = test_config();
    config.embedded.force = true;
    let (dispatcher, _) = dispatcher_with(config, bridge.clone(), backend.clone(), sink.clone());

    let outcome = dispatcher.run("Uptime", "uptime").await;
    assert_eq!(outcome.tier(), Some(ExecutionTier::Embedded));
    assert!(bridge.probes().is_empty());
    assert!(bridge.launches().is_empty());
    assert_eq!(backend.spawn_count(), 1);
}

#[tokio::test]
async fn test_force_embedded_still_honors_host_only() {
    let bridge = Arc::new(MockBridge::with_installed(&["konsole"]));
    let backend = Arc::new(MockPtyBackend::new());
    let mut config = test_config();
    config.embedded.force = true;
    let dispatcher = ExecutionDispatcher::builder()
        .config(config)
        .bridge(bridge.clone())
        .pty_backend(backend.clone())
        .sink(RecordingSink::new())
        .host_only(|_| true)
        .build()
        .unwrap();

    let outcome = dispatcher.run("Host", "htop").await;
    assert_eq!(outcome.tier(), Some(ExecutionTier::Host));
    assert_eq!(bridge.launched_programs(), vec!["konsole"]);
    assert_eq!(backend.spawn_count(), 0);
}

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let backend = Arc::new(MockPtyBackend::exiting_with(0).with_delay(Duration::from_millis(50)));
    let sink = RecordingSink::new();
    let (dispatcher, surfaces) = dispatcher_with(
        test_config(),
        Arc::new(MockBridge::new()),
        backend.clone(),
        sink.clone(),
    );

    let (first, second) = tokio::join!(
        dispatcher.run("First", "sleep 1"),
        dispatcher.run("Second", "sleep 1")
    );
    let mut first = first.into_handle().unwrap();
    let mut second = second.into_handle().unwrap();
    assert_ne!(first.id(), second.id());

    assert_eq!(first.wait().await.title, "First");
    assert_eq!(second.wait().await.title, "Second");

    let results = sink.wait_for(2, RESULT_TIMEOUT).await;
    assert_eq!(results.len(), 2);
    assert_eq!(backend.spawn_count(), 2);
    assert_eq!(surfaces.surfaces().len(), 2);
}

#[tokio::test]
async fn test_back_to_back_runs_yield_two_results() {
    let sink = RecordingSink::new();
    let (dispatcher, _) = dispatcher_with(
        test_config(),
        Arc::new(MockBridge::new()),
        Arc::new(MockPtyBackend::exiting_with(0)),
        sink.clone(),
    );

    dispatcher.run("Same", "date").await;
    dispatcher.run("Same", "date").await;

    let results = sink.wait_for(2, RESULT_TIMEOUT).await;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.is_success()));
}

#[tokio::test]
async fn test_closing_view_still_delivers_result() {
    let backend = Arc::new(MockPtyBackend::exiting_with(0).with_delay(Duration::from_millis(50)));
    let sink = RecordingSink::new();
    let (dispatcher, _) = dispatcher_with(
        test_config(),
        Arc::new(MockBridge::new()),
        backend,
        sink.clone(),
    );

    let mut handle = dispatcher.run("Long", "sleep 1").await.into_handle().unwrap();
    handle.close_view();
    assert!(handle.send_input(b"q").is_err());
    drop(handle);

    let results = sink.wait_for(1, RESULT_TIMEOUT).await;
    assert_eq!(results, vec![ExecutionResult::exited("Long", 0)]);
}

#[tokio::test]
async fn test_input_reaches_embedded_process() {
    let backend = Arc::new(MockPtyBackend::exiting_with(0).with_delay(Duration::from_millis(50)));
    let (dispatcher, _) = dispatcher_with(
        test_config(),
        Arc::new(MockBridge::new()),
        backend.clone(),
        RecordingSink::new(),
    );

    let handle = dispatcher.run("Ask", "read x").await.into_handle().unwrap();
    handle.send_input(b"yes\n").unwrap();
    assert_eq!(backend.input_of(0), b"yes\n");
}

#[tokio::test]
async fn test_embedded_uses_configured_geometry() {
    let backend = Arc::new(MockPtyBackend::exiting_with(0));
    let mut config = test_config();
    config.embedded.rows = 40;
    config.embedded.cols = 132;
    let (dispatcher, _) = dispatcher_with(
        config,
        Arc::new(MockBridge::new()),
        backend.clone(),
        RecordingSink::new(),
    );

    dispatcher.run("Wide", "ls").await;
    let spawn_config = backend.last_config().unwrap();
    assert_eq!(spawn_config.size.rows, 40);
    assert_eq!(spawn_config.size.cols, 132);
    assert_eq!(spawn_config.working_directory, Some(std::env::temp_dir()));
}
