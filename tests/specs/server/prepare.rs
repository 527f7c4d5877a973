//! Server preparation scenarios: fresh spawn, reuse, forced restart, and
//! init timeout.

use std::path::PathBuf;

use ats_client::test_support::{FakeOlcServer, SessionScript, VersionReply};
use ats_client::ErrorKind;
use ats_core::{PluginOutput, ServerVersion, SessionDetail};
use serde_json::json;

use crate::prelude::*;

/// Scenario: fresh spawn, happy path. No server is running; `prepare()`
/// spawns the child, the startup line fires the latch, the version probe
/// succeeds, and a short session returns plugin output.
#[tokio::test]
async fn fresh_spawn_then_short_session() {
    let dir = tempfile::tempdir().unwrap();
    let port = free_port().await;
    let marker = dir.path().join("spawned");
    let binary = server_script(dir.path(), &ready_script_body(&marker));
    let console = Console::new(
        ats_client::ServerEndpoint::local(port),
        binary,
        false,
    );

    let revived = serve_after_spawn(port, marker);
    console.preparer.prepare().await.unwrap();

    let stderr = console.capture.stderr_text();
    assert!(stderr.contains("[olc-server] OLC server started"), "{stderr}");
    assert!(stderr.contains("OLC server started (version"), "{stderr}");

    // The port is now served by the fake that took over; run a short
    // session against it end to end.
    let fake = revived.await.unwrap();
    let mut final_detail = SessionDetail::default();
    final_detail.outputs.insert(
        PLUGIN_LABEL.to_string(),
        PluginOutput {
            payload: Some(json!({"devices": ["emulator-5554"], "errors": []})),
        },
    );
    fake.state()
        .queue_session(SessionScript::finished(final_detail));

    let output = console
        .sessions()
        .run_short_session("list_devices_command", json!({"command": "list devices"}))
        .await
        .unwrap();
    assert_eq!(output["errors"], json!([]));
    assert_eq!(output["devices"], json!(["emulator-5554"]));
}

/// Scenario: reuse. A healthy server is reachable and `always-restart` is
/// off, so `prepare()` returns immediately and never spawns.
#[tokio::test]
async fn reuse_running_server() {
    let fake = FakeOlcServer::start().await;
    fake.state()
        .set_version(VersionReply::Version(ServerVersion::new(1, 2, 3)));
    let console = Console::for_fake(&fake);

    console.preparer.prepare().await.unwrap();
    console.preparer.prepare().await.unwrap();

    assert!(fake.state().kill_requests().is_empty());
    let stderr = console.capture.stderr_text();
    assert!(
        stderr.contains("Connected to existing OLC server (version 1.2.3)"),
        "{stderr}"
    );
}

/// Scenario: forced restart. The old server answers two post-kill probes,
/// the third finds it gone, and a fresh child takes over.
#[tokio::test]
async fn forced_restart_replaces_server() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeOlcServer::start().await;
    let port = fake.port();
    fake.state().survive_probes_after_kill(2);

    let marker = dir.path().join("spawned");
    let binary = server_script(dir.path(), &ready_script_body(&marker));
    let console = Console::new(fake.endpoint(), binary, true);

    let _revived = serve_after_spawn(port, marker.clone());
    console.preparer.prepare().await.unwrap();

    assert_eq!(fake.state().kill_requests().len(), 1);
    assert_eq!(
        std::fs::read_to_string(&marker).unwrap().lines().count(),
        1
    );
    let stderr = console.capture.stderr_text();
    assert!(stderr.contains("OLC server started (version"), "{stderr}");
}

/// Scenario: init timeout. The child never prints the start line; at the
/// 40s deadline the preparer kills it and the failure is sticky.
#[tokio::test(start_paused = true)]
async fn init_timeout_is_sticky() {
    let dir = tempfile::tempdir().unwrap();
    let port = free_port().await;
    let binary = server_script(dir.path(), "sleep 120");
    let console = Console::new(
        ats_client::ServerEndpoint::local(port),
        binary,
        false,
    );

    let err = console.preparer.prepare().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerInitTimeout);

    let err = console.preparer.prepare().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerInitTimeout);
}

/// A missing binary is a spawn failure, not a timeout.
#[tokio::test]
async fn missing_binary_is_server_start() {
    let port = free_port().await;
    let console = Console::new(
        ats_client::ServerEndpoint::local(port),
        PathBuf::from("/nonexistent/ats_olc_server"),
        false,
    );

    let err = console.preparer.prepare().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerStart);
}
