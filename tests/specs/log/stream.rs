//! Log stream toggling and resilience.

use std::time::Duration;

use ats_client::test_support::FakeOlcServer;
use ats_client::LogStreamer;
use ats_olc::{LogImportance, LogRecord, LogSource};

use crate::prelude::*;

fn record(importance: LogImportance, text: &str) -> LogRecord {
    LogRecord {
        source: LogSource::TestFramework,
        importance,
        formatted: text.to_string(),
    }
}

async fn wait_until_disabled(streamer: &LogStreamer) {
    for _ in 0..300 {
        if !streamer.is_enabled().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for the stream state to clear");
}

/// Scenario: records stream; the server restarts out of band; the stream
/// clears silently; re-enabling opens exactly one fresh stream and records
/// resume.
#[tokio::test]
async fn stream_survives_server_restart_via_reenable() {
    let fake = FakeOlcServer::start().await;
    let console = Console::for_fake(&fake);
    let streamer = console.streamer(LogImportance::Info);

    streamer.enable(true).await.unwrap();
    wait_for("stream to open", || fake.state().open_log_streams() == 1).await;

    fake.state()
        .push_log(vec![record(LogImportance::Info, "before restart")]);
    let capture = console.capture.clone();
    wait_for("first records", move || {
        capture.stderr_text().contains("before restart")
    })
    .await;

    // Out-of-band restart: the server ends every stream.
    fake.state().close_log_streams();
    wait_until_disabled(&streamer).await;

    streamer.enable(true).await.unwrap();
    wait_for("stream to reopen", || fake.state().open_log_streams() == 1).await;
    assert!(fake.state().open_log_streams() <= 1, "no duplicate streams");

    fake.state()
        .push_log(vec![record(LogImportance::Warning, "after restart")]);
    let capture = console.capture.clone();
    wait_for("resumed records", move || {
        capture.stderr_text().contains("after restart")
    })
    .await;
}

/// Idempotence: repeated enables/disables settle on the last requested
/// state with at most one stream at rest.
#[tokio::test]
async fn toggle_is_idempotent() {
    let fake = FakeOlcServer::start().await;
    let console = Console::for_fake(&fake);
    let streamer = console.streamer(LogImportance::Info);

    streamer.enable(false).await.unwrap();
    streamer.enable(true).await.unwrap();
    streamer.enable(true).await.unwrap();
    wait_for("stream to open", || fake.state().open_log_streams() == 1).await;
    assert_eq!(fake.state().log_requests().len(), 1);

    streamer.enable(false).await.unwrap();
    streamer.enable(false).await.unwrap();
    assert!(!streamer.is_enabled().await);
}
