//! Session polling and error-aggregation scenarios.

use std::time::Duration;

use ats_client::test_support::{FakeOlcServer, SessionScript};
use ats_client::ErrorKind;
use ats_core::{PluginError, RunnerError, SessionDetail, SessionStatus};
use serde_json::json;

use crate::prelude::*;

/// Scenario: a long session crosses both poll-interval boundaries.
///
/// 10 polls see SUBMITTED, 250 see RUNNING, the 261st sees FINISHED. On the
/// virtual clock that is exactly 100 sleeps of 400ms plus 160 sleeps of 5s:
/// 840 seconds. The final detail has no output, one own-plugin error and
/// one runner error, so the primary is the plugin error with the runner
/// error suppressed.
#[tokio::test(start_paused = true)]
async fn long_session_polling_and_aggregation() {
    let fake = FakeOlcServer::start().await;

    let mut statuses = Vec::new();
    statuses.extend(std::iter::repeat(SessionStatus::Submitted).take(10));
    statuses.extend(std::iter::repeat(SessionStatus::Running).take(250));
    statuses.push(SessionStatus::Finished);

    let mut final_detail = SessionDetail::default();
    final_detail.plugin_errors.push(PluginError {
        plugin_label: PLUGIN_LABEL.to_string(),
        method_name: "on_session_ended".to_string(),
        message: "module crashed".to_string(),
    });
    final_detail.runner_error = Some(RunnerError {
        message: "runner saw a device drop".to_string(),
    });

    fake.state().queue_session(SessionScript {
        statuses,
        final_detail,
    });

    let console = Console::for_fake(&fake);
    let start = tokio::time::Instant::now();
    let err = console
        .sessions()
        .run_session("run_cts", json!({"command": "run cts"}))
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    assert_eq!(err.kind(), ErrorKind::PluginError);
    assert!(err.message().contains("module crashed"));
    assert_eq!(err.suppressed().len(), 1);
    assert_eq!(err.suppressed()[0].kind(), ErrorKind::RunnerError);

    // 100 x 400ms + 160 x 5s of virtual sleeping.
    assert!(
        elapsed >= Duration::from_secs(840) && elapsed < Duration::from_secs(845),
        "virtual elapsed {elapsed:?}"
    );

    let id = ats_core::SessionId::new("session-1");
    assert_eq!(fake.state().status_polls(&id), 261);
}

/// A finished session with neither output nor errors yields the synthetic
/// no-output failure.
#[tokio::test]
async fn finished_without_anything_is_no_plugin_output() {
    let fake = FakeOlcServer::start().await;
    fake.state()
        .queue_session(SessionScript::finished(SessionDetail::default()));

    let console = Console::for_fake(&fake);
    let err = console
        .sessions()
        .run_short_session("run_cts", json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoPluginOutput);
}

/// Cancelling an async run stops polling promptly and leaves the
/// server-side session alone.
#[tokio::test(start_paused = true)]
async fn async_cancel_stops_polling() {
    let fake = FakeOlcServer::start().await;
    fake.state().queue_session(SessionScript {
        statuses: vec![SessionStatus::Running],
        final_detail: SessionDetail::default(),
    });

    let console = Console::for_fake(&fake);
    let pending = console
        .sessions()
        .run_session_async("run_cts", json!({}))
        .await
        .unwrap();
    let id = pending.session_id().clone();

    tokio::time::sleep(Duration::from_secs(1)).await;
    pending.cancel();
    let err = pending.wait().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RunSession);

    let polls = fake.state().status_polls(&id);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(fake.state().status_polls(&id), polls);
    assert!(fake.state().notifications().is_empty());
}

/// Explicit cancellation goes to the server as a cancel notification.
#[tokio::test]
async fn cancel_session_notifies_server() {
    let fake = FakeOlcServer::start().await;
    fake.state()
        .queue_session(SessionScript::finished(SessionDetail::default()));

    let console = Console::for_fake(&fake);
    let sessions = console.sessions();
    let id = sessions.create_session("run_cts", json!({})).await.unwrap();
    assert!(sessions.cancel_session(&id).await.unwrap());

    let notifications = fake.state().notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].0, id);
}
