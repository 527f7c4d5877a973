//! Session enumeration with name/status filters.

use ats_client::test_support::FakeOlcServer;
use ats_core::{PluginOutput, SessionDetail, SessionStatus};
use serde_json::json;

use crate::prelude::*;

fn session(name: &str, status: SessionStatus, payload: Option<serde_json::Value>) -> SessionDetail {
    let mut detail = SessionDetail {
        session_name: name.to_string(),
        status,
        ..Default::default()
    };
    detail
        .outputs
        .insert(PLUGIN_LABEL.to_string(), PluginOutput { payload });
    detail
}

/// Scenario: `GetAllSessions("run", "SUBMITTED|RUNNING")` returns sessions
/// whose name matches `run` and whose status matches either state, limited
/// to those with a present plugin output.
#[tokio::test]
async fn filters_apply_and_outputs_unpack() {
    let fake = FakeOlcServer::start().await;
    fake.state().set_all_sessions(vec![
        session(
            "run_cts",
            SessionStatus::Running,
            Some(json!({"name": "run_cts"})),
        ),
        session(
            "run_gts",
            SessionStatus::Submitted,
            Some(json!({"name": "run_gts"})),
        ),
        // Finished: filtered out by status.
        session(
            "run_vts",
            SessionStatus::Finished,
            Some(json!({"name": "run_vts"})),
        ),
        // Name mismatch.
        session(
            "dump_bugreport",
            SessionStatus::Running,
            Some(json!({"name": "dump_bugreport"})),
        ),
        // Matching but no present output.
        session("run_sts", SessionStatus::Running, None),
    ]);

    let console = Console::for_fake(&fake);
    let outputs = console
        .sessions()
        .get_all_sessions(Some("run"), Some("SUBMITTED|RUNNING"))
        .await
        .unwrap();

    let names: Vec<&str> = outputs
        .iter()
        .map(|o| o["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["run_cts", "run_gts"]);
}

#[tokio::test]
async fn no_filters_returns_everything_with_output() {
    let fake = FakeOlcServer::start().await;
    fake.state().set_all_sessions(vec![
        session("a", SessionStatus::Finished, Some(json!({"name": "a"}))),
        session("b", SessionStatus::Running, None),
    ]);

    let console = Console::for_fake(&fake);
    let outputs = console
        .sessions()
        .get_all_sessions(None, None)
        .await
        .unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0]["name"], json!("a"));
}
