// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use serde_json::json;

use ats_client::test_support::FakeOlcServer;
use ats_client::{
    ChannelFactory, ControlStub, OutputCapture, ServerPreparer, ServerSpawnConfig,
    SessionRpcStub,
};
use ats_core::{ClientId, PluginOutput, SessionDetail, SessionStatus};

use super::*;

fn repl_for(fake: &FakeOlcServer, server_enabled: bool) -> (Repl, OutputCapture) {
    let factory = ChannelFactory::new(fake.endpoint());
    let channel = factory.channel();
    let (output, capture) = ConsoleOutput::captured();
    let client_id = ClientId::new("repl-console");
    let preparer = Arc::new(ServerPreparer::new(
        VersionStub::new(Arc::clone(&channel)),
        ControlStub::new(Arc::clone(&channel)),
        client_id.clone(),
        ServerSpawnConfig::new("/nonexistent".into(), fake.port()),
        false,
        Arc::clone(&output),
    ));
    let streamer = Arc::new(LogStreamer::new(
        ControlStub::new(Arc::clone(&channel)),
        Arc::clone(&preparer),
        client_id.clone(),
        ats_olc::LogImportance::Info,
        Arc::clone(&output),
    ));
    let sessions = SessionStub::new(
        SessionRpcStub::new(Arc::clone(&channel)),
        preparer,
        None,
        "AtsSessionPlugin",
    );
    let info = Arc::new(ConsoleInfo::new(client_id, None, None));
    let repl = Repl::new(
        info,
        sessions,
        streamer,
        VersionStub::new(channel),
        output,
        server_enabled,
    );
    (repl, capture)
}

#[tokio::test]
async fn exit_requests_shutdown_and_is_recorded() {
    let fake = FakeOlcServer::start().await;
    let (repl, _capture) = repl_for(&fake, true);

    repl.handle_line("exit").await;
    assert!(repl.info.should_exit());
    assert_eq!(repl.info.last_command().unwrap().line, "exit");
}

#[tokio::test]
async fn unknown_command_reports_and_continues() {
    let fake = FakeOlcServer::start().await;
    let (repl, capture) = repl_for(&fake, true);

    repl.handle_line("frobnicate now").await;
    assert!(capture.stderr_text().contains("unknown command: frobnicate"));
    assert!(!repl.info.should_exit());
}

#[tokio::test]
async fn empty_line_is_not_recorded() {
    let fake = FakeOlcServer::start().await;
    let (repl, _capture) = repl_for(&fake, true);

    repl.handle_line("").await;
    assert!(repl.info.last_command().is_none());
}

#[tokio::test]
async fn server_version_prints_version() {
    let fake = FakeOlcServer::start().await;
    let (repl, capture) = repl_for(&fake, true);

    repl.handle_line("server version").await;
    assert!(capture
        .stdout_text()
        .contains("OLC server version: 1.0.0"));
}

#[tokio::test]
async fn sessions_lists_matching_outputs() {
    let fake = FakeOlcServer::start().await;
    let mut detail = SessionDetail::default();
    detail.session_name = "run_cts".to_string();
    detail.status = SessionStatus::Running;
    detail.outputs.insert(
        ats_client::DEFAULT_PLUGIN_LABEL.to_string(),
        PluginOutput {
            payload: Some(json!({"modules": 12})),
        },
    );
    fake.state().set_all_sessions(vec![detail]);

    let (repl, capture) = repl_for(&fake, true);
    repl.handle_line("sessions run RUNNING").await;

    let stdout = capture.stdout_text();
    assert!(stdout.contains("\"modules\":12"), "{stdout}");
    assert!(stdout.contains("1 session(s)"), "{stdout}");
}

#[tokio::test]
async fn server_commands_refused_when_disabled() {
    let fake = FakeOlcServer::start().await;
    let (repl, capture) = repl_for(&fake, false);

    repl.handle_line("server version").await;
    assert!(capture
        .stderr_text()
        .contains("OLC server operations are disabled"));
    assert!(capture.stdout_text().is_empty());
}

#[tokio::test]
async fn log_toggle_round_trip() {
    let fake = FakeOlcServer::start().await;
    let (repl, _capture) = repl_for(&fake, true);

    repl.handle_line("log on").await;
    assert!(repl.streamer.is_enabled().await);

    repl.handle_line("log off").await;
    assert!(!repl.streamer.is_enabled().await);
}
