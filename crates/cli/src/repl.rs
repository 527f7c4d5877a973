// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal operator line loop.
//!
//! Thin wiring only: the console's real command set (run/list/dump/...)
//! is dispatched elsewhere; this loop records the last command, handles the
//! few built-ins that drive the client subsystem directly, and returns
//! control to the caller on exit or EOF.

use std::sync::Arc;

use tokio::sync::mpsc;

use ats_client::{ConsoleInfo, ConsoleOutput, LogStreamer, SessionStub, VersionStub};

pub struct Repl {
    info: Arc<ConsoleInfo>,
    sessions: SessionStub<serde_json::Value>,
    streamer: Arc<LogStreamer>,
    version: VersionStub,
    output: Arc<ConsoleOutput>,
    server_enabled: bool,
}

impl Repl {
    pub fn new(
        info: Arc<ConsoleInfo>,
        sessions: SessionStub<serde_json::Value>,
        streamer: Arc<LogStreamer>,
        version: VersionStub,
        output: Arc<ConsoleOutput>,
        server_enabled: bool,
    ) -> Self {
        Self {
            info,
            sessions,
            streamer,
            version,
            output,
            server_enabled,
        }
    }

    /// Read lines until `exit`, EOF, or a requested shutdown.
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut lines = spawn_stdin_reader();
        loop {
            if self.info.should_exit() {
                break;
            }
            self.output.prompt("ats> ");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    // Interrupting the read returns control to the loop.
                    self.output.stderr_line("interrupted (type exit to quit)");
                }
                line = lines.recv() => {
                    let Some(line) = line else { break };
                    self.handle_line(line.trim()).await;
                }
            }
        }
        Ok(())
    }

    pub async fn handle_line(&self, line: &str) {
        if line.is_empty() {
            return;
        }
        self.info.record_command(line);

        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["exit"] | ["quit"] => self.info.request_exit(),

            ["server", "version"] => {
                if !self.require_server() {
                    return;
                }
                match self.version.get_version().await {
                    Ok(version) if version.is_legacy() => self
                        .output
                        .stdout_line("OLC server version: unknown (legacy server)"),
                    Ok(version) => self
                        .output
                        .stdout_line(&format!("OLC server version: {version}")),
                    Err(e) => self.output.stderr_line(&format!("error: {e}")),
                }
            }

            ["log", state] if *state == "on" || *state == "off" => {
                if !self.require_server() {
                    return;
                }
                if let Err(e) = self.streamer.enable(*state == "on").await {
                    self.output.stderr_line(&format!("error: {e}"));
                }
            }

            ["sessions", rest @ ..] if rest.len() <= 2 => {
                if !self.require_server() {
                    return;
                }
                let name_regex = rest.first().copied();
                let status_regex = rest.get(1).copied();
                match self.sessions.get_all_sessions(name_regex, status_regex).await {
                    Ok(outputs) => {
                        for output in &outputs {
                            self.output.stdout_line(&output.to_string());
                        }
                        self.output
                            .stdout_line(&format!("{} session(s)", outputs.len()));
                    }
                    Err(e) => self.output.stderr_line(&format!("error: {e}")),
                }
            }

            [command, ..] => self
                .output
                .stderr_line(&format!("unknown command: {command}")),

            [] => {}
        }
    }

    fn require_server(&self) -> bool {
        if !self.server_enabled {
            self.output.stderr_line(
                "OLC server operations are disabled (--enable_ats_console_olc_server=false)",
            );
        }
        self.server_enabled
    }
}

/// Feed stdin lines through a channel so the loop can select on ctrl-c.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(4);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.blocking_send(line.clone()).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
    rx
}

#[cfg(test)]
#[path = "repl_tests.rs"]
mod tests;
