// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-exit hook.
//!
//! Prints a short summary and sends one best-effort `KillServer`. The hook
//! must not block on outstanding RPCs: the kill is fire-and-forget with a
//! short timeout, after which the process exits regardless.

use std::time::Duration;

use tracing::debug;

use ats_client::{ConsoleInfo, ConsoleOutput, ControlStub};

const KILL_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn run_exit_hook(control: &ControlStub, info: &ConsoleInfo, output: &ConsoleOutput) {
    output.stderr_line(&format!("ats console exiting (client id {})", info.client_id()));
    if let Some(last) = info.last_command() {
        output.stderr_line(&format!("last command: {}", last.line));
    }

    match tokio::time::timeout(KILL_TIMEOUT, control.kill_server(info.client_id())).await {
        Ok(Ok(())) => debug!("kill request delivered"),
        Ok(Err(e)) => debug!("kill request failed (ignored): {e}"),
        Err(_) => debug!("kill request timed out (ignored)"),
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
