// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idempotent server preparation.
//!
//! `prepare()` ensures a usable OLC server exists: reuse a healthy one,
//! optionally restart it, or spawn a fresh process and wait for readiness.
//! The whole state machine runs at most once per preparer; concurrent first
//! callers all observe the outcome of the single winning run, and a failed
//! outcome is sticky.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use ats_core::ClientId;

use crate::error::{ConsoleError, ErrorKind};
use crate::output::ConsoleOutput;
use crate::server_process::{self, ReadyOutcome, ServerSpawnConfig};
use crate::stubs::ControlStub;
use crate::version_probe::{ProbeError, VersionStub};

/// Hard deadline for the spawned server's readiness signal.
const READY_TIMEOUT: Duration = Duration::from_secs(40);

/// Post-kill probe schedule: the old server gets this many chances to die.
const KILL_PROBE_ATTEMPTS: u32 = 10;
const KILL_PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Post-spawn probe schedule: the new server gets this many chances to serve.
const READY_PROBE_ATTEMPTS: u32 = 15;
const READY_PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Cloneable record of a failed preparation, replayed to later callers.
#[derive(Debug, Clone)]
struct PrepareFailure {
    kind: ErrorKind,
    message: String,
}

impl PrepareFailure {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// One-shot server preparation.
pub struct ServerPreparer {
    version: VersionStub,
    control: ControlStub,
    client_id: ClientId,
    spawn_config: ServerSpawnConfig,
    always_restart: bool,
    output: Arc<ConsoleOutput>,
    outcome: OnceCell<Result<(), PrepareFailure>>,
}

impl ServerPreparer {
    pub fn new(
        version: VersionStub,
        control: ControlStub,
        client_id: ClientId,
        spawn_config: ServerSpawnConfig,
        always_restart: bool,
        output: Arc<ConsoleOutput>,
    ) -> Self {
        Self {
            version,
            control,
            client_id,
            spawn_config,
            always_restart,
            output,
            outcome: OnceCell::new(),
        }
    }

    /// Drive the preparation state machine (first call) or replay its
    /// outcome (every later call).
    pub async fn prepare(&self) -> Result<(), ConsoleError> {
        let outcome = self
            .outcome
            .get_or_init(|| self.prepare_inner())
            .await;
        match outcome {
            Ok(()) => Ok(()),
            Err(failure) => Err(ConsoleError::new(failure.kind, failure.message.clone())),
        }
    }

    async fn prepare_inner(&self) -> Result<(), PrepareFailure> {
        match self.version.get_version().await {
            Ok(version) => {
                self.output
                    .stderr_line(&format!("Connected to existing OLC server (version {version})"));
                if !self.always_restart {
                    return Ok(());
                }
                if !self.kill_existing().await {
                    warn!("existing OLC server did not exit; reusing it");
                    self.output
                        .stderr_line("Existing OLC server still alive; reusing it");
                    return Ok(());
                }
            }
            Err(ProbeError::Unavailable(e)) => {
                debug!("no OLC server listening ({e}); spawning one");
            }
            Err(ProbeError::Protocol(e)) => {
                return Err(PrepareFailure::new(
                    ErrorKind::ServerConnect,
                    format!("cannot reach OLC server: {e}"),
                ));
            }
        }

        self.spawn_and_wait().await
    }

    /// Ask the existing server to exit and wait for it to go away.
    ///
    /// Returns true once a version probe fails (the old server is gone),
    /// false if it is still answering after the full schedule.
    async fn kill_existing(&self) -> bool {
        if let Err(e) = self.control.kill_server(&self.client_id).await {
            debug!("kill request failed (ignored): {e}");
        }
        for attempt in 1..=KILL_PROBE_ATTEMPTS {
            tokio::time::sleep(KILL_PROBE_INTERVAL).await;
            match self.version.get_version().await {
                Err(ProbeError::Unavailable(_)) => {
                    debug!(attempt, "old OLC server is gone");
                    return true;
                }
                Ok(_) | Err(ProbeError::Protocol(_)) => {
                    debug!(attempt, "old OLC server still answering");
                }
            }
        }
        false
    }

    async fn spawn_and_wait(&self) -> Result<(), PrepareFailure> {
        let mut server = server_process::spawn(&self.spawn_config, Arc::clone(&self.output))
            .map_err(|e| PrepareFailure::new(e.kind(), e.message().to_string()))?;

        match server.wait_ready(READY_TIMEOUT).await {
            ReadyOutcome::Started => {
                for attempt in 1..=READY_PROBE_ATTEMPTS {
                    match self.version.get_version().await {
                        Ok(version) => {
                            info!(%version, attempt, "OLC server ready");
                            self.output
                                .stderr_line(&format!("OLC server started (version {version})"));
                            return Ok(());
                        }
                        Err(e) => {
                            debug!(attempt, "version service not ready yet: {e}");
                            if attempt < READY_PROBE_ATTEMPTS {
                                tokio::time::sleep(READY_PROBE_INTERVAL).await;
                            }
                        }
                    }
                }
                Err(PrepareFailure::new(
                    ErrorKind::ServerConnect,
                    "OLC server started but its version service never became ready",
                ))
            }
            ReadyOutcome::Exited => {
                server.kill().await;
                Err(PrepareFailure::new(
                    ErrorKind::ServerInitAbort,
                    "OLC server exited before reporting readiness",
                ))
            }
            ReadyOutcome::TimedOut => {
                server.kill().await;
                Err(PrepareFailure::new(
                    ErrorKind::ServerInitTimeout,
                    format!(
                        "OLC server did not report readiness within {}s",
                        READY_TIMEOUT.as_secs()
                    ),
                ))
            }
        }
    }
}

#[cfg(test)]
#[path = "server_preparer_tests.rs"]
mod tests;
