// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OLC server process management.
//!
//! Spawning, readiness detection, and killing of the locally launched
//! server. The server prints a line containing [`STARTUP_TOKEN`] on its
//! stderr once it has bound its port; that line is the only ordering
//! guarantee it offers, so a watcher task echoes stderr to the operator and
//! trips a one-shot latch when the token (or an early exit) is seen.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::env;
use crate::error::{ConsoleError, ErrorKind};
use crate::output::ConsoleOutput;

/// Literal token the server prints on stderr once its RPC port is bound.
pub const STARTUP_TOKEN: &str = "OLC server started";

/// Stable marker prefixed to every echoed server stderr line.
pub const STDERR_ECHO_PREFIX: &str = "[olc-server] ";

/// Default server binary name, looked up next to the console executable.
const SERVER_BINARY_NAME: &str = "ats_olc_server";

/// How the launched server announced itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartupSignal {
    /// The startup token was observed: started successfully.
    Started,
    /// stderr closed before the token: started unsuccessfully.
    Exited,
}

/// Outcome of waiting on the readiness latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    Started,
    Exited,
    TimedOut,
}

/// Flags and paths used to launch the server.
#[derive(Debug, Clone)]
pub struct ServerSpawnConfig {
    pub binary: PathBuf,
    /// Port the server should serve on (`--olc_server_port`).
    pub port: u16,
    /// Fresh working directory (`--olc_server_working_dir`), used when the
    /// console must not reuse server resources.
    pub working_dir: Option<PathBuf>,
    /// Passed through as `--use_tf_retry=<bool>` when set.
    pub use_tf_retry: Option<bool>,
    /// Remaining device-infra-service flags, passed through verbatim.
    pub extra_flags: Vec<String>,
}

impl ServerSpawnConfig {
    pub fn new(binary: PathBuf, port: u16) -> Self {
        Self {
            binary,
            port,
            working_dir: None,
            use_tf_retry: env::use_tf_retry(),
            extra_flags: Vec::new(),
        }
    }

    fn command_args(&self) -> Vec<String> {
        let mut args = vec![format!("--olc_server_port={}", self.port)];
        if let Some(dir) = &self.working_dir {
            args.push(format!("--olc_server_working_dir={}", dir.display()));
        }
        if let Some(retry) = self.use_tf_retry {
            args.push(format!("--use_tf_retry={retry}"));
        }
        args.extend(self.extra_flags.iter().cloned());
        args
    }
}

/// Resolve the server binary: explicit path > `ATS_OLC_SERVER_BINARY` >
/// sibling of the console executable > bare name via PATH.
pub fn resolve_binary(configured: Option<&Path>) -> PathBuf {
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    if let Some(path) = env::server_binary() {
        return path;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join(SERVER_BINARY_NAME);
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from(SERVER_BINARY_NAME)
}

/// A launched server child plus its readiness latch.
pub struct SpawnedServer {
    child: Child,
    ready: oneshot::Receiver<StartupSignal>,
}

impl SpawnedServer {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait on the readiness latch with a hard timeout.
    pub async fn wait_ready(&mut self, timeout: Duration) -> ReadyOutcome {
        match tokio::time::timeout(timeout, &mut self.ready).await {
            Ok(Ok(StartupSignal::Started)) => ReadyOutcome::Started,
            // A dropped sender means the watcher died with the process.
            Ok(Ok(StartupSignal::Exited)) | Ok(Err(_)) => ReadyOutcome::Exited,
            Err(_) => ReadyOutcome::TimedOut,
        }
    }

    /// Kill the child if it is still alive and reap it.
    pub async fn kill(&mut self) {
        if let Err(e) = self.child.start_kill() {
            debug!("kill signal failed (process likely gone): {e}");
        }
        if let Err(e) = self.child.wait().await {
            debug!("failed reaping killed server: {e}");
        }
    }
}

/// Launch the server and install the stderr watcher.
///
/// The binary must already exist on disk; a missing file or exec failure is
/// [`ErrorKind::ServerStart`].
pub fn spawn(
    config: &ServerSpawnConfig,
    output: Arc<ConsoleOutput>,
) -> Result<SpawnedServer, ConsoleError> {
    if !config.binary.is_file() {
        return Err(ConsoleError::new(
            ErrorKind::ServerStart,
            format!("OLC server binary not found: {}", config.binary.display()),
        ));
    }

    let mut child = Command::new(&config.binary)
        .args(config.command_args())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            ConsoleError::with_source(
                ErrorKind::ServerStart,
                format!("failed to launch {}", config.binary.display()),
                e,
            )
        })?;

    info!(pid = ?child.id(), binary = %config.binary.display(), "launched OLC server");

    let (tx, rx) = oneshot::channel();
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(watch_stderr(stderr, tx, output));
    } else {
        // Piped stderr should always be present; treat its absence as an
        // immediately failed startup rather than hanging the latch.
        warn!("spawned server has no stderr handle");
        let _ = tx.send(StartupSignal::Exited);
    }

    Ok(SpawnedServer { child, ready: rx })
}

/// Echo server stderr until the startup token (or EOF), then detach.
async fn watch_stderr(
    stderr: tokio::process::ChildStderr,
    latch: oneshot::Sender<StartupSignal>,
    output: Arc<ConsoleOutput>,
) {
    let mut reader = BufReader::new(stderr);
    let mut line = String::new();

    let signal = loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!("OLC server started unsuccessfully (stderr closed before startup token)");
                break StartupSignal::Exited;
            }
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\r', '\n']);
                output.stderr_line(&format!("{STDERR_ECHO_PREFIX}{trimmed}"));
                if trimmed.contains(STARTUP_TOKEN) {
                    info!("OLC server started successfully");
                    break StartupSignal::Started;
                }
            }
            Err(e) => {
                warn!("error reading OLC server stderr: {e}");
                break StartupSignal::Exited;
            }
        }
    };

    let started = signal == StartupSignal::Started;
    let _ = latch.send(signal);

    // Stop echoing but keep draining so the child never blocks on a full
    // pipe; its output is detached from the operator from here on.
    if started {
        let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
    }
}

#[cfg(test)]
#[path = "server_process_tests.rs"]
mod tests;
