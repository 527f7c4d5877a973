// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ats - ATS console
//!
//! Interactive operator console driving the OLC server. This binary is
//! thin wiring: it parses flags, constructs the client subsystem with
//! explicit parameters (no global container), runs the line loop, and
//! executes the exit hook.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod flags;
mod repl;
mod shutdown;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use ats_client::{
    server_process, ChannelFactory, ConsoleInfo, ConsoleOutput, LogStreamer, ServerEndpoint,
    ServerPreparer, ServerSpawnConfig, SessionStub,
};
use ats_core::ClientId;

use crate::flags::Flags;
use crate::repl::Repl;

#[tokio::main]
async fn main() {
    let flags = Flags::parse();
    if let Err(e) = run(flags).await {
        eprintln!("ats: {e:#}");
        std::process::exit(1);
    }
}

async fn run(flags: Flags) -> anyhow::Result<()> {
    let console_dir = console_dir()?;
    std::fs::create_dir_all(&console_dir)
        .with_context(|| format!("creating {}", console_dir.display()))?;

    let log_path = console_dir.join("ats_console.log");
    rotate_log_if_needed(&log_path);
    let _log_guard = setup_logging(&log_path)?;

    let client_id = ClientId::random();
    info!(%client_id, "starting ats console");

    // With USE_NEW_OLC_SERVER each process gets a fresh random free port
    // and a fresh server working directory; nothing is reused.
    let (port, server_working_dir) = if ats_client::env::use_new_olc_server() {
        let dir = console_dir.join("servers").join(client_id.short(8));
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        (pick_free_port()?, Some(dir))
    } else {
        (flags.olc_server_port, None)
    };

    let output = ConsoleOutput::stdio();
    let info = Arc::new(ConsoleInfo::new(
        client_id.clone(),
        flags.xts_root.clone(),
        flags.package_index_url.clone(),
    ));

    let factory = ChannelFactory::new(ServerEndpoint::local(port));

    let binary = server_process::resolve_binary(flags.olc_server_path.as_deref());
    let mut spawn_config = ServerSpawnConfig::new(binary, port);
    spawn_config.working_dir = server_working_dir;

    let preparer = Arc::new(ServerPreparer::new(
        factory.version_stub(),
        factory.control_stub(),
        client_id.clone(),
        spawn_config,
        flags.always_restart_olc_server,
        Arc::clone(&output),
    ));
    let streamer = Arc::new(LogStreamer::new(
        factory.control_stub(),
        Arc::clone(&preparer),
        client_id.clone(),
        flags.min_importance(),
        Arc::clone(&output),
    ));
    let sessions: SessionStub<serde_json::Value> = SessionStub::new(
        factory.session_stub(),
        Arc::clone(&preparer),
        None,
        "AtsSessionPlugin",
    );

    if flags.enable_olc_server && flags.enable_olc_server_log {
        if let Err(e) = streamer.enable(true).await {
            output.stderr_line(&format!("warning: could not enable server log: {e}"));
        }
    }

    let repl = Repl::new(
        Arc::clone(&info),
        sessions,
        streamer,
        factory.version_stub(),
        Arc::clone(&output),
        flags.enable_olc_server,
    );
    let result = repl.run().await;

    if flags.enable_olc_server {
        shutdown::run_exit_hook(&factory.control_stub(), &info, &output).await;
    }
    result
}

/// Console state directory: `ATS_CONSOLE_DIR` > `XDG_STATE_HOME/ats` >
/// `~/.local/state/ats`.
fn console_dir() -> anyhow::Result<PathBuf> {
    if let Ok(dir) = std::env::var("ATS_CONSOLE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("ats"));
    }
    let home = std::env::var("HOME").context("could not determine console state directory")?;
    Ok(PathBuf::from(home).join(".local/state/ats"))
}

/// Bind port 0 and let the kernel pick a free local port.
fn pick_free_port() -> anyhow::Result<u16> {
    let listener =
        std::net::TcpListener::bind(("127.0.0.1", 0)).context("allocating a free port")?;
    Ok(listener.local_addr().context("reading allocated port")?.port())
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep.
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the console log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `ats_console.log` → `.1` → `.2` → `.3`, deleting the oldest.
/// Best-effort: rotation failures are silently ignored so the console
/// still starts.
fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    log_path: &Path,
) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let dir = log_path
        .parent()
        .context("console log path has no parent")?;
    let name = log_path
        .file_name()
        .context("console log path has no file name")?;

    let file_appender = tracing_appender::rolling::never(dir, name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
