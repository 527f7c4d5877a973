// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the client subsystem.

use std::path::PathBuf;
use std::time::Duration;

// --- Helpers (private) ---

fn parse_bool(var: &str) -> Option<bool> {
    std::env::var(var)
        .ok()
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true"))
}

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

// --- Server selection ---

/// Each console process gets a fresh random free port and a fresh server
/// working directory, never reusing server resources.
pub fn use_new_olc_server() -> bool {
    parse_bool("USE_NEW_OLC_SERVER").unwrap_or(false)
}

/// Passed through to the spawned server as `--use_tf_retry=<bool>`.
pub fn use_tf_retry() -> Option<bool> {
    parse_bool("USE_TF_RETRY")
}

/// Override for the OLC server binary path.
pub fn server_binary() -> Option<PathBuf> {
    std::env::var("ATS_OLC_SERVER_BINARY").ok().map(PathBuf::from)
}

// --- Timeouts ---

/// Timeout for unary RPCs (version, create, get, notify, kill).
pub fn timeout_rpc() -> Duration {
    parse_duration_ms("ATS_TIMEOUT_RPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for establishing a connection to the server.
pub fn timeout_connect() -> Duration {
    parse_duration_ms("ATS_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
