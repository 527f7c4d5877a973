// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide console configuration and state.
//!
//! Seeded from the environment and startup flags; mutations are atomic and
//! concurrent reads are allowed. The xTS root directory is optional here:
//! commands that require it report a clear operator error.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use parking_lot::RwLock;

use ats_core::ClientId;

/// Most recent operator command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastCommand {
    pub line: String,
    pub at: SystemTime,
}

/// Process-wide console info.
pub struct ConsoleInfo {
    client_id: ClientId,
    xts_root_dir: Option<PathBuf>,
    package_index_url: Option<String>,
    last_command: RwLock<Option<LastCommand>>,
    should_exit: AtomicBool,
}

impl ConsoleInfo {
    pub fn new(
        client_id: ClientId,
        xts_root_dir: Option<PathBuf>,
        package_index_url: Option<String>,
    ) -> Self {
        Self {
            client_id,
            xts_root_dir,
            package_index_url,
            last_command: RwLock::new(None),
            should_exit: AtomicBool::new(false),
        }
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Root of the installed xTS suite, required by test-discovery commands.
    pub fn xts_root_dir(&self) -> Option<&PathBuf> {
        self.xts_root_dir.as_ref()
    }

    pub fn package_index_url(&self) -> Option<&str> {
        self.package_index_url.as_deref()
    }

    /// Record the line the operator just entered.
    pub fn record_command(&self, line: &str) {
        *self.last_command.write() = Some(LastCommand {
            line: line.to_string(),
            at: SystemTime::now(),
        });
    }

    pub fn last_command(&self) -> Option<LastCommand> {
        self.last_command.read().clone()
    }

    /// Ask the REPL to exit after the current command.
    pub fn request_exit(&self) {
        self.should_exit.store(true, Ordering::SeqCst);
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "console_info_tests.rs"]
mod tests;
