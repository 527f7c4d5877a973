// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-facing error taxonomy.
//!
//! Every failure the subsystem surfaces carries one of the closed
//! [`ErrorKind`] categories. Session-level failures additionally carry the
//! suppressed companions produced by error aggregation.

use std::fmt;

use thiserror::Error;

/// Closed set of client-facing error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Cannot reach an existing server due to a protocol/transport error
    /// (distinct from a clean "nothing is listening").
    ServerConnect,
    /// Spawn failed: binary missing or exec error.
    ServerStart,
    /// Spawned, but the readiness signal was not observed in time.
    ServerInitTimeout,
    /// Spawned process exited before readiness.
    ServerInitAbort,
    CreateSession,
    RunSession,
    GetSessionStatus,
    GetSessionResult,
    ListSessions,
    NotifySession,
    /// Plugin output present but not decodable as the expected type.
    UnpackOutput,
    /// The session's own plugin reported an error.
    PluginError,
    /// The session runner reported an error outside any plugin.
    RunnerError,
    /// A plugin other than ours reported an error; typically informational.
    OtherPluginError,
    /// Session finished without output and without any recorded error.
    NoPluginOutput,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ServerConnect => "server_connect",
            ErrorKind::ServerStart => "server_start",
            ErrorKind::ServerInitTimeout => "server_init_timeout",
            ErrorKind::ServerInitAbort => "server_init_abort",
            ErrorKind::CreateSession => "create_session",
            ErrorKind::RunSession => "run_session",
            ErrorKind::GetSessionStatus => "get_session_status",
            ErrorKind::GetSessionResult => "get_session_result",
            ErrorKind::ListSessions => "list_sessions",
            ErrorKind::NotifySession => "notify_session",
            ErrorKind::UnpackOutput => "unpack_output",
            ErrorKind::PluginError => "plugin_error",
            ErrorKind::RunnerError => "runner_error",
            ErrorKind::OtherPluginError => "other_plugin_error",
            ErrorKind::NoPluginOutput => "no_plugin_output",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error surfaced to the operator or a calling command.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct ConsoleError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    suppressed: Vec<ConsoleError>,
}

impl ConsoleError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            suppressed: Vec::new(),
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
            suppressed: Vec::new(),
        }
    }

    /// Attach suppressed companion errors (error aggregation).
    pub fn with_suppressed(mut self, suppressed: Vec<ConsoleError>) -> Self {
        self.suppressed = suppressed;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Companion errors ranked below the primary during aggregation.
    pub fn suppressed(&self) -> &[ConsoleError] {
        &self.suppressed
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
