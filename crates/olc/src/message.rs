// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service messages for the OLC server protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ats_core::{ClientId, ServerVersion, SessionConfig, SessionDetail, SessionId};

use crate::log::{GetLogRequest, LogRecord};

/// Field mask for `GetSession`.
///
/// `Status` asks the server to populate only the session id and status;
/// the poller uses it to minimize bandwidth on the hot path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionView {
    Status,
    #[default]
    Full,
}

/// Typed notification envelope delivered to a running session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionNotification {
    /// Ask the session to cancel its work.
    Cancel,
    /// Plugin-specific notification payload, opaque to the console core.
    Plugin { payload: Value },
}

/// Request from console to the OLC server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    // --- version service ---
    /// Query the server version.
    GetVersion,

    // --- control service ---
    /// Ask the server to exit.
    KillServer { client_id: ClientId },

    /// Start or stop the log stream on this connection.
    ///
    /// Sent repeatedly on a dedicated duplex connection; responses on that
    /// connection are a stream of [`Response::LogRecords`] frames.
    GetLog(GetLogRequest),

    // --- session service ---
    /// Create a session and return immediately with its id.
    CreateSession { config: SessionConfig },

    /// Create a session and block until it reaches its terminal state.
    RunSession { config: SessionConfig },

    /// Fetch a session record, optionally masked to status only.
    GetSession {
        session_id: SessionId,
        #[serde(default)]
        view: SessionView,
    },

    /// Enumerate sessions whose name and status match the given regexes.
    GetAllSessions {
        #[serde(default)]
        session_name_regex: Option<String>,
        #[serde(default)]
        session_status_regex: Option<String>,
    },

    /// Deliver a notification envelope to a session.
    NotifySession {
        session_id: SessionId,
        notification: SessionNotification,
    },
}

/// Response from the OLC server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Version service reply.
    Version { version: ServerVersion },

    /// The remote predates the requested service (legacy server).
    Unimplemented,

    /// Generic acknowledgement (e.g. `KillServer`).
    Ok,

    /// `CreateSession` reply.
    SessionCreated { session_id: SessionId },

    /// `GetSession`/`RunSession` reply.
    Session { detail: Box<SessionDetail> },

    /// `GetAllSessions` reply.
    Sessions { sessions: Vec<SessionDetail> },

    /// `NotifySession` reply: whether the server accepted the notification.
    Notified { accepted: bool },

    /// One batch of streamed log records.
    LogRecords { records: Vec<LogRecord> },

    /// Server-side failure for the request.
    Error { message: String },
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
