// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed RPC stubs over the shared server channel.
//!
//! Stubs are cheap wrappers; the channel carries the connection state.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;

use ats_core::{ClientId, SessionConfig, SessionDetail, SessionId};
use ats_olc::{Request, Response, SessionNotification, SessionView};

use crate::channel::{ChannelError, ServerChannel};

/// Read timeout for the one-shot `RunSession` RPC, where the server blocks
/// until the session reaches its terminal state.
const RUN_SESSION_TIMEOUT: Duration = Duration::from_secs(60 * 60);

fn reject<T>(response: Response) -> Result<T, ChannelError> {
    match response {
        Response::Error { message } => Err(ChannelError::Rejected(message)),
        _ => Err(ChannelError::UnexpectedResponse),
    }
}

/// Control service stub: kill server, open the log stream.
#[derive(Clone)]
pub struct ControlStub {
    channel: Arc<ServerChannel>,
}

impl ControlStub {
    pub fn new(channel: Arc<ServerChannel>) -> Self {
        Self { channel }
    }

    /// Ask the server to exit. The caller decides whether failures matter.
    pub async fn kill_server(&self, client_id: &ClientId) -> Result<(), ChannelError> {
        let request = Request::KillServer {
            client_id: client_id.clone(),
        };
        match self.channel.call(&request).await? {
            Response::Ok => Ok(()),
            other => reject(other),
        }
    }

    /// Open the dedicated duplex connection for log streaming.
    pub async fn open_log_stream(&self) -> Result<TcpStream, ChannelError> {
        self.channel.open_stream().await
    }
}

/// Session service stub: create/run/get/list/notify.
#[derive(Clone)]
pub struct SessionRpcStub {
    channel: Arc<ServerChannel>,
}

impl SessionRpcStub {
    pub fn new(channel: Arc<ServerChannel>) -> Self {
        Self { channel }
    }

    pub async fn create_session(&self, config: SessionConfig) -> Result<SessionId, ChannelError> {
        match self.channel.call(&Request::CreateSession { config }).await? {
            Response::SessionCreated { session_id } => Ok(session_id),
            other => reject(other),
        }
    }

    /// One-shot run: the server blocks until the session finishes.
    pub async fn run_session(&self, config: SessionConfig) -> Result<SessionDetail, ChannelError> {
        let request = Request::RunSession { config };
        match self
            .channel
            .call_with_read_timeout(&request, RUN_SESSION_TIMEOUT)
            .await?
        {
            Response::Session { detail } => Ok(*detail),
            other => reject(other),
        }
    }

    pub async fn get_session(
        &self,
        session_id: &SessionId,
        view: SessionView,
    ) -> Result<SessionDetail, ChannelError> {
        let request = Request::GetSession {
            session_id: session_id.clone(),
            view,
        };
        match self.channel.call(&request).await? {
            Response::Session { detail } => Ok(*detail),
            other => reject(other),
        }
    }

    pub async fn get_all_sessions(
        &self,
        session_name_regex: Option<&str>,
        session_status_regex: Option<&str>,
    ) -> Result<Vec<SessionDetail>, ChannelError> {
        let request = Request::GetAllSessions {
            session_name_regex: session_name_regex.map(str::to_string),
            session_status_regex: session_status_regex.map(str::to_string),
        };
        match self.channel.call(&request).await? {
            Response::Sessions { sessions } => Ok(sessions),
            other => reject(other),
        }
    }

    /// Returns whether the server accepted the notification.
    pub async fn notify_session(
        &self,
        session_id: &SessionId,
        notification: SessionNotification,
    ) -> Result<bool, ChannelError> {
        let request = Request::NotifySession {
            session_id: session_id.clone(),
            notification,
        };
        match self.channel.call(&request).await? {
            Response::Notified { accepted } => Ok(accepted),
            other => reject(other),
        }
    }
}

#[cfg(test)]
#[path = "stubs_tests.rs"]
mod tests;
