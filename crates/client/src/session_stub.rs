// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session operations against the OLC server.
//!
//! A [`SessionStub`] is parameterized once at construction over the plugin
//! label and the output payload type `O`. Every session it submits carries
//! exactly one plugin entry; the envelope is built in [`SessionStub::config`]
//! and nowhere else. Blocking runs poll the server on the adaptive schedule
//! in [`crate::poll`]; finished sessions either yield an unpacked output or
//! the aggregated error from [`crate::aggregate`].

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, debug_span, Instrument};

use ats_core::{SessionConfig, SessionDetail, SessionId, SessionStatus, SpanContext};
use ats_olc::{SessionNotification, SessionView};

use crate::aggregate::derive_session_error;
use crate::error::{ConsoleError, ErrorKind};
use crate::poll::poll_interval;
use crate::server_preparer::ServerPreparer;
use crate::stubs::SessionRpcStub;

/// Label used when the caller does not provide one.
pub const DEFAULT_PLUGIN_LABEL: &str = "ats_session_plugin";

/// Typed session client bound to one plugin label and output type.
pub struct SessionStub<O> {
    rpc: SessionRpcStub,
    preparer: Arc<ServerPreparer>,
    plugin_label: String,
    plugin_class: String,
    _output: PhantomData<fn() -> O>,
}

impl<O> Clone for SessionStub<O> {
    fn clone(&self) -> Self {
        Self {
            rpc: self.rpc.clone(),
            preparer: Arc::clone(&self.preparer),
            plugin_label: self.plugin_label.clone(),
            plugin_class: self.plugin_class.clone(),
            _output: PhantomData,
        }
    }
}

/// Handle to a session being polled in the background.
pub struct PendingSession<O> {
    session_id: SessionId,
    handle: JoinHandle<Result<O, ConsoleError>>,
}

impl<O> PendingSession<O> {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Stop the polling task promptly.
    ///
    /// The server-side session is untouched; use
    /// [`SessionStub::cancel_session`] to cancel the work itself.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Wait for the session output (or the aggregated failure).
    pub async fn wait(self) -> Result<O, ConsoleError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ConsoleError::new(
                ErrorKind::RunSession,
                format!("session {} polling cancelled", self.session_id),
            )),
            Err(e) => Err(ConsoleError::with_source(
                ErrorKind::RunSession,
                format!("session {} polling task failed", self.session_id),
                e,
            )),
        }
    }
}

impl<O> SessionStub<O>
where
    O: DeserializeOwned + Send + 'static,
{
    /// `plugin_label` defaults to [`DEFAULT_PLUGIN_LABEL`] when `None`.
    pub fn new(
        rpc: SessionRpcStub,
        preparer: Arc<ServerPreparer>,
        plugin_label: Option<String>,
        plugin_class: impl Into<String>,
    ) -> Self {
        Self {
            rpc,
            preparer,
            plugin_label: plugin_label.unwrap_or_else(|| DEFAULT_PLUGIN_LABEL.to_string()),
            plugin_class: plugin_class.into(),
            _output: PhantomData,
        }
    }

    pub fn plugin_label(&self) -> &str {
        &self.plugin_label
    }

    /// The one place session envelopes are built.
    fn config(&self, session_name: &str, payload: Value) -> SessionConfig {
        SessionConfig {
            session_name: session_name.to_string(),
            plugin_label: self.plugin_label.clone(),
            plugin_class: self.plugin_class.clone(),
            payload,
            parent_span: SpanContext::default(),
        }
    }

    /// Submit a session without waiting for it.
    pub async fn create_session(
        &self,
        session_name: &str,
        payload: Value,
    ) -> Result<SessionId, ConsoleError> {
        self.preparer.prepare().await?;
        self.rpc
            .create_session(self.config(session_name, payload))
            .await
            .map_err(|e| {
                ConsoleError::with_source(
                    ErrorKind::CreateSession,
                    format!("failed to create session {session_name}"),
                    e,
                )
            })
    }

    /// Blocking run: submit, poll to completion, return the plugin output.
    pub async fn run_session(&self, session_name: &str, payload: Value) -> Result<O, ConsoleError> {
        let session_id = self.create_session(session_name, payload).await?;
        self.poll_until_finished(&session_id).await?;
        self.fetch_result(&session_id).await
    }

    /// Non-blocking run: submit, then poll on a background task.
    pub async fn run_session_async(
        &self,
        session_name: &str,
        payload: Value,
    ) -> Result<PendingSession<O>, ConsoleError> {
        let session_id = self.create_session(session_name, payload).await?;
        let stub = self.clone();
        let id = session_id.clone();
        let task = async move {
            stub.poll_until_finished(&id).await?;
            stub.fetch_result(&id).await
        };
        let span = debug_span!("get_session", session_id = %session_id);
        let handle = tokio::spawn(task.instrument(span));
        Ok(PendingSession { session_id, handle })
    }

    /// One-shot run via the server's blocking `RunSession` RPC.
    pub async fn run_short_session(
        &self,
        session_name: &str,
        payload: Value,
    ) -> Result<O, ConsoleError> {
        self.preparer.prepare().await?;
        let detail = self
            .rpc
            .run_session(self.config(session_name, payload))
            .await
            .map_err(|e| {
                ConsoleError::with_source(
                    ErrorKind::RunSession,
                    format!("failed to run session {session_name}"),
                    e,
                )
            })?;
        self.process_detail(&detail)
    }

    /// Unpacked outputs of sessions matching the filters.
    ///
    /// Sessions without a present payload under our plugin label are
    /// skipped; the regexes are applied server-side.
    pub async fn get_all_sessions(
        &self,
        session_name_regex: Option<&str>,
        session_status_regex: Option<&str>,
    ) -> Result<Vec<O>, ConsoleError> {
        self.preparer.prepare().await?;
        let sessions = self
            .rpc
            .get_all_sessions(session_name_regex, session_status_regex)
            .await
            .map_err(|e| {
                ConsoleError::with_source(ErrorKind::ListSessions, "failed to list sessions", e)
            })?;

        let mut outputs = Vec::new();
        for detail in &sessions {
            if detail.has_output(&self.plugin_label) {
                outputs.push(self.unpack(detail)?);
            }
        }
        Ok(outputs)
    }

    /// Deliver a notification; returns whether the server accepted it.
    pub async fn notify_session(
        &self,
        session_id: &SessionId,
        notification: SessionNotification,
    ) -> Result<bool, ConsoleError> {
        self.preparer.prepare().await?;
        self.rpc
            .notify_session(session_id, notification)
            .await
            .map_err(|e| {
                ConsoleError::with_source(
                    ErrorKind::NotifySession,
                    format!("failed to notify session {session_id}"),
                    e,
                )
            })
    }

    /// Ask the server-side session to cancel its work.
    pub async fn cancel_session(&self, session_id: &SessionId) -> Result<bool, ConsoleError> {
        self.notify_session(session_id, SessionNotification::Cancel)
            .await
    }

    /// Poll status-only until the session reaches its terminal state.
    async fn poll_until_finished(&self, session_id: &SessionId) -> Result<(), ConsoleError> {
        let mut last_status: Option<SessionStatus> = None;
        let mut attempt: u32 = 1;
        loop {
            let detail = self
                .rpc
                .get_session(session_id, SessionView::Status)
                .await
                .map_err(|e| {
                    ConsoleError::with_source(
                        ErrorKind::GetSessionStatus,
                        format!("failed to poll session {session_id}"),
                        e,
                    )
                })?;

            if last_status != Some(detail.status) {
                debug!(%session_id, status = %detail.status, attempt, "session status changed");
                last_status = Some(detail.status);
            }
            if detail.status.is_terminal() {
                return Ok(());
            }

            tokio::time::sleep(poll_interval(attempt)).await;
            attempt = attempt.saturating_add(1);
        }
    }

    /// Final unmasked fetch once the poller saw `FINISHED`.
    async fn fetch_result(&self, session_id: &SessionId) -> Result<O, ConsoleError> {
        let detail = self
            .rpc
            .get_session(session_id, SessionView::Full)
            .await
            .map_err(|e| {
                ConsoleError::with_source(
                    ErrorKind::GetSessionResult,
                    format!("failed to fetch result of session {session_id}"),
                    e,
                )
            })?;
        self.process_detail(&detail)
    }

    /// Present output wins unconditionally; otherwise aggregate errors.
    fn process_detail(&self, detail: &SessionDetail) -> Result<O, ConsoleError> {
        if detail.has_output(&self.plugin_label) {
            return self.unpack(detail);
        }
        Err(derive_session_error(detail, &self.plugin_label))
    }

    fn unpack(&self, detail: &SessionDetail) -> Result<O, ConsoleError> {
        let payload = detail
            .output(&self.plugin_label)
            .and_then(|o| o.payload.clone())
            .unwrap_or(Value::Null);
        serde_json::from_value(payload).map_err(|e| {
            ConsoleError::with_source(
                ErrorKind::UnpackOutput,
                format!(
                    "plugin output for {} in session {} is not the expected type",
                    self.plugin_label, detail.session_id
                ),
                e,
            )
        })
    }
}

#[cfg(test)]
#[path = "session_stub_tests.rs"]
mod tests;
