// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable in-process fake OLC server for tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`. Speaks the
//! real wire protocol on an ephemeral local port; behaviors (version reply,
//! session scripts, log streams, post-kill lifetime) are driven by the test.
//!
//! Filter semantics are an approximation sufficient for specs: regex
//! arguments are split on `|` and matched as substrings (name) or exact
//! wire names (status).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Notify};
use tracing::debug;

use ats_core::{
    ClientId, ServerVersion, SessionConfig, SessionDetail, SessionId, SessionStatus,
};
use ats_olc::{wire, GetLogRequest, LogRecord, Request, Response, SessionNotification, SessionView};

use crate::channel::ServerEndpoint;

/// How the fake answers `GetVersion`.
#[derive(Debug, Clone)]
pub enum VersionReply {
    Version(ServerVersion),
    Unimplemented,
    Error(String),
}

/// Scripted lifecycle for one session.
///
/// `statuses` are consumed one per status poll (the last value repeats);
/// `final_detail` is returned for unmasked fetches, with the allocated
/// session id patched in.
#[derive(Debug, Clone)]
pub struct SessionScript {
    pub statuses: Vec<SessionStatus>,
    pub final_detail: SessionDetail,
}

impl SessionScript {
    /// A session that is already finished with the given final detail.
    pub fn finished(final_detail: SessionDetail) -> Self {
        Self {
            statuses: vec![SessionStatus::Finished],
            final_detail,
        }
    }
}

struct ActiveSession {
    remaining: Vec<SessionStatus>,
    cursor: usize,
    final_detail: SessionDetail,
    status_polls: AtomicU32,
    config: SessionConfig,
}

impl ActiveSession {
    fn next_status(&mut self) -> SessionStatus {
        let status = self
            .remaining
            .get(self.cursor)
            .or_else(|| self.remaining.last())
            .copied()
            .unwrap_or(SessionStatus::Finished);
        if self.cursor < self.remaining.len() {
            self.cursor += 1;
        }
        status
    }
}

#[derive(Default)]
struct KillState {
    requests: Vec<ClientId>,
    /// When set, the server keeps answering this many version probes after a
    /// kill request, then stops listening.
    survive_probes: Option<u32>,
}

/// Shared, test-driven server state.
pub struct FakeState {
    version: Mutex<VersionReply>,
    kill: Mutex<KillState>,
    scripts: Mutex<Vec<SessionScript>>,
    active: Mutex<Vec<(SessionId, ActiveSession)>>,
    all_sessions: Mutex<Vec<SessionDetail>>,
    notify_accepted: AtomicBool,
    notifications: Mutex<Vec<(SessionId, SessionNotification)>>,
    log_requests: Mutex<Vec<GetLogRequest>>,
    log_senders: Mutex<Vec<tokio::sync::mpsc::UnboundedSender<Vec<LogRecord>>>>,
    log_close: broadcast::Sender<()>,
    shutdown: Notify,
    dead: AtomicBool,
    seq: AtomicU64,
}

impl FakeState {
    fn new() -> Arc<Self> {
        let (log_close, _) = broadcast::channel(4);
        Arc::new(Self {
            version: Mutex::new(VersionReply::Version(ServerVersion::new(1, 0, 0))),
            kill: Mutex::new(KillState::default()),
            scripts: Mutex::new(Vec::new()),
            active: Mutex::new(Vec::new()),
            all_sessions: Mutex::new(Vec::new()),
            notify_accepted: AtomicBool::new(true),
            notifications: Mutex::new(Vec::new()),
            log_requests: Mutex::new(Vec::new()),
            log_senders: Mutex::new(Vec::new()),
            log_close,
            shutdown: Notify::new(),
            dead: AtomicBool::new(false),
            seq: AtomicU64::new(1),
        })
    }

    pub fn set_version(&self, reply: VersionReply) {
        *self.version.lock() = reply;
    }

    /// Keep answering `probes` version probes after `KillServer`, then die.
    pub fn survive_probes_after_kill(&self, probes: u32) {
        self.kill.lock().survive_probes = Some(probes);
    }

    pub fn kill_requests(&self) -> Vec<ClientId> {
        self.kill.lock().requests.clone()
    }

    /// Queue the script for the next created/run session.
    pub fn queue_session(&self, script: SessionScript) {
        self.scripts.lock().push(script);
    }

    /// Sessions reported by `GetAllSessions` before filtering.
    pub fn set_all_sessions(&self, sessions: Vec<SessionDetail>) {
        *self.all_sessions.lock() = sessions;
    }

    pub fn set_notify_accepted(&self, accepted: bool) {
        self.notify_accepted.store(accepted, Ordering::SeqCst);
    }

    pub fn notifications(&self) -> Vec<(SessionId, SessionNotification)> {
        self.notifications.lock().clone()
    }

    /// Number of status polls observed for `session_id`.
    pub fn status_polls(&self, session_id: &SessionId) -> u32 {
        self.active
            .lock()
            .iter()
            .find(|(id, _)| id == session_id)
            .map(|(_, s)| s.status_polls.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Envelope the server received for `session_id`.
    pub fn session_config(&self, session_id: &SessionId) -> Option<SessionConfig> {
        self.active
            .lock()
            .iter()
            .find(|(id, _)| id == session_id)
            .map(|(_, s)| s.config.clone())
    }

    /// `GetLog` requests observed across all stream connections.
    pub fn log_requests(&self) -> Vec<GetLogRequest> {
        self.log_requests.lock().clone()
    }

    /// Number of currently open log streams.
    pub fn open_log_streams(&self) -> usize {
        self.log_senders.lock().len()
    }

    /// Push a batch of records to every open log stream.
    pub fn push_log(&self, records: Vec<LogRecord>) {
        self.log_senders
            .lock()
            .retain(|tx| tx.send(records.clone()).is_ok());
    }

    /// Tear down open log streams without stopping the server (simulates an
    /// out-of-band server restart from the stream's point of view).
    pub fn close_log_streams(&self) {
        let _ = self.log_close.send(());
        self.log_senders.lock().clear();
    }

    fn stop(&self) {
        self.dead.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }

    fn take_script(&self) -> SessionScript {
        let mut scripts = self.scripts.lock();
        if scripts.is_empty() {
            SessionScript::finished(SessionDetail::default())
        } else {
            scripts.remove(0)
        }
    }

    fn allocate(&self, script: SessionScript, config: SessionConfig) -> SessionId {
        let id = SessionId::new(format!(
            "session-{}",
            self.seq.fetch_add(1, Ordering::SeqCst)
        ));
        let mut final_detail = script.final_detail;
        final_detail.session_id = id.clone();
        final_detail.session_name = config.session_name.clone();
        self.active.lock().push((
            id.clone(),
            ActiveSession {
                remaining: script.statuses,
                cursor: 0,
                final_detail,
                status_polls: AtomicU32::new(0),
                config,
            },
        ));
        id
    }
}

/// In-process fake OLC server bound to an ephemeral local port.
pub struct FakeOlcServer {
    endpoint: ServerEndpoint,
    state: Arc<FakeState>,
}

impl FakeOlcServer {
    pub async fn start() -> Self {
        Self::start_on(0).await.unwrap()
    }

    /// Bind to a specific port (0 for ephemeral). Used by restart specs that
    /// revive a server on the port a previous instance vacated.
    pub async fn start_on(port: u16) -> std::io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let port = listener.local_addr()?.port();
        let state = FakeState::new();

        let accept_state = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                if accept_state.dead.load(Ordering::SeqCst) {
                    break;
                }
                tokio::select! {
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { break };
                        let conn_state = Arc::clone(&accept_state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &conn_state).await {
                                debug!("fake olc connection ended: {e}");
                            }
                        });
                    }
                    _ = accept_state.shutdown.notified() => break,
                }
            }
            // Listener dropped here; further connects are refused.
        });

        Ok(Self {
            endpoint: ServerEndpoint::local(port),
            state,
        })
    }

    pub fn endpoint(&self) -> ServerEndpoint {
        self.endpoint
    }

    pub fn port(&self) -> u16 {
        self.endpoint.port
    }

    pub fn state(&self) -> &Arc<FakeState> {
        &self.state
    }

    /// Stop accepting connections (simulates server death).
    pub fn shutdown(&self) {
        self.state.stop();
    }
}

async fn handle_connection(
    stream: TcpStream,
    state: &Arc<FakeState>,
) -> Result<(), wire::ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();
    let request: Request = wire::read_frame(&mut reader, wire::DEFAULT_TIMEOUT).await?;

    match request {
        // Log-stream connections stay open and are handled separately.
        Request::GetLog(get_log) => handle_log_stream(get_log, reader, writer, state).await,
        unary => {
            let response = handle_unary(unary, state);
            wire::write_frame(&mut writer, &response, wire::DEFAULT_TIMEOUT).await
        }
    }
}

fn handle_unary(request: Request, state: &Arc<FakeState>) -> Response {
    match request {
        Request::GetVersion => {
            let reply = state.version.lock().clone();
            let response = match reply {
                VersionReply::Version(version) => Response::Version { version },
                VersionReply::Unimplemented => Response::Unimplemented,
                VersionReply::Error(message) => Response::Error { message },
            };
            // Count down the post-kill grace probes.
            let stop = {
                let mut kill = state.kill.lock();
                if kill.requests.is_empty() {
                    false
                } else {
                    match kill.survive_probes.as_mut() {
                        Some(n) if *n > 0 => {
                            *n -= 1;
                            *n == 0
                        }
                        _ => false,
                    }
                }
            };
            if stop {
                state.stop();
            }
            response
        }

        Request::KillServer { client_id } => {
            let survive = {
                let mut kill = state.kill.lock();
                kill.requests.push(client_id);
                kill.survive_probes
            };
            if survive.unwrap_or(0) == 0 {
                state.stop();
            }
            Response::Ok
        }

        Request::CreateSession { config } => {
            let script = state.take_script();
            let session_id = state.allocate(script, config);
            Response::SessionCreated { session_id }
        }

        Request::RunSession { config } => {
            let script = state.take_script();
            let session_id = state.allocate(script, config);
            let active = state.active.lock();
            let (_, session) = active.iter().find(|(id, _)| id == &session_id).unwrap();
            let mut detail = session.final_detail.clone();
            detail.status = SessionStatus::Finished;
            Response::Session {
                detail: Box::new(detail),
            }
        }

        Request::GetSession { session_id, view } => {
            let mut active = state.active.lock();
            let Some((_, session)) = active.iter_mut().find(|(id, _)| id == &session_id) else {
                return Response::Error {
                    message: format!("no such session: {session_id}"),
                };
            };
            match view {
                SessionView::Status => {
                    session.status_polls.fetch_add(1, Ordering::SeqCst);
                    Response::Session {
                        detail: Box::new(SessionDetail {
                            session_id: session_id.clone(),
                            status: session.next_status(),
                            ..Default::default()
                        }),
                    }
                }
                SessionView::Full => {
                    let mut detail = session.final_detail.clone();
                    detail.status = SessionStatus::Finished;
                    Response::Session {
                        detail: Box::new(detail),
                    }
                }
            }
        }

        Request::GetAllSessions {
            session_name_regex,
            session_status_regex,
        } => {
            let sessions = state
                .all_sessions
                .lock()
                .iter()
                .filter(|detail| {
                    matches_alternatives(session_name_regex.as_deref(), &detail.session_name, false)
                        && matches_alternatives(
                            session_status_regex.as_deref(),
                            detail.status.as_str(),
                            true,
                        )
                })
                .cloned()
                .collect();
            Response::Sessions { sessions }
        }

        Request::NotifySession {
            session_id,
            notification,
        } => {
            state.notifications.lock().push((session_id, notification));
            Response::Notified {
                accepted: state.notify_accepted.load(Ordering::SeqCst),
            }
        }

        Request::GetLog(_) => Response::Error {
            message: "GetLog handled on stream connections".to_string(),
        },
    }
}

fn matches_alternatives(pattern: Option<&str>, value: &str, exact: bool) -> bool {
    let Some(pattern) = pattern else { return true };
    pattern
        .split('|')
        .any(|alt| if exact { value == alt } else { value.contains(alt) })
}

async fn handle_log_stream(
    first: GetLogRequest,
    mut reader: tokio::net::tcp::OwnedReadHalf,
    mut writer: tokio::net::tcp::OwnedWriteHalf,
    state: &Arc<FakeState>,
) -> Result<(), wire::ProtocolError> {
    state.log_requests.lock().push(first.clone());
    if !first.enable {
        return Ok(());
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Vec<LogRecord>>();
    state.log_senders.lock().push(tx);
    let mut close = state.log_close.subscribe();

    loop {
        tokio::select! {
            records = rx.recv() => {
                let Some(records) = records else { break };
                wire::write_frame(&mut writer, &Response::LogRecords { records }, wire::DEFAULT_TIMEOUT).await?;
            }
            incoming = wire::read_message(&mut reader) => {
                match incoming {
                    Ok(bytes) => {
                        let request: Request = wire::decode(&bytes)?;
                        if let Request::GetLog(get_log) = request {
                            let enable = get_log.enable;
                            state.log_requests.lock().push(get_log);
                            if !enable {
                                break;
                            }
                        }
                    }
                    Err(_) => break,
                }
            }
            _ = close.recv() => break,
        }
    }
    Ok(())
}
