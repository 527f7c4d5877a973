// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Toggleable server-push log channel.
//!
//! `enable(true)` opens one duplex stream to the server and spawns a
//! receiver task printing records to the operator's stderr; `enable(false)`
//! ends it. The toggle is idempotent on both sides and at most one stream
//! is open at rest. Everything that goes wrong on an established stream is
//! logged and swallowed: the stream silently closes and the operator
//! re-enables explicitly if desired.

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tracing::{debug, debug_span, warn, Instrument};

use ats_core::ClientId;
use ats_olc::{wire, GetLogRequest, LogImportance, Request, Response};

use crate::error::ConsoleError;
use crate::output::ConsoleOutput;
use crate::server_preparer::ServerPreparer;
use crate::stubs::ControlStub;

struct StreamState {
    /// Bumped per opened stream so a stale receiver never clears a newer one.
    generation: u64,
    writer: Option<OwnedWriteHalf>,
}

/// Operator-toggleable log stream.
pub struct LogStreamer {
    control: ControlStub,
    preparer: Arc<ServerPreparer>,
    client_id: ClientId,
    min_importance: LogImportance,
    output: Arc<ConsoleOutput>,
    state: Arc<Mutex<StreamState>>,
}

impl LogStreamer {
    pub fn new(
        control: ControlStub,
        preparer: Arc<ServerPreparer>,
        client_id: ClientId,
        min_importance: LogImportance,
        output: Arc<ConsoleOutput>,
    ) -> Self {
        Self {
            control,
            preparer,
            client_id,
            min_importance,
            output,
            state: Arc::new(Mutex::new(StreamState {
                generation: 0,
                writer: None,
            })),
        }
    }

    /// Whether a stream is currently open.
    pub async fn is_enabled(&self) -> bool {
        self.state.lock().await.writer.is_some()
    }

    /// Turn the stream on or off. Re-entrant and idempotent.
    ///
    /// Server preparation failures surface to the caller; stream transport
    /// failures are logged and swallowed per the streamer failure model.
    pub async fn enable(&self, on: bool) -> Result<(), ConsoleError> {
        let mut state = self.state.lock().await;
        if on {
            if state.writer.is_some() {
                return Ok(());
            }
            self.preparer.prepare().await?;

            let stream = match self.control.open_log_stream().await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("failed to open log stream: {e}");
                    return Ok(());
                }
            };
            let (read_half, mut write_half) = stream.into_split();

            let request = Request::GetLog(GetLogRequest {
                enable: true,
                client_id: self.client_id.clone(),
                min_importance: self.min_importance,
            });
            if let Err(e) = wire::write_frame(&mut write_half, &request, wire::DEFAULT_TIMEOUT).await
            {
                warn!("failed to start log stream: {e}");
                return Ok(());
            }

            state.generation += 1;
            state.writer = Some(write_half);

            let generation = state.generation;
            let task = receive_loop(
                read_half,
                generation,
                Arc::clone(&self.state),
                Arc::clone(&self.output),
                self.min_importance,
            );
            tokio::spawn(task.instrument(debug_span!("log_stream_receiver", generation)));
        } else {
            let Some(mut writer) = state.writer.take() else {
                return Ok(());
            };
            let request = Request::GetLog(GetLogRequest {
                enable: false,
                client_id: self.client_id.clone(),
                min_importance: self.min_importance,
            });
            if let Err(e) = wire::write_frame(&mut writer, &request, wire::DEFAULT_TIMEOUT).await {
                debug!("failed to send log stream end request: {e}");
            }
            if let Err(e) = writer.shutdown().await {
                debug!("log stream shutdown failed: {e}");
            }
        }
        Ok(())
    }
}

/// Print incoming record batches until the stream ends, then clear the
/// request channel (unless a newer stream already replaced it).
async fn receive_loop(
    mut read_half: OwnedReadHalf,
    generation: u64,
    state: Arc<Mutex<StreamState>>,
    output: Arc<ConsoleOutput>,
    min_importance: LogImportance,
) {
    loop {
        let bytes = match wire::read_message(&mut read_half).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("log stream ended: {e}");
                break;
            }
        };
        match wire::decode::<Response>(&bytes) {
            Ok(Response::LogRecords { records }) => {
                for record in records {
                    if record.importance >= min_importance {
                        output.log_record(&record);
                    }
                }
            }
            Ok(other) => debug!("unexpected frame on log stream: {other:?}"),
            Err(e) => {
                debug!("undecodable frame on log stream: {e}");
                break;
            }
        }
    }

    let mut state = state.lock().await;
    if state.generation == generation {
        state.writer = None;
    }
}

#[cfg(test)]
#[path = "log_stream_tests.rs"]
mod tests;
