// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared channel to the local OLC server.
//!
//! One channel per process, built lazily by [`ChannelFactory`] and shared by
//! every stub. A unary call opens a connection, writes one framed request,
//! and reads one framed response; the channel itself carries the endpoint
//! and timeout policy and is never closed explicitly (released by process
//! exit). The log stream uses [`ServerChannel::open_stream`] for a dedicated
//! duplex connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;

use ats_olc::{wire, ProtocolError, Request, Response};

use crate::env;

/// Resolved server endpoint. The OLC server is always local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub port: u16,
}

impl ServerEndpoint {
    pub fn local(port: u16) -> Self {
        Self { port }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.port)
    }
}

/// Transport-level errors for channel operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Nothing is listening (connection refused or unreachable).
    #[error("server unavailable: {0}")]
    Unavailable(std::io::Error),

    #[error("transport error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Server-side `Error` response.
    #[error("server rejected request: {0}")]
    Rejected(String),

    #[error("unexpected response from server")]
    UnexpectedResponse,
}

fn is_unavailable(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::AddrNotAvailable
            | std::io::ErrorKind::NotConnected
    )
}

/// Channel to the local OLC server.
pub struct ServerChannel {
    endpoint: ServerEndpoint,
    rpc_timeout: Duration,
    connect_timeout: Duration,
}

impl ServerChannel {
    pub fn new(endpoint: ServerEndpoint) -> Self {
        Self {
            endpoint,
            rpc_timeout: env::timeout_rpc(),
            connect_timeout: env::timeout_connect(),
        }
    }

    pub fn endpoint(&self) -> ServerEndpoint {
        self.endpoint
    }

    /// One unary RPC with the default read timeout.
    pub async fn call(&self, request: &Request) -> Result<Response, ChannelError> {
        self.call_with_read_timeout(request, self.rpc_timeout).await
    }

    /// One unary RPC with a caller-chosen read timeout, for RPCs where the
    /// server blocks until the work completes.
    pub async fn call_with_read_timeout(
        &self,
        request: &Request,
        read_timeout: Duration,
    ) -> Result<Response, ChannelError> {
        let stream = self.connect().await?;
        let (mut reader, mut writer) = stream.into_split();

        wire::write_frame(&mut writer, request, self.rpc_timeout).await?;
        let response: Response = wire::read_frame(&mut reader, read_timeout).await?;
        Ok(response)
    }

    /// Open a raw duplex connection (log streaming).
    pub async fn open_stream(&self) -> Result<TcpStream, ChannelError> {
        self.connect().await
    }

    async fn connect(&self) -> Result<TcpStream, ChannelError> {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(self.endpoint.addr()))
            .await
        {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) if is_unavailable(&e) => Err(ChannelError::Unavailable(e)),
            Ok(Err(e)) => Err(ChannelError::Protocol(ProtocolError::Io(e))),
            // A local connect that hangs means no healthy listener.
            Err(_) => Err(ChannelError::Unavailable(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "connect timed out",
            ))),
        }
    }
}

/// Lazy accessor for the process-wide shared channel.
pub struct ChannelFactory {
    endpoint: ServerEndpoint,
    channel: OnceLock<Arc<ServerChannel>>,
}

impl ChannelFactory {
    pub fn new(endpoint: ServerEndpoint) -> Self {
        Self {
            endpoint,
            channel: OnceLock::new(),
        }
    }

    /// The shared channel, built on first use.
    pub fn channel(&self) -> Arc<ServerChannel> {
        Arc::clone(
            self.channel
                .get_or_init(|| Arc::new(ServerChannel::new(self.endpoint))),
        )
    }

    pub fn version_stub(&self) -> crate::version_probe::VersionStub {
        crate::version_probe::VersionStub::new(self.channel())
    }

    pub fn control_stub(&self) -> crate::stubs::ControlStub {
        crate::stubs::ControlStub::new(self.channel())
    }

    pub fn session_stub(&self) -> crate::stubs::SessionRpcStub {
        crate::stubs::SessionRpcStub::new(self.channel())
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
