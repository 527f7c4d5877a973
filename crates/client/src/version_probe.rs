// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Version service stub and reachability classification.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use ats_core::ServerVersion;
use ats_olc::{Request, Response};

use crate::channel::{ChannelError, ServerChannel};

/// Probe failure classification.
///
/// `Unavailable` means nothing is listening (a clean miss: the preparer may
/// spawn a server). Everything else is a protocol error: something answered
/// but not in a way we can use.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no OLC server listening: {0}")]
    Unavailable(std::io::Error),

    #[error("OLC server protocol error: {0}")]
    Protocol(ChannelError),
}

/// Version service stub.
#[derive(Clone)]
pub struct VersionStub {
    channel: Arc<ServerChannel>,
}

impl VersionStub {
    pub fn new(channel: Arc<ServerChannel>) -> Self {
        Self { channel }
    }

    /// Query the server version.
    ///
    /// A remote that answers `Unimplemented` predates the version service;
    /// it is still reachable and reported as [`ServerVersion::LEGACY`].
    pub async fn get_version(&self) -> Result<ServerVersion, ProbeError> {
        match self.channel.call(&Request::GetVersion).await {
            Ok(Response::Version { version }) => Ok(version),
            Ok(Response::Unimplemented) => {
                debug!("server does not implement the version service; assuming legacy server");
                Ok(ServerVersion::LEGACY)
            }
            Ok(_) => Err(ProbeError::Protocol(ChannelError::UnexpectedResponse)),
            Err(ChannelError::Unavailable(e)) => Err(ProbeError::Unavailable(e)),
            Err(e) => Err(ProbeError::Protocol(e)),
        }
    }
}

#[cfg(test)]
#[path = "version_probe_tests.rs"]
mod tests;
