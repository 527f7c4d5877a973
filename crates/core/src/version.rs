// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OLC server version triple.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version reported by the OLC server's version service.
///
/// The all-zero value is a sentinel meaning "the remote did not implement
/// the version service" (a legacy server); every other value comes from the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    /// Sentinel for servers predating the version service.
    pub const LEGACY: ServerVersion = ServerVersion::new(0, 0, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// True for the legacy sentinel.
    pub fn is_legacy(&self) -> bool {
        *self == Self::LEGACY
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Error parsing a `major.minor.patch` string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid server version: {input}")]
pub struct VersionParseError {
    pub input: String,
}

impl FromStr for ServerVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || VersionParseError {
            input: s.to_string(),
        };
        let mut parts = s.split('.');
        let mut next = || -> Result<u32, VersionParseError> {
            parts
                .next()
                .and_then(|p| p.parse::<u32>().ok())
                .ok_or_else(err)
        };
        let version = ServerVersion::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(version)
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
