// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streamed server log records.

use serde::{Deserialize, Serialize};

use ats_core::ClientId;

/// Where a streamed log record originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    /// The OLC server's own internals.
    OlcServer,
    /// Output forwarded from the test framework running a session.
    TestFramework,
}

/// Importance of a log record.
///
/// Backed by the server's numeric levels so a minimum-importance threshold
/// is a plain integer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogImportance {
    Debug,
    Info,
    Important,
    TfInfo,
    Warning,
    Error,
}

impl LogImportance {
    /// Numeric level used for threshold comparisons.
    pub fn level(&self) -> i32 {
        match self {
            LogImportance::Debug => 100,
            LogImportance::Info => 200,
            LogImportance::Important => 300,
            LogImportance::TfInfo => 350,
            LogImportance::Warning => 400,
            LogImportance::Error => 500,
        }
    }

    /// Smallest importance whose level is >= `level`, used to interpret the
    /// operator's numeric threshold flag.
    pub fn from_level(level: i32) -> LogImportance {
        match level {
            i32::MIN..=100 => LogImportance::Debug,
            101..=200 => LogImportance::Info,
            201..=300 => LogImportance::Important,
            301..=350 => LogImportance::TfInfo,
            351..=400 => LogImportance::Warning,
            _ => LogImportance::Error,
        }
    }
}

/// One streamed log record, pre-formatted by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub source: LogSource,
    pub importance: LogImportance,
    pub formatted: String,
}

/// Request frame on the log stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetLogRequest {
    pub enable: bool,
    pub client_id: ClientId,
    /// Minimum importance the server should bother streaming.
    pub min_importance: LogImportance,
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
