// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a server-side session.
///
/// The lifecycle is monotonic: a session only moves forward in the order
/// `Unspecified < Submitted < Running < Finished`, and once `Finished` it
/// never re-enters an earlier state. The derived `Ord` encodes that order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Unspecified,
    Submitted,
    Running,
    Finished,
}

impl SessionStatus {
    /// True once the session has reached its terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Finished)
    }

    /// Wire name of the status (`SUBMITTED`, `RUNNING`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Unspecified => "UNSPECIFIED",
            SessionStatus::Submitted => "SUBMITTED",
            SessionStatus::Running => "RUNNING",
            SessionStatus::Finished => "FINISHED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
