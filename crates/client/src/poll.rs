// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adaptive status-poll schedule.
//!
//! Sessions usually finish quickly; long suites amortize polling cost. The
//! schedule is a pure function of the attempt count so it can be tested
//! without a clock.

use std::time::Duration;

/// Poll interval for a 1-based attempt count.
///
/// Attempts 1-100 poll every 400ms, 101-300 every 5s, and everything after
/// that every 30s.
pub fn poll_interval(attempt: u32) -> Duration {
    match attempt {
        0..=100 => Duration::from_millis(400),
        101..=300 => Duration::from_secs(5),
        _ => Duration::from_secs(30),
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
