// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error aggregation for finished sessions.
//!
//! A finished session can carry several failures at once: errors from its
//! own plugin, a session-runner error, and errors from unrelated plugins.
//! They collapse into one primary error with the rest attached as
//! suppressed companions, ranked own plugin < runner < other plugins, with
//! server-provided order preserved inside each rank.

use ats_core::SessionDetail;

use crate::error::{ConsoleError, ErrorKind};

/// Ranked failure drawn from a session detail.
struct RankedError {
    priority: u8,
    error: ConsoleError,
}

fn collect(detail: &SessionDetail, plugin_label: &str) -> Vec<RankedError> {
    let mut ranked = Vec::new();

    for plugin_error in &detail.plugin_errors {
        if plugin_error.plugin_label == plugin_label {
            ranked.push(RankedError {
                priority: 0,
                error: ConsoleError::new(
                    ErrorKind::PluginError,
                    format!(
                        "plugin {} failed in {}: {}",
                        plugin_error.plugin_label, plugin_error.method_name, plugin_error.message
                    ),
                ),
            });
        }
    }

    if let Some(runner_error) = &detail.runner_error {
        ranked.push(RankedError {
            priority: 1,
            error: ConsoleError::new(
                ErrorKind::RunnerError,
                format!("session runner failed: {}", runner_error.message),
            ),
        });
    }

    for plugin_error in &detail.plugin_errors {
        if plugin_error.plugin_label != plugin_label {
            ranked.push(RankedError {
                priority: 2,
                error: ConsoleError::new(
                    ErrorKind::OtherPluginError,
                    format!(
                        "plugin {} failed in {}: {}",
                        plugin_error.plugin_label, plugin_error.method_name, plugin_error.message
                    ),
                ),
            });
        }
    }

    // Stable: server order survives within each priority class.
    ranked.sort_by_key(|r| r.priority);
    ranked
}

/// Derive the single error for a finished session without usable output.
///
/// The lowest-priority item becomes the primary; everything else rides
/// along as suppressed. A session with no recorded errors at all yields the
/// synthetic [`ErrorKind::NoPluginOutput`].
pub fn derive_session_error(detail: &SessionDetail, plugin_label: &str) -> ConsoleError {
    let mut ranked = collect(detail, plugin_label);
    if ranked.is_empty() {
        return ConsoleError::new(
            ErrorKind::NoPluginOutput,
            format!(
                "session {} finished without output for plugin {}",
                detail.session_id, plugin_label
            ),
        );
    }
    let primary = ranked.remove(0);
    primary
        .error
        .with_suppressed(ranked.into_iter().map(|r| r.error).collect())
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod tests;
