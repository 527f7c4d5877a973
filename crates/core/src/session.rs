// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session records exchanged with the OLC server.
//!
//! A session is a server-side unit of work carrying exactly one plugin
//! entry. The server records the plugin's output and errors under the
//! session's plugin label; the console treats the payloads as opaque.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::SessionStatus;

crate::define_id! {
    /// Server-assigned session identifier.
    ///
    /// Opaque, but ordered by creation time on the server side.
    #[derive(Default)]
    pub struct SessionId;
}

/// Trace propagation context attached to a session at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanContext {
    #[serde(default)]
    pub trace_id: String,
    #[serde(default)]
    pub span_id: String,
}

/// Envelope submitted to `CreateSession`/`RunSession`.
///
/// Carries a human-readable name, the single plugin entry (label, class
/// name, opaque configuration payload), and the parent span context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub session_name: String,
    /// Key under which the server records this plugin's output and errors.
    pub plugin_label: String,
    pub plugin_class: String,
    /// Plugin-specific configuration; never inspected by the console core.
    pub payload: Value,
    #[serde(default)]
    pub parent_span: SpanContext,
}

/// Output recorded by a session plugin: either empty or an opaque typed
/// payload the caller unpacks to a plugin-specific structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl PluginOutput {
    pub fn is_empty(&self) -> bool {
        self.payload.is_none()
    }
}

/// Error reported by a session plugin, tagged with the plugin label and
/// the plugin method that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginError {
    pub plugin_label: String,
    pub method_name: String,
    pub message: String,
}

/// Error reported by the session runner itself, outside any plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerError {
    pub message: String,
}

/// Server-side record for a session.
///
/// `outputs` preserves server-provided insertion order, as does
/// `plugin_errors`; the error aggregation rules depend on that order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionDetail {
    pub session_id: SessionId,
    #[serde(default)]
    pub session_name: String,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_error: Option<RunnerError>,
    #[serde(default)]
    pub outputs: IndexMap<String, PluginOutput>,
    #[serde(default)]
    pub plugin_errors: Vec<PluginError>,
}

impl SessionDetail {
    /// The output envelope recorded under `plugin_label`, if any.
    pub fn output(&self, plugin_label: &str) -> Option<&PluginOutput> {
        self.outputs.get(plugin_label)
    }

    /// True when a non-empty output payload exists for `plugin_label`.
    pub fn has_output(&self, plugin_label: &str) -> bool {
        self.output(plugin_label).is_some_and(|o| !o.is_empty())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
