// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ats-client: session-lifecycle client for the OLC server.
//!
//! The console drives a long-running local OLC server process. This crate
//! owns the client side of that relationship:
//!
//! - [`channel`] / [`stubs`]: one shared channel to `127.0.0.1:<port>` and
//!   cheap typed stubs over it
//! - [`version_probe`]: server reachability and version classification
//! - [`server_preparer`]: connect to, restart, or spawn-and-supervise the
//!   server process (at most one spawn per console process)
//! - [`session_stub`]: create/run/poll sessions and unpack plugin output
//! - [`log_stream`]: toggleable server-push log channel
//! - [`console_info`]: process-wide console configuration

pub mod aggregate;
pub mod channel;
pub mod console_info;
pub mod env;
pub mod error;
pub mod log_stream;
pub mod output;
pub mod poll;
pub mod server_preparer;
pub mod server_process;
pub mod session_stub;
pub mod stubs;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod version_probe;

pub use channel::{ChannelError, ChannelFactory, ServerChannel, ServerEndpoint};
pub use console_info::{ConsoleInfo, LastCommand};
pub use error::{ConsoleError, ErrorKind};
pub use log_stream::LogStreamer;
pub use output::ConsoleOutput;
#[cfg(any(test, feature = "test-support"))]
pub use output::OutputCapture;
pub use server_preparer::ServerPreparer;
pub use server_process::{ServerSpawnConfig, STARTUP_TOKEN};
pub use session_stub::{PendingSession, SessionStub, DEFAULT_PLUGIN_LABEL};
pub use stubs::{ControlStub, SessionRpcStub};
pub use version_probe::{ProbeError, VersionStub};
