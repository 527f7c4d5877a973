// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ats-olc: wire protocol spoken between the ATS console and the OLC server.
//!
//! Three logical services share one framed transport:
//! - version service: [`Request::GetVersion`]
//! - control service: [`Request::KillServer`], [`Request::GetLog`]
//! - session service: create/run/get/list/notify
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

pub mod log;
pub mod message;
pub mod wire;

pub use log::{GetLogRequest, LogImportance, LogRecord, LogSource};
pub use message::{Request, Response, SessionNotification, SessionView};
pub use wire::{ProtocolError, DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE};
