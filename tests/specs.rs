//! Behavioral specifications for the ats console core.
//!
//! These specs exercise the session-lifecycle client subsystem end-to-end
//! against an in-process fake OLC server (and real child processes for the
//! spawn paths). See tests/specs/prelude.rs for the shared harness.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// server/
#[path = "specs/server/prepare.rs"]
mod server_prepare;

// session/
#[path = "specs/session/list.rs"]
mod session_list;
#[path = "specs/session/run.rs"]
mod session_run;

// log/
#[path = "specs/log/stream.rs"]
mod log_stream;

// cli/
#[path = "specs/cli/help.rs"]
mod cli_help;
