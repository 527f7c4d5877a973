// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console startup flags.
//!
//! Long option names follow the device-infra flag convention
//! (`--flag_name=value`), including explicit boolean values.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use ats_olc::LogImportance;

#[derive(Debug, Parser)]
#[command(
    name = "ats",
    version,
    about = "ATS console - run xTS suites on a device fleet via the OLC server"
)]
pub struct Flags {
    /// Port the OLC server listens on (ignored with USE_NEW_OLC_SERVER).
    #[arg(long = "olc_server_port", value_name = "PORT", default_value_t = 7030)]
    pub olc_server_port: u16,

    /// Restart the OLC server even when a healthy one is reachable.
    #[arg(
        long = "ats_console_always_restart_olc_server",
        value_name = "BOOL",
        action = ArgAction::Set,
        default_value_t = false
    )]
    pub always_restart_olc_server: bool,

    /// Master switch for server-dependent operations.
    #[arg(
        long = "enable_ats_console_olc_server",
        value_name = "BOOL",
        action = ArgAction::Set,
        default_value_t = true
    )]
    pub enable_olc_server: bool,

    /// Enable log streaming at startup.
    #[arg(
        long = "enable_ats_console_olc_server_log",
        value_name = "BOOL",
        action = ArgAction::Set,
        default_value_t = false
    )]
    pub enable_olc_server_log: bool,

    /// Minimum importance of streamed log records shown to the operator.
    #[arg(
        long = "ats_console_olc_server_min_log_record_importance",
        value_name = "LEVEL",
        default_value_t = 200
    )]
    pub min_log_record_importance: i32,

    /// OLC server executable.
    #[arg(long = "ats_console_olc_server_path", value_name = "PATH")]
    pub olc_server_path: Option<PathBuf>,

    /// Root directory of the installed xTS suite.
    #[arg(long = "xts_root", value_name = "DIR")]
    pub xts_root: Option<PathBuf>,

    /// URL of the test package index.
    #[arg(long = "package_index_url", value_name = "URL")]
    pub package_index_url: Option<String>,
}

impl Flags {
    pub fn min_importance(&self) -> LogImportance {
        LogImportance::from_level(self.min_log_record_importance)
    }
}

#[cfg(test)]
#[path = "flags_tests.rs"]
mod tests;
