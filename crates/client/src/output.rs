// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serialized operator-facing console output.
//!
//! Concurrent tasks (REPL, session pollers, log-stream receiver, server
//! stderr echo) all write through one [`ConsoleOutput`], so interleaved
//! writes stay line-coherent.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use ats_olc::{LogRecord, LogSource};

pub mod codes {
    /// Muted / secondary text: darker grey
    pub const MUTED: u8 = 240;
}

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    io::stderr().is_terminal()
}

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

const RESET: &str = "\x1b[0m";

/// Render a streamed log record for the operator.
///
/// Test-framework output is printed verbatim; server-internal records are
/// muted so suite output stands out.
pub fn format_log_record(record: &LogRecord, colorize: bool) -> String {
    match record.source {
        LogSource::TestFramework => record.formatted.clone(),
        LogSource::OlcServer if colorize => {
            format!("{}{}{}", fg256(codes::MUTED), record.formatted, RESET)
        }
        LogSource::OlcServer => record.formatted.clone(),
    }
}

/// Mutex-serialized stdout/stderr for operator-facing text.
pub struct ConsoleOutput {
    out: Mutex<Box<dyn Write + Send>>,
    err: Mutex<Box<dyn Write + Send>>,
    colorize: bool,
}

impl ConsoleOutput {
    /// Output bound to the process stdout/stderr.
    pub fn stdio() -> Arc<Self> {
        Arc::new(Self {
            out: Mutex::new(Box::new(io::stdout())),
            err: Mutex::new(Box::new(io::stderr())),
            colorize: should_colorize(),
        })
    }

    pub fn stdout_line(&self, line: &str) {
        let mut out = self.out.lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }

    pub fn stderr_line(&self, line: &str) {
        let mut err = self.err.lock();
        let _ = writeln!(err, "{line}");
        let _ = err.flush();
    }

    /// Write a prompt without a trailing newline.
    pub fn prompt(&self, text: &str) {
        let mut out = self.out.lock();
        let _ = write!(out, "{text}");
        let _ = out.flush();
    }

    /// Print one streamed log record, styled by source.
    pub fn log_record(&self, record: &LogRecord) {
        self.stderr_line(&format_log_record(record, self.colorize));
    }
}

#[cfg(any(test, feature = "test-support"))]
mod capture {
    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Handle onto a captured [`ConsoleOutput`]'s buffers.
    #[derive(Clone)]
    pub struct OutputCapture {
        out: SharedBuf,
        err: SharedBuf,
    }

    impl OutputCapture {
        pub fn stdout_text(&self) -> String {
            String::from_utf8_lossy(&self.out.0.lock()).into_owned()
        }

        pub fn stderr_text(&self) -> String {
            String::from_utf8_lossy(&self.err.0.lock()).into_owned()
        }
    }

    impl ConsoleOutput {
        /// In-memory output for tests; `colorize` is forced off.
        pub fn captured() -> (Arc<ConsoleOutput>, OutputCapture) {
            let capture = OutputCapture {
                out: SharedBuf::default(),
                err: SharedBuf::default(),
            };
            let output = Arc::new(ConsoleOutput {
                out: Mutex::new(Box::new(capture.out.clone())),
                err: Mutex::new(Box::new(capture.err.clone())),
                colorize: false,
            });
            (output, capture)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use capture::OutputCapture;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
