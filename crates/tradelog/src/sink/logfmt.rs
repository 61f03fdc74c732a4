// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Key/value line writer.
//!
//! Each record becomes one logfmt line: `key=value` pairs separated by a
//! single space, in field-name order, terminated by `\n`.
//!
//! ```text
//! @timestamp=2024-05-01T10:00:00.000000000Z event=fill exchange=okex message="order filled"
//! ```

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use tracing::debug;

use crate::sink::{Sink, SinkError};
use crate::value::Record;

/// Path sentinel selecting standard output instead of a file.
pub const STDOUT: &str = "stdout";

/// Writes records as logfmt lines to a file or stdout.
///
/// Closing flushes and drops the writer, releasing the file; later writes
/// fail with [`SinkError::Closed`].
pub struct LogfmtSink {
    writer: Mutex<Option<Box<dyn Write + Send>>>,
}

impl LogfmtSink {
    /// Wraps an arbitrary writer.
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(Some(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Opens `path` for appending, creating it when absent.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!("Opened log file {}", path.display());
        Ok(Self::new(Box::new(file)))
    }

    /// Opens stdout when `target` is [`STDOUT`], otherwise the file at `target`.
    pub fn open_target(target: &str) -> io::Result<Self> {
        if target == STDOUT {
            Ok(Self::stdout())
        } else {
            Self::open(target)
        }
    }
}

impl Sink for LogfmtSink {
    fn write(&self, record: &Record) -> Result<(), SinkError> {
        let line = encode(record);
        let mut guard = self.writer.lock().map_err(|_| poisoned())?;
        let writer = guard.as_mut().ok_or(SinkError::Closed)?;
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        let mut guard = self.writer.lock().map_err(|_| poisoned())?;
        match guard.take() {
            Some(mut writer) => Ok(writer.flush()?),
            None => Ok(()),
        }
    }
}

fn poisoned() -> SinkError {
    SinkError::Io(io::Error::new(io::ErrorKind::Other, "writer lock poisoned"))
}

/// Encodes a record as a single logfmt line including the trailing newline.
#[must_use]
pub fn encode(record: &Record) -> String {
    let mut line = String::new();
    for (i, (name, value)) in record.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        push_token(&mut line, name);
        line.push('=');
        push_token(&mut line, &value.to_string());
    }
    line.push('\n');
    line
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s
            .chars()
            .any(|c| c <= ' ' || c == '=' || c == '"' || c.is_control())
}

fn push_token(out: &mut String, s: &str) {
    if !needs_quoting(s) {
        out.push_str(s);
        return;
    }
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
