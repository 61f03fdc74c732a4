// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Record sinks.
//!
//! Every backend accepts a finished [`Record`] through the [`Sink`] trait and
//! either persists it or fails with a described error. Decorators
//! ([`TimestampSink`], [`crate::filter::SeverityFilter`]) and the
//! [`crate::router::RecordRouter`] implement the same trait so the logger
//! pipeline is a plain chain of sinks:
//!
//! ```text
//!   FieldAccumulator::log
//!          │
//!          v
//!   ┌──────────────┐   ┌────────────────┐   ┌──────────────┐
//!   │ SeverityFilter│──▶│ TimestampSink  │──▶│ RecordRouter │
//!   └──────────────┘   └────────────────┘   └──────┬───────┘
//!                                                  │ designator
//!                                     ┌────────────┴───────────┐
//!                                     v                        v
//!                               ┌───────────┐          ┌──────────────┐
//!                               │LogfmtSink │          │ ShippingSink │
//!                               └───────────┘          └──────────────┘
//! ```

pub mod logfmt;
pub mod shipping;

use std::fmt;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};

use crate::value::{Record, Value, TIMESTAMP_FIELD};

pub use logfmt::LogfmtSink;
pub use shipping::{ShippingConfig, ShippingSink};

/// Error returned by a sink that could not persist or release a record.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("bad response code {status} resp '{body}'")]
    Shipping { status: u16, body: String },
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("sink is closed")]
    Closed,
    #[error("{}", DisplayErrors(.0))]
    Multiple(Vec<SinkError>),
}

struct DisplayErrors<'a>(&'a [SinkError]);

impl fmt::Display for DisplayErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl SinkError {
    /// Folds a list of failures into a single result.
    pub(crate) fn collect(mut errors: Vec<SinkError>) -> Result<(), SinkError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(SinkError::Multiple(errors)),
        }
    }
}

/// Destination for finished records.
pub trait Sink: Send + Sync {
    /// Persists or forwards one record.
    fn write(&self, record: &Record) -> Result<(), SinkError>;

    /// Flushes and releases held resources. Best effort; called once on shutdown.
    fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn write(&self, record: &Record) -> Result<(), SinkError> {
        (**self).write(record)
    }

    fn close(&self) -> Result<(), SinkError> {
        (**self).close()
    }
}

/// Formats the current instant the way `@timestamp` is stored.
#[must_use]
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Decorator stamping each record with [`TIMESTAMP_FIELD`] at dispatch time.
pub struct TimestampSink<S> {
    inner: S,
}

impl<S: Sink> TimestampSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: Sink> Sink for TimestampSink<S> {
    fn write(&self, record: &Record) -> Result<(), SinkError> {
        let mut stamped = record.clone();
        stamped.insert(TIMESTAMP_FIELD, Value::String(timestamp_now()));
        self.inner.write(&stamped)
    }

    fn close(&self) -> Result<(), SinkError> {
        self.inner.close()
    }
}
