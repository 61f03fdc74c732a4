// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Severity levels and the filtering sink decorator.
//!
//! Records carry their severity in the [`LEVEL_FIELD`] field as the
//! lowercase level name. [`SeverityFilter`] forwards a record to the wrapped
//! sink only when its level is at or above the configured threshold; records
//! below it are dropped and the write reports success. Records without a
//! recognizable level are always forwarded.
//!
//! # Levels
//!
//! | value | level   |
//! |-------|---------|
//! | 1     | `error` |
//! | 2     | `warn`  |
//! | 3     | `info`  |
//! | 4     | `debug` |

use std::fmt;
use std::str::FromStr;

use crate::sink::{Sink, SinkError};
use crate::value::{Record, Value};

/// Field holding a record's severity.
pub const LEVEL_FIELD: &str = "level";

/// Record severity, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

impl Level {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
        }
    }

    /// Numeric threshold used in configuration.
    #[must_use]
    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Level> for Value {
    fn from(level: Level) -> Self {
        Value::String(level.as_str().to_string())
    }
}

/// Returned when a numeric or textual level is outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid level {0}")]
pub struct InvalidLevel(pub String);

impl TryFrom<i64> for Level {
    type Error = InvalidLevel;

    fn try_from(value: i64) -> Result<Self, InvalidLevel> {
        match value {
            1 => Ok(Level::Error),
            2 => Ok(Level::Warn),
            3 => Ok(Level::Info),
            4 => Ok(Level::Debug),
            other => Err(InvalidLevel(other.to_string())),
        }
    }
}

impl FromStr for Level {
    type Err = InvalidLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Level::Error),
            "warn" | "warning" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            _ => Err(InvalidLevel(s.to_string())),
        }
    }
}

/// Reads the severity of a record, if it has a recognizable one.
#[must_use]
pub fn record_level(record: &Record) -> Option<Level> {
    record
        .get(LEVEL_FIELD)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}

/// Sink decorator dropping records more verbose than `threshold`.
pub struct SeverityFilter<S> {
    inner: S,
    threshold: Level,
}

impl<S: Sink> SeverityFilter<S> {
    pub fn new(inner: S, threshold: Level) -> Self {
        Self { inner, threshold }
    }

    #[must_use]
    pub fn threshold(&self) -> Level {
        self.threshold
    }

    #[must_use]
    pub fn allows(&self, record: &Record) -> bool {
        record_level(record).map_or(true, |level| level <= self.threshold)
    }
}

impl<S: Sink> Sink for SeverityFilter<S> {
    fn write(&self, record: &Record) -> Result<(), SinkError> {
        if !self.allows(record) {
            return Ok(());
        }
        self.inner.write(record)
    }

    fn close(&self) -> Result<(), SinkError> {
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::test_support::{FailingSink, MemorySink};
    use std::sync::Arc;

    fn leveled(level: Level) -> Record {
        [(LEVEL_FIELD, Value::from(level)), ("message", Value::from("m"))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_level_from_int() {
        assert_eq!(Level::try_from(1_i64), Ok(Level::Error));
        assert_eq!(Level::try_from(4_i64), Ok(Level::Debug));
        assert!(Level::try_from(0_i64).is_err());
        assert!(Level::try_from(5_i64).is_err());
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("INFO".parse::<Level>(), Ok(Level::Info));
        assert_eq!("warning".parse::<Level>(), Ok(Level::Warn));
        assert!("trace".parse::<Level>().is_err());
    }

    #[test]
    fn test_gating_at_info() {
        let memory = Arc::new(MemorySink::default());
        let filter = SeverityFilter::new(Arc::clone(&memory), Level::Info);

        for level in [Level::Error, Level::Warn, Level::Info, Level::Debug] {
            filter.write(&leveled(level)).expect("write");
        }

        let seen: Vec<Option<Level>> = memory.records().iter().map(record_level).collect();
        assert_eq!(
            seen,
            vec![Some(Level::Error), Some(Level::Warn), Some(Level::Info)]
        );
    }

    #[test]
    fn test_unleveled_records_pass() {
        let memory = Arc::new(MemorySink::default());
        let filter = SeverityFilter::new(Arc::clone(&memory), Level::Error);

        filter
            .write(&[("message", "no level")].into_iter().collect())
            .expect("write");
        filter
            .write(&[(LEVEL_FIELD, "loud")].into_iter().collect())
            .expect("write");
        assert_eq!(memory.records().len(), 2);
    }

    #[test]
    fn test_dropped_record_never_reaches_failing_sink() {
        let failing = Arc::new(FailingSink::default());
        let filter = SeverityFilter::new(Arc::clone(&failing), Level::Warn);

        assert!(filter.write(&leveled(Level::Debug)).is_ok());
        assert!(filter.write(&leveled(Level::Error)).is_err());
        assert_eq!(failing.writes.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
