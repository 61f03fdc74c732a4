// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Designator-based record routing.
//!
//! The router looks at one field of each record (the designator) and hands
//! the whole record to the sink registered for that field's exact value, or
//! to the default sink when the field is missing or its value has no route.
//! Exactly one sink sees a given record.
//!
//! Routes are registered with `&mut self` before the router is shared, so
//! the table is read-only once records start flowing.
//!
//! A failing routed sink is reported to the caller as is; the record is not
//! handed to the default sink instead.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::sink::{Sink, SinkError};
use crate::value::Record;

/// Designator field name used unless configured otherwise.
pub const DEFAULT_DESIGNATOR: &str = "es";

/// Designator value routing a record to the remote shipping sink.
///
/// This is the display form of an empty object, which is what
/// [`crate::accumulator::FieldAccumulator::remote`] stores.
pub const REMOTE_ROUTE: &str = "{}";

/// Routes records to one of several sinks by exact designator value.
pub struct RecordRouter {
    designator: String,
    default: Arc<dyn Sink>,
    routes: HashMap<String, Arc<dyn Sink>>,
}

impl RecordRouter {
    pub fn new(designator: impl Into<String>, default: Arc<dyn Sink>) -> Self {
        Self {
            designator: designator.into(),
            default,
            routes: HashMap::new(),
        }
    }

    /// Registers `sink` for records whose designator equals `value`.
    /// A later registration for the same value replaces the earlier one.
    pub fn add_route(&mut self, value: impl Into<String>, sink: Arc<dyn Sink>) -> &mut Self {
        let value = value.into();
        if self.routes.insert(value.clone(), sink).is_some() {
            debug!("Replaced route for {}={}", self.designator, value);
        }
        self
    }

    #[must_use]
    pub fn designator(&self) -> &str {
        &self.designator
    }

    /// Picks the sink for `record` without writing to it.
    #[must_use]
    pub fn select(&self, record: &Record) -> &Arc<dyn Sink> {
        record
            .get(&self.designator)
            .and_then(|value| self.routes.get(&value.to_string()))
            .unwrap_or(&self.default)
    }

    /// Forwards `record` unmodified to exactly one sink.
    pub fn route(&self, record: &Record) -> Result<(), SinkError> {
        self.select(record).write(record)
    }
}

impl Sink for RecordRouter {
    fn write(&self, record: &Record) -> Result<(), SinkError> {
        self.route(record)
    }

    /// Closes the default sink and every routed sink once, even when some of
    /// them fail.
    fn close(&self) -> Result<(), SinkError> {
        let mut closed: Vec<&Arc<dyn Sink>> = Vec::with_capacity(self.routes.len() + 1);
        let mut errors = Vec::new();
        for sink in std::iter::once(&self.default).chain(self.routes.values()) {
            if closed.iter().any(|seen| Arc::ptr_eq(seen, sink)) {
                continue;
            }
            closed.push(sink);
            if let Err(e) = sink.close() {
                errors.push(e);
            }
        }
        SinkError::collect(errors)
    }
}
