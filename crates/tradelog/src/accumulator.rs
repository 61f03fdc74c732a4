// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Reusable record builder.
//!
//! A [`FieldAccumulator`] collects named fields for the next record. Setters
//! take `&self` and return `&Self`, so one accumulator can be shared between
//! threads and chained:
//!
//! ```ignore
//! logger
//!     .record_builder()
//!     .exchange("binance")
//!     .symbol("usdt_btc")
//!     .level(Level::Info)
//!     .message("order filled")
//!     .log()?;
//! ```
//!
//! [`FieldAccumulator::emit_and_reset`] snapshots the fields and clears
//! them in one step under the same lock every setter takes. Base fields
//! belong to the accumulator itself and survive every reset; they are how
//! child accumulators carry their context.

use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::filter::Level;
use crate::router::DEFAULT_DESIGNATOR;
use crate::sink::{Sink, SinkError};
use crate::value::{Record, Value};

pub const EXCHANGE_FIELD: &str = "exchange";
pub const SYMBOL_FIELD: &str = "symbol";
pub const EVENT_FIELD: &str = "event";
pub const PROGRAMME_FIELD: &str = "programme";
pub const MESSAGE_FIELD: &str = "message";
pub const ID_FIELD: &str = "id";
pub const ERROR_FIELD: &str = "error";

/// Thread-safe builder for the next record.
pub struct FieldAccumulator {
    base: Record,
    fields: Mutex<Record>,
    designator: Arc<str>,
    sink: Arc<dyn Sink>,
}

impl FieldAccumulator {
    /// Creates an empty accumulator dispatching to `sink`, using the default
    /// designator field for [`FieldAccumulator::remote`].
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self::with_designator(sink, DEFAULT_DESIGNATOR)
    }

    pub fn with_designator(sink: Arc<dyn Sink>, designator: impl Into<Arc<str>>) -> Self {
        Self {
            base: Record::new(),
            fields: Mutex::new(Record::new()),
            designator: designator.into(),
            sink,
        }
    }

    // A poisoned lock still holds a consistent map; setters never panic
    // midway through an update.
    fn lock(&self) -> MutexGuard<'_, Record> {
        self.fields
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Stores `value` under `name`, replacing any earlier value.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.lock().insert(name, value);
        self
    }

    /// Stores several fields at once; a concurrent emit sees all of them or
    /// none.
    pub fn set_all<K, V>(&self, fields: impl IntoIterator<Item = (K, V)>) -> &Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut guard = self.lock();
        for (name, value) in fields {
            guard.insert(name, value);
        }
        drop(guard);
        self
    }

    /// Returns base fields merged with accumulated fields and clears the
    /// accumulated ones. Accumulated fields win over base fields.
    #[must_use]
    pub fn emit_and_reset(&self) -> Record {
        let accumulated = std::mem::take(&mut *self.lock());
        let mut record = self.base.clone();
        record.merge(&accumulated);
        record
    }

    /// Creates an accumulator whose base is this one's base, then
    /// `base_fields`, then this one's accumulated fields, later sources
    /// winning. The child shares this accumulator's sink and designator;
    /// this accumulator's pending fields are consumed.
    #[must_use]
    pub fn derive_child<K, V>(&self, base_fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let accumulated = std::mem::take(&mut *self.lock());
        let mut base = self.base.clone();
        for (name, value) in base_fields {
            base.insert(name, value);
        }
        base.merge(&accumulated);
        Self {
            base,
            fields: Mutex::new(Record::new()),
            designator: Arc::clone(&self.designator),
            sink: Arc::clone(&self.sink),
        }
    }

    /// Emits the pending record and hands it to the sink.
    pub fn log(&self) -> Result<(), SinkError> {
        let record = self.emit_and_reset();
        self.sink.write(&record)
    }

    #[must_use]
    pub fn base(&self) -> &Record {
        &self.base
    }

    pub fn exchange(&self, exchange: impl Into<Value>) -> &Self {
        self.set(EXCHANGE_FIELD, exchange)
    }

    pub fn symbol(&self, symbol: impl Into<Value>) -> &Self {
        self.set(SYMBOL_FIELD, symbol)
    }

    pub fn event(&self, event: impl Into<Value>) -> &Self {
        self.set(EVENT_FIELD, event)
    }

    pub fn programme(&self, programme: impl Into<Value>) -> &Self {
        self.set(PROGRAMME_FIELD, programme)
    }

    pub fn message(&self, message: impl Into<Value>) -> &Self {
        self.set(MESSAGE_FIELD, message)
    }

    /// Stores an identifier correlating related records.
    pub fn id(&self, id: impl Display) -> &Self {
        self.set(ID_FIELD, Value::Id(id.to_string()))
    }

    /// Stores the display text of `err`.
    pub fn error(&self, err: &dyn std::error::Error) -> &Self {
        self.set(ERROR_FIELD, err.to_string())
    }

    pub fn level(&self, level: Level) -> &Self {
        self.set(crate::filter::LEVEL_FIELD, level)
    }

    /// Marks the record for the remote shipping sink.
    pub fn remote(&self) -> &Self {
        self.set(
            self.designator.as_ref(),
            Value::Object(serde_json::Map::new()),
        )
    }
}

impl std::fmt::Debug for FieldAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldAccumulator")
            .field("base", &self.base)
            .field("fields", &*self.lock())
            .field("designator", &self.designator)
            .finish_non_exhaustive()
    }
}
