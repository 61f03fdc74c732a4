// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Structured trade logging.
//!
//! Callers build records field by field with a [`FieldAccumulator`] obtained
//! from a [`Logger`], and each finished record is routed by its designator
//! field either to a local logfmt writer or to a remote document-index data
//! stream. The remote schema is bootstrapped when the logger opens.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod accumulator;
pub mod config;
pub mod filter;
pub mod http;
pub mod logger;
pub mod router;
pub mod schema;
pub mod sink;
pub mod value;

pub use accumulator::FieldAccumulator;
pub use config::{Config, ConfigError, EsConfig};
pub use filter::{Level, SeverityFilter};
pub use logger::{CloseError, Logger, OpenError};
pub use router::RecordRouter;
pub use schema::{BootstrapError, SchemaBootstrapper};
pub use sink::{Sink, SinkError};
pub use value::{Record, Value};
