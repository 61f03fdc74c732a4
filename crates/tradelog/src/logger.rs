// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The logger handle.
//!
//! [`Logger::open`] wires the pipeline described by a [`Config`]:
//!
//! ```text
//! SeverityFilter -> TimestampSink -> RecordRouter -+-> LogfmtSink (default)
//!                                                  +-> ShippingSink (designator = {})
//! ```
//!
//! When a remote block is configured the storage schema is bootstrapped
//! before the shipping sink is created, and any bootstrap failure aborts
//! the open.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::accumulator::FieldAccumulator;
use crate::config::{Config, ConfigError, EsConfig};
use crate::filter::{Level, SeverityFilter};
use crate::http::HttpClient;
use crate::router::{RecordRouter, REMOTE_ROUTE};
use crate::schema::{BootstrapError, SchemaBootstrapper};
use crate::sink::{LogfmtSink, ShippingSink, Sink, SinkError, TimestampSink};

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open log file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build storage client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("init storage schema fail: {0}")]
    Bootstrap(#[from] BootstrapError),
    #[error("failed to start shipping sink: {0}")]
    Sink(#[from] SinkError),
}

/// Every failure met while closing; all sinks were still attempted.
#[derive(Debug, thiserror::Error)]
#[error("failed to close {} sink(s): {}", .failures.len(), join_failures(.failures))]
pub struct CloseError {
    pub failures: Vec<SinkError>,
}

fn join_failures(failures: &[SinkError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Handle owning the sink pipeline.
pub struct Logger {
    pipeline: Arc<dyn Sink>,
    designator: Arc<str>,
    threshold: Level,
    closed: AtomicBool,
}

impl Logger {
    /// Validates `config`, opens the local sink and, when configured,
    /// bootstraps the remote schema and starts the shipping sink.
    pub fn open(config: &Config) -> Result<Self, OpenError> {
        config.validate()?;
        let threshold = config.level()?;

        let file = LogfmtSink::open_target(&config.file).map_err(|source| OpenError::File {
            path: config.file.clone(),
            source,
        })?;
        let mut router = RecordRouter::new(config.designator.as_str(), Arc::new(file));

        if let Some(es) = &config.es {
            let shipping = open_remote(es, &config.designator)?;
            router.add_route(REMOTE_ROUTE, Arc::new(shipping));
        }

        info!(
            "Logger opened: file={} level={} remote={}",
            config.file,
            threshold,
            config.es.is_some()
        );
        Ok(Self::from_router(router, threshold))
    }

    /// Builds a logger over an already configured router.
    #[must_use]
    pub fn from_router(router: RecordRouter, threshold: Level) -> Self {
        let designator: Arc<str> = Arc::from(router.designator());
        let pipeline = SeverityFilter::new(TimestampSink::new(router), threshold);
        Self {
            pipeline: Arc::new(pipeline),
            designator,
            threshold,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns a fresh accumulator dispatching into this logger.
    #[must_use]
    pub fn record_builder(&self) -> FieldAccumulator {
        FieldAccumulator::with_designator(Arc::clone(&self.pipeline), Arc::clone(&self.designator))
    }

    #[must_use]
    pub fn threshold(&self) -> Level {
        self.threshold
    }

    /// Flushes and releases every sink. Later calls do nothing.
    pub fn close(&self) -> Result<(), CloseError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!("Closing logger");
        match self.pipeline.close() {
            Ok(()) => Ok(()),
            Err(SinkError::Multiple(failures)) => Err(CloseError { failures }),
            Err(e) => Err(CloseError { failures: vec![e] }),
        }
    }
}

fn open_remote(es: &EsConfig, designator: &str) -> Result<ShippingSink, OpenError> {
    let client = HttpClient::new(&es.addr, es.auth(), es.timeout()).map_err(OpenError::Client)?;
    let report = SchemaBootstrapper::with_designator(client, designator).bootstrap()?;
    debug!(
        "Storage schema ready at {}, {} artifact(s) created",
        es.addr,
        report.created()
    );
    Ok(ShippingSink::new(es.shipping_config())?)
}
