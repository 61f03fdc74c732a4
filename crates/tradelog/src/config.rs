// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Logger configuration.
//!
//! Sources are merged in order, later ones winning:
//! 1. built-in defaults
//! 2. an optional YAML file
//! 3. environment variables prefixed with `TRADELOG_`, nested keys split on
//!    `__` (`TRADELOG_ES__ADDR=127.0.0.1:9200`)
//!
//! ```yaml
//! file: stdout
//! level: 3
//! designator: es
//! es:
//!   addr: 127.0.0.1:9200
//!   user: elastic
//!   pass: secret
//!   stream: tests
//! ```

use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::filter::{InvalidLevel, Level};
use crate::http::BasicAuth;
use crate::router::DEFAULT_DESIGNATOR;
use crate::schema::stream_name;
use crate::sink::logfmt::STDOUT;
use crate::sink::shipping::{
    ShippingConfig, DEFAULT_FLUSH_INTERVAL, MAX_BATCH_ENTRIES, MAX_QUEUE_ENTRIES,
};

pub const ENV_PREFIX: &str = "TRADELOG_";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),
    #[error(transparent)]
    Level(#[from] InvalidLevel),
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log file path, or `stdout`.
    pub file: String,
    /// Severity threshold, 1 (error) to 4 (debug).
    pub level: i64,
    /// Field whose value routes a record to a sink.
    pub designator: String,
    /// Remote shipping; records stay local when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub es: Option<EsConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: STDOUT.to_string(),
            level: Level::Info.as_i64(),
            designator: DEFAULT_DESIGNATOR.to_string(),
            es: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsConfig {
    /// Endpoint, `host:port` or a full URL.
    pub addr: String,
    /// Basic auth user; no credentials are sent when empty.
    pub user: String,
    pub pass: String,
    /// Stream name without the `tradelog-` prefix.
    pub stream: String,
    pub timeout_secs: u64,
    pub flush_interval_secs: u64,
    pub max_batch_entries: usize,
}

impl Default for EsConfig {
    fn default() -> Self {
        Self {
            addr: String::new(),
            user: String::new(),
            pass: String::new(),
            stream: String::new(),
            timeout_secs: crate::http::DEFAULT_TIMEOUT.as_secs(),
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL.as_secs(),
            max_batch_entries: MAX_BATCH_ENTRIES,
        }
    }
}

impl EsConfig {
    #[must_use]
    pub fn auth(&self) -> Option<BasicAuth> {
        BasicAuth::from_parts(&self.user, &self.pass)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full data stream name, prefixed.
    #[must_use]
    pub fn stream_name(&self) -> String {
        stream_name(&self.stream)
    }

    #[must_use]
    pub fn shipping_config(&self) -> ShippingConfig {
        ShippingConfig {
            endpoint: self.addr.clone(),
            stream: self.stream_name(),
            auth: self.auth(),
            timeout: self.timeout(),
            flush_interval: Duration::from_secs(self.flush_interval_secs),
            max_batch_entries: self.max_batch_entries,
            max_queue_entries: MAX_QUEUE_ENTRIES.max(self.max_batch_entries),
        }
    }
}

impl Config {
    /// Source stack for `path`; exposed so callers can merge their own
    /// providers before extracting.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR))
    }

    /// Loads and validates configuration from defaults, `path` and the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment(path))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.level()?;
        if self.file.trim().is_empty() {
            return Err(invalid("file", "must be a path or `stdout`"));
        }
        if self.designator.is_empty() {
            return Err(invalid("designator", "must not be empty"));
        }
        if let Some(es) = &self.es {
            if es.addr.trim().is_empty() {
                return Err(invalid("es.addr", "must not be empty"));
            }
            if es.stream.is_empty() {
                return Err(invalid("es.stream", "must not be empty"));
            }
            if es.max_batch_entries == 0 {
                return Err(invalid("es.max_batch_entries", "must be at least 1"));
            }
        }
        Ok(())
    }

    pub fn level(&self) -> Result<Level, ConfigError> {
        Ok(Level::try_from(self.level)?)
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
