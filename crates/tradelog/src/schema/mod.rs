// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Idempotent bootstrap of the remote storage schema.
//!
//! Each artifact goes through the same steps:
//!
//! ```text
//!   GET <kind>/<name>
//!     2xx  -> present
//!     404  -> PUT <kind>/<name> with the JSON body
//!               2xx                                 -> present (created)
//!               409, or 400 resource_already_exists -> present
//!               anything else                       -> failed
//!     else -> failed
//! ```
//!
//! Artifacts are only ever created, never updated: an endpoint that already
//! has one keeps its version even when the body here changes.

pub mod artifacts;

use reqwest::{Method, StatusCode};
use tracing::debug;

use crate::http::HttpClient;
use crate::router::DEFAULT_DESIGNATOR;

pub use artifacts::{stream_name, ArtifactKind, SchemaArtifact};

const ALREADY_EXISTS: &str = "resource_already_exists_exception";

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to reach storage endpoint for {kind} {name}: {source}")]
    Transport {
        kind: ArtifactKind,
        name: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("init {kind} {name} fail: bad response code {status} resp '{body}'")]
    UnexpectedStatus {
        kind: ArtifactKind,
        name: String,
        status: u16,
        body: String,
    },
}

/// Terminal state of one artifact after [`SchemaBootstrapper::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    /// Found on the endpoint.
    Existing,
    /// Created by this call.
    Created,
    /// Created concurrently by someone else between check and create.
    Raced,
}

impl ArtifactState {
    #[must_use]
    pub fn created(self) -> bool {
        self == ArtifactState::Created
    }
}

/// Outcome of a full bootstrap run, one entry per artifact in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub artifacts: Vec<(String, ArtifactState)>,
}

impl BootstrapReport {
    #[must_use]
    pub fn created(&self) -> usize {
        self.artifacts
            .iter()
            .filter(|(_, state)| state.created())
            .count()
    }
}

/// Ensures the schema artifacts exist on one storage endpoint.
#[derive(Debug, Clone)]
pub struct SchemaBootstrapper {
    client: HttpClient,
    designator: String,
}

impl SchemaBootstrapper {
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self::with_designator(client, DEFAULT_DESIGNATOR)
    }

    /// Bootstraps mappings for records routed on `designator`.
    #[must_use]
    pub fn with_designator(client: HttpClient, designator: impl Into<String>) -> Self {
        Self {
            client,
            designator: designator.into(),
        }
    }

    /// Ensures the component template and then the index template. Stops at
    /// the first failure, so the index template is never created without
    /// the mappings it composes.
    pub fn bootstrap(&self) -> Result<BootstrapReport, BootstrapError> {
        let mut report = BootstrapReport {
            artifacts: Vec::with_capacity(2),
        };
        for artifact in artifacts::all(&self.designator) {
            let state = self.ensure(&artifact)?;
            report.artifacts.push((artifact.name, state));
        }
        Ok(report)
    }

    /// Checks for `artifact` and creates it when absent.
    pub fn ensure(&self, artifact: &SchemaArtifact) -> Result<ArtifactState, BootstrapError> {
        let path = artifact.path();
        let transport = |source: reqwest::Error| BootstrapError::Transport {
            kind: artifact.kind,
            name: artifact.name.clone(),
            source,
        };

        let resp = self
            .client
            .request(Method::GET, &path)
            .send()
            .map_err(transport)?;
        let status = resp.status();
        if status.is_success() {
            debug!("{} {} already present", artifact.kind, artifact.name);
            return Ok(ArtifactState::Existing);
        }
        if status != StatusCode::NOT_FOUND {
            return Err(unexpected(artifact, status, resp.text().unwrap_or_default()));
        }

        let resp = self
            .client
            .request(Method::PUT, &path)
            .json(&artifact.body)
            .send()
            .map_err(transport)?;
        let status = resp.status();
        if status.is_success() {
            debug!(
                "Created {} {} version {}",
                artifact.kind, artifact.name, artifact.version
            );
            return Ok(ArtifactState::Created);
        }
        let body = resp.text().unwrap_or_default();
        if status == StatusCode::CONFLICT
            || (status == StatusCode::BAD_REQUEST && body.contains(ALREADY_EXISTS))
        {
            debug!(
                "{} {} created concurrently, treating as present",
                artifact.kind, artifact.name
            );
            return Ok(ArtifactState::Raced);
        }
        Err(unexpected(artifact, status, body))
    }
}

fn unexpected(artifact: &SchemaArtifact, status: StatusCode, body: String) -> BootstrapError {
    BootstrapError::UnexpectedStatus {
        kind: artifact.kind,
        name: artifact.name.clone(),
        status: status.as_u16(),
        body,
    }
}
