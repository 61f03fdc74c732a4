// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Blocking HTTP client shared by the schema bootstrapper and the shipping sink.
//!
//! Every call in this crate happens on the caller's thread, so the client is
//! `reqwest::blocking`. The client carries the endpoint base URL and the
//! optional Basic credentials, and applies them to every request it builds.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;

/// Default request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Basic credentials sent when a username is configured.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    /// Returns credentials only when `username` is non-empty.
    #[must_use]
    pub fn from_parts(username: &str, password: &str) -> Option<Self> {
        if username.is_empty() {
            return None;
        }
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// HTTP client bound to one endpoint.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    auth: Option<BasicAuth>,
}

impl HttpClient {
    pub fn new(
        endpoint: &str,
        auth: Option<BasicAuth>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Some(Duration::from_secs(270)))
            .tcp_keepalive(Some(Duration::from_secs(120)))
            .build()?;
        Ok(Self {
            client,
            base_url: normalize_endpoint(endpoint),
            auth,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins `path` (with or without a leading slash) onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Builds a request for `path`, attaching credentials when configured.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.auth {
            Some(auth) => builder.basic_auth(&auth.username, Some(&auth.password)),
            None => builder,
        }
    }
}

/// Ensures the endpoint has a scheme and no trailing slash.
///
/// Endpoints are usually configured as `host:port`; plain HTTP is assumed
/// in that case.
#[must_use]
pub fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
