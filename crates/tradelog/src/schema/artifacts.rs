// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Storage schema artifacts: the field mapping component template and the
//! index template applying it to every `tradelog-*` data stream.

use serde::Serialize;
use serde_json::json;

use crate::router::DEFAULT_DESIGNATOR;

/// Prefix shared by data streams and template names.
pub const PREFIX: &str = "tradelog";
pub const COMPONENT_TEMPLATE_NAME: &str = "tradelog-datastreams";
pub const INDEX_TEMPLATE_NAME: &str = "tradelog-logs";
pub const INDEX_PATTERN: &str = "tradelog-*";
pub const SCHEMA_VERSION: u32 = 1;

const INDEX_TEMPLATE_PRIORITY: u32 = 200;

// Built-in component templates every data stream index template composes.
const LOGS_MAPPINGS: &str = "logs-mappings";
const LOGS_SETTINGS: &str = "logs-settings";

/// Name of the data stream holding records shipped under `name`.
#[must_use]
pub fn stream_name(name: &str) -> String {
    format!("{PREFIX}-{name}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    ComponentTemplate,
    IndexTemplate,
}

impl ArtifactKind {
    /// API path segment under which artifacts of this kind live.
    #[must_use]
    pub fn api_path(self) -> &'static str {
        match self {
            ArtifactKind::ComponentTemplate => "_component_template",
            ArtifactKind::IndexTemplate => "_index_template",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::ComponentTemplate => f.write_str("component template"),
            ArtifactKind::IndexTemplate => f.write_str("index template"),
        }
    }
}

/// A named, versioned schema object that must exist before records are shipped.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaArtifact {
    pub kind: ArtifactKind,
    pub name: String,
    pub version: u32,
    pub body: serde_json::Value,
}

impl SchemaArtifact {
    /// Request path relative to the endpoint.
    #[must_use]
    pub fn path(&self) -> String {
        format!("{}/{}", self.kind.api_path(), self.name)
    }
}

/// Field mappings for every record field the logger writes.
///
/// Unknown fields are not indexed (`dynamic: false`), and the `designator`
/// field is stored as a disabled object since it only drives routing.
#[must_use]
pub fn component_template(designator: &str) -> SchemaArtifact {
    let mut body = json!({
        "template": {
            "mappings": {
                "date_detection": false,
                "dynamic": false,
                "properties": {
                    "@timestamp": { "type": "date" },
                    "programme": { "type": "keyword" },
                    "event": { "type": "keyword" },
                    "level": { "type": "keyword" },
                    "exchange": { "type": "keyword" },
                    "symbol": { "type": "keyword" },
                    "id": { "type": "keyword" },
                    "error": { "type": "text" },
                    "message": { "type": "text" },
                },
            },
        },
        "version": SCHEMA_VERSION,
        "_meta": {
            "description": "field mappings for tradelog records",
        },
    });
    body["template"]["mappings"]["properties"][designator] =
        json!({ "type": "object", "enabled": false });
    SchemaArtifact {
        kind: ArtifactKind::ComponentTemplate,
        name: COMPONENT_TEMPLATE_NAME.to_string(),
        version: SCHEMA_VERSION,
        body,
    }
}

#[derive(Debug, Serialize)]
struct IndexTemplate<'a> {
    composed_of: [&'a str; 3],
    index_patterns: [&'a str; 1],
    priority: u32,
    version: u32,
    #[serde(rename = "_meta")]
    meta: Meta<'a>,
    data_stream: DataStream,
    allow_auto_create: bool,
}

#[derive(Debug, Serialize)]
struct Meta<'a> {
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct DataStream {
    hidden: bool,
}

/// Index template turning every `tradelog-*` name into a data stream.
#[must_use]
pub fn index_template() -> SchemaArtifact {
    let template = IndexTemplate {
        composed_of: [COMPONENT_TEMPLATE_NAME, LOGS_MAPPINGS, LOGS_SETTINGS],
        index_patterns: [INDEX_PATTERN],
        priority: INDEX_TEMPLATE_PRIORITY,
        version: SCHEMA_VERSION,
        meta: Meta {
            description: "index template for tradelog data streams",
        },
        data_stream: DataStream { hidden: false },
        allow_auto_create: true,
    };
    SchemaArtifact {
        kind: ArtifactKind::IndexTemplate,
        name: INDEX_TEMPLATE_NAME.to_string(),
        version: SCHEMA_VERSION,
        // Plain structs of strings and integers always serialize.
        body: serde_json::to_value(&template).unwrap_or_default(),
    }
}

/// Artifacts in the order they must be created.
#[must_use]
pub fn all(designator: &str) -> [SchemaArtifact; 2] {
    [component_template(designator), index_template()]
}
