// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Field values and finished records.
//!
//! A [`Record`] is the unit every sink consumes: a set of uniquely named
//! fields, iterated in name order, which is the flat key/value sequence a
//! writer serializes. Values are a closed set of variants so that every
//! serializer (logfmt, JSON documents) handles them exhaustively.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Name of the timestamp field injected when a record is dispatched.
pub const TIMESTAMP_FIELD: &str = "@timestamp";

/// Value stored under a field name.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Opaque identifier correlating a series of records. Rendered as text.
    Id(String),
    /// Nested structured object, shipped as-is to document sinks.
    Object(serde_json::Map<String, serde_json::Value>),
}

impl Value {
    /// Returns the string payload of textual values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Id(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the value into its JSON document form.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) | Value::Id(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::from(*i),
            // NaN and infinities have no JSON form
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Object(map) => serde_json::Value::Object(map.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) | Value::Id(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Object(map) => {
                let rendered = serde_json::to_string(map).map_err(|_| fmt::Error)?;
                f.write_str(&rendered)
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) | Value::Id(s) => serializer.serialize_str(s),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::Float(_) => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Object(map) => map.serialize(serializer),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Value {
    fn from(value: serde_json::Map<String, serde_json::Value>) -> Self {
        Value::Object(value)
    }
}

/// A finished set of named fields.
///
/// Field names are unique; inserting an existing name replaces its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    /// Copies every field of `other` into `self`; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Record) {
        for (name, value) in other.iter() {
            self.fields.insert(name.clone(), value.clone());
        }
    }

    /// Renders the record as a JSON document.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}
