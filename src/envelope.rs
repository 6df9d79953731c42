//! # Envelope Module
//!
//! The wire data model shared by both sides of the bridge.
//!
//! A request crosses the bridge as a single JSON object:
//!
//! ```json
//! {"pathAndQuery": "/api/v1/users/1?verbose=true",
//!  "method": "GET",
//!  "headers": {"X-Token": "abc"},
//!  "body": {"name": "John"}}
//! ```
//!
//! `headers` may be omitted or `null` and is then treated as an empty
//! map; `body` may be omitted and is then JSON `null`.
//!
//! A response is a bare JSON value: the handler's serialized return value,
//! the literal [`NOT_FOUND_MARKER`] when no route matched, or a reduced error
//! object. The two failure shapes are only distinguishable by content.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

/// Literal response emitted when no route matches the path and method.
pub const NOT_FOUND_MARKER: &str = "404";

/// Response emitted in place of a JSON `null` handler result.
pub const EMPTY_RESPONSE: &str = "{}";

/// The request verbs the bridge understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// All supported verbs, in declaration order.
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    #[must_use]
    pub fn is_get(&self) -> bool {
        *self == Method::Get
    }

    #[must_use]
    pub fn is_post(&self) -> bool {
        *self == Method::Post
    }

    #[must_use]
    pub fn is_patch(&self) -> bool {
        *self == Method::Patch
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unsupported verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported method '{}'", self.0)
    }
}

impl std::error::Error for UnknownMethod {}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// A request travelling over the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Path with an optional `?`-delimited query string.
    #[serde(rename = "pathAndQuery")]
    pub path_and_query: String,
    pub method: Method,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub headers: HashMap<String, String>,
    /// Opaque payload: any JSON value, or a raw JSON document carried as a string.
    #[serde(default)]
    pub body: Value,
}

fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<HashMap<String, String>, D::Error> {
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

impl Envelope {
    #[must_use]
    pub fn new(method: Method, path_and_query: impl Into<String>) -> Self {
        Self {
            path_and_query: path_and_query.into(),
            method,
            headers: HashMap::new(),
            body: Value::Null,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Parse an envelope from its wire form.
    pub fn from_json(raw: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(raw).map_err(BridgeError::MalformedEnvelope)
    }

    /// Serialize the envelope to its wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Split `pathAndQuery` at the first `?`.
    #[must_use]
    pub fn split_path_and_query(&self) -> (&str, &str) {
        split_path_and_query(&self.path_and_query)
    }
}

/// Split a `path?query` string at the first `?`. The query part is empty
/// when there is no `?`.
#[must_use]
pub fn split_path_and_query(path_and_query: &str) -> (&str, &str) {
    match path_and_query.split_once('?') {
        Some((path, query)) => (path, query),
        None => (path_and_query, ""),
    }
}

/// The result of running a handler (or a decorator that short-circuited).
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeResponse {
    pub body: Value,
}

impl BridgeResponse {
    #[must_use]
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// Build a response from any serializable value.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, BridgeError> {
        serde_json::to_value(value)
            .map(Self::new)
            .map_err(BridgeError::ResponseSerialization)
    }

    /// Render the wire form. A `null` body becomes `{}`.
    pub fn to_wire(&self) -> Result<String, BridgeError> {
        if self.body.is_null() {
            return Ok(EMPTY_RESPONSE.to_string());
        }
        serde_json::to_string(&self.body).map_err(BridgeError::ResponseSerialization)
    }
}

impl From<Value> for BridgeResponse {
    fn from(body: Value) -> Self {
        Self::new(body)
    }
}

/// Whether a raw response is the not-found marker.
#[must_use]
pub fn is_not_found(raw_response: &str) -> bool {
    raw_response.trim() == NOT_FOUND_MARKER
}
