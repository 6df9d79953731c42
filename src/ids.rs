//! Call identifiers for the multiplexer.
//!
//! A [`CallId`] is a ULID: a 48-bit millisecond timestamp followed by 80
//! random bits. It is the only correlation key between a call and its
//! result:
//!
//! - [`crate::CallMultiplexer::call`] mints one per call and registers it in
//!   [`crate::PendingCalls`] before the envelope is handed to the transport.
//! - It crosses the transport as its 26-character Crockford base32 string,
//!   and the host passes that string back to `on_resolve` / `on_reject`.
//! - A string that does not parse back into a [`CallId`] is logged and
//!   dropped; it can never complete a call.
//!
//! Uniqueness is probabilistic. If two outstanding calls ever share an id,
//! [`crate::PendingCalls::register`] refuses the second with
//! [`crate::CallError::DuplicateId`] and leaves the first call untouched.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Correlation id of one outstanding call. Ordered by issue time at
/// millisecond granularity.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct CallId(pub ulid::Ulid);

impl CallId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    #[must_use]
    pub fn from_ulid(id: ulid::Ulid) -> Self {
        Self(id)
    }

    /// Milliseconds since the Unix epoch encoded in the id.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CallId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CallId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = ulid::Ulid::from_string(s)?;
        Ok(CallId(id))
    }
}

impl Serialize for CallId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CallId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<CallId>()
            .map_err(|e| serde::de::Error::custom(format!("invalid call id '{s}': {e}")))
    }
}
