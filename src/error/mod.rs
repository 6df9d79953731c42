//! # Error Module
//!
//! Failure taxonomy for the callee side and the Error Reducer that turns any
//! failure into a serializable response.
//!
//! - Route misses are *not* errors: the dispatcher answers them with the fixed
//!   not-found marker and never consults the reducer.
//! - Binding failures, handler failures and handler panics all reach the
//!   reducer as an [`anyhow::Error`]. Framework failures are a [`BridgeError`];
//!   handler failures keep whatever type the handler raised, so error handlers
//!   can match with `downcast_ref`.

mod reducer;

pub use reducer::{fallback_response, ErrorHandler, ErrorReducer};

use std::fmt;

/// Errors raised by the bridge itself.
#[derive(Debug)]
pub enum BridgeError {
    /// The incoming envelope was not valid JSON or missed a required field.
    MalformedEnvelope(serde_json::Error),
    /// A path/query/header/body value could not be converted to the declared type.
    Binding {
        /// Position of the parameter in the handler's declaration
        index: usize,
        /// Human-readable source, e.g. ``query `order` ``
        source: String,
        /// Declared target type
        expected: &'static str,
        /// Why conversion failed
        reason: String,
    },
    /// An enumeration parameter had no variant for the supplied external value.
    UnknownEnumValue {
        index: usize,
        source: String,
        enum_name: &'static str,
        value: String,
    },
    /// A handler required an argument that was not supplied by the request.
    MissingArgument { index: usize },
    /// A handler asked for an argument with a different type than was bound.
    ArgumentType {
        index: usize,
        requested: &'static str,
    },
    /// The handler panicked; the payload message is preserved.
    HandlerPanic { message: String },
    /// The handler result could not be serialized.
    ResponseSerialization(serde_json::Error),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::MalformedEnvelope(e) => write!(f, "malformed envelope: {e}"),
            BridgeError::Binding {
                index,
                source,
                expected,
                reason,
            } => write!(
                f,
                "cannot bind parameter #{index} ({source}) as {expected}: {reason}"
            ),
            BridgeError::UnknownEnumValue {
                index,
                source,
                enum_name,
                value,
            } => write!(
                f,
                "cannot bind parameter #{index} ({source}): no {enum_name} matches '{value}'"
            ),
            BridgeError::MissingArgument { index } => {
                write!(f, "required argument #{index} was not supplied")
            }
            BridgeError::ArgumentType { index, requested } => {
                write!(f, "argument #{index} is not a {requested}")
            }
            BridgeError::HandlerPanic { message } => write!(f, "handler panicked: {message}"),
            BridgeError::ResponseSerialization(e) => {
                write!(f, "failed to serialize response: {e}")
            }
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BridgeError::MalformedEnvelope(e) | BridgeError::ResponseSerialization(e) => Some(e),
            _ => None,
        }
    }
}

impl BridgeError {
    /// Whether this error was produced while binding parameters.
    #[must_use]
    pub fn is_binding(&self) -> bool {
        matches!(
            self,
            BridgeError::Binding { .. }
                | BridgeError::UnknownEnumValue { .. }
                | BridgeError::MissingArgument { .. }
                | BridgeError::ArgumentType { .. }
        )
    }

    /// Build a [`BridgeError::HandlerPanic`] from a `catch_unwind` payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        BridgeError::HandlerPanic { message }
    }
}
