//! # Params Module
//!
//! Declarative parameter bindings and the binder that resolves them.
//!
//! Every route declares an ordered list of [`ParamSpec`]s. Each spec names one
//! source (path variable, query key, header key, or the whole body) and one
//! target type. At dispatch time [`bind`] produces an [`Args`] value holding
//! one slot per declared parameter, in declaration order:
//!
//! ```rust
//! use bridgeapi::params::Param;
//!
//! let specs = vec![
//!     Param::path("id").of::<i64>(),
//!     Param::query("verbose").of::<bool>(),
//!     Param::body::<serde_json::Value>(),
//! ];
//! assert_eq!(specs.len(), 3);
//! ```
//!
//! ## Rules
//!
//! - Path, query and header values are plain strings converted with
//!   [`FromParam`] or, for enumerations, [`ExternalEnum::from_external`].
//! - A source entry that is missing binds to an absent slot; the handler decides
//!   whether that is acceptable ([`Args::take`] vs [`Args::require`]).
//! - A body parameter always attempts decoding, even for an empty body.
//! - Conversion failures are reported as [`crate::error::BridgeError`]
//!   binding errors and go through the error reducer.

mod core;

pub use core::{
    bind, header_value, Args, BindingSources, ExternalEnum, FromParam, Param, ParamSource, ParamSpec,
};
