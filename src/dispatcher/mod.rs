//! # Dispatcher Module
//!
//! The callee-side entry point: one envelope in, one response string out.
//!
//! ## Request Flow
//!
//! 1. Parse the envelope ([`Dispatcher::bridge_request`] only)
//! 2. Split path and query, match the route table
//! 3. On a miss, answer with the not-found marker; the error reducer is not consulted
//! 4. Bind declared parameters into a [`RequestContext`]
//! 5. Run the composed decorator chain, handler innermost
//! 6. Serialize the result (`null` becomes `{}`)
//!
//! Any failure in steps 1, 4, 5 or 6 (handler panics included) is converted by
//! the error reducer into a response body. Nothing escapes as a panic or error.
//!
//! ## Registration
//!
//! ```rust
//! use bridgeapi::dispatcher::Dispatcher;
//! use bridgeapi::envelope::Method;
//! use bridgeapi::params::Param;
//! use bridgeapi::router::RouteSpec;
//! use std::collections::HashMap;
//!
//! let dispatcher = Dispatcher::builder()
//!     .register_routes("api/v1/users", vec![
//!         RouteSpec::get("/:id")
//!             .param(Param::path("id").of::<i64>())
//!             .handle(|mut args| Ok(args.require::<i64>(0)? * 10)),
//!     ])
//!     .build();
//!
//! let out = dispatcher.routing_request("/api/v1/users/4", Method::Get, HashMap::new(), serde_json::Value::Null);
//! assert_eq!(out, "40");
//! assert_eq!(dispatcher.routing_request("/nope", Method::Get, HashMap::new(), serde_json::Value::Null), "404");
//! ```
//!
//! Registration finishes in [`DispatcherBuilder::build`]; the resulting
//! [`Dispatcher`] is immutable and can be shared across threads.

mod core;

pub use core::{Controller, Dispatcher, DispatcherBuilder, RequestContext};
