//! # bridgeapi
//!
//! **bridgeapi** lets one execution environment call into another with REST-style
//! verbs, paths, headers and JSON bodies, over a single narrow call channel that
//! knows nothing about routes or concurrent requests.
//!
//! ## Overview
//!
//! The crate has two sides:
//!
//! - **Callee side** - a [`Dispatcher`] parses an incoming envelope, matches it
//!   against a route trie, binds declared parameters, runs the handler through a
//!   short-circuiting decorator chain, and reduces any failure into a response.
//! - **Caller side** - a [`CallMultiplexer`] turns one transport primitive into
//!   many concurrent calls by correlating results with generated ids, failing
//!   calls whose result does not arrive in time.
//!
//! ## Architecture
//!
//! - **[`envelope`]** - wire data model: [`Envelope`], [`Method`], response markers
//! - **[`router`]** - path trie with literal and `:variable` segments
//! - **[`params`]** - parameter binding from path, query, header and body
//! - **[`middleware`]** - decorator chain and the built-in decorators
//! - **[`error`]** - error taxonomy and the ordered error reducer
//! - **[`dispatcher`]** - the callee-side entry points
//! - **[`multiplexer`]** - the caller-side pending-call registry and transports
//! - **[`callback`]** - completion scripts for script-evaluating hosts
//! - **[`runtime_config`]** and **[`logging`]** - configuration and `tracing` setup
//!
//! ### Call Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant Mux as CallMultiplexer
//!     participant T as Transport
//!     participant D as Dispatcher
//!     participant R as Router
//!     participant C as Decorator chain
//!     participant E as ErrorReducer
//!
//!     Caller->>Mux: call(envelope, timeout)
//!     Mux->>Mux: register id + start timer
//!     Mux->>T: send(id, envelope json)
//!     T->>D: bridge_request(envelope json)
//!     D->>R: route(method, path)
//!     alt no route
//!         R-->>D: None
//!         D-->>T: "404"
//!     else matched
//!         R-->>D: RouteMatch
//!         D->>D: bind parameters
//!         D->>C: serve(ctx)
//!         C-->>D: response or error
//!         opt error
//!             D->>E: reduce(error)
//!             E-->>D: reduced body
//!         end
//!         D-->>T: response json
//!     end
//!     T->>Mux: on_resolve(id, response json)
//!     Mux-->>Caller: Ok(value)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use bridgeapi::params::Param;
//! use bridgeapi::{Dispatcher, Method, RouteSpec};
//! use serde_json::{json, Value};
//! use std::collections::HashMap;
//!
//! let dispatcher = Dispatcher::builder()
//!     .register_routes(
//!         "/api/v1/users",
//!         vec![RouteSpec::get("/:id")
//!             .param(Param::path("id").of::<i64>())
//!             .handle(|mut args| {
//!                 let id: i64 = args.require(0)?;
//!                 Ok(json!({ "id": id, "name": "John" }))
//!             })],
//!     )
//!     .build();
//!
//! let response = dispatcher.routing_request("/api/v1/users/1", Method::Get, HashMap::new(), Value::Null);
//! assert_eq!(response, r#"{"id":1,"name":"John"}"#);
//! ```
//!
//! ## Wire Format
//!
//! A request envelope is
//! `{"pathAndQuery": "...", "method": "GET", "headers": {...}, "body": ...}`;
//! `headers` may be omitted. A response is the handler's JSON value, the bare
//! string `404` when no route matched, or the reduced error body.
//!
//! ## Binary
//!
//! The `bridgeapi` binary routes envelopes through an echo controller; see
//! [`cli`].

pub mod callback;
pub mod cli;
pub mod dispatcher;
pub mod echo;
pub mod envelope;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod multiplexer;
pub mod params;
pub mod router;
pub mod runtime_config;

pub use dispatcher::{Controller, Dispatcher, DispatcherBuilder, RequestContext};
pub use envelope::{BridgeResponse, Envelope, Method};
pub use error::{BridgeError, ErrorHandler, ErrorReducer};
pub use ids::CallId;
pub use middleware::{BridgeService, ServiceDecorator};
pub use multiplexer::{CallError, CallMultiplexer, PendingCalls, Transport};
pub use router::{RouteSpec, Router};
pub use runtime_config::BridgeConfig;
