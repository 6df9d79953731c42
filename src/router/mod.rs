//! # Router Module
//!
//! The route table: path templates registered per base path, matched with a
//! trie.
//!
//! ## Templates
//!
//! A template is a `/`-separated list of segments. Literal segments match
//! exactly; a segment starting with `:` is a variable that matches any single
//! segment and binds its text under the variable's name.
//!
//! ```rust
//! use bridgeapi::envelope::Method;
//! use bridgeapi::router::{Router, RouteSpec};
//!
//! let mut router = Router::new();
//! router.register("/api/v1/users", vec![
//!     RouteSpec::get("/:id").handle(|_| Ok("user")),
//!     RouteSpec::get("/all").handle(|_| Ok("all users")),
//! ]);
//!
//! let m = router.route(Method::Get, "/api/v1/users/42").unwrap();
//! assert_eq!(m.get_path_param("id"), Some("42"));
//! assert!(router.route(Method::Get, "/api/v1/users").is_none());
//! ```
//!
//! ## Matching rules
//!
//! - A literal child is always tried before the variable child.
//! - There is no backtracking once a branch is taken.
//! - Conflicting variable names at the same position keep the first name.
//! - A path with no node, or a node without a route for the method, is a miss.
//!
//! Query strings are parsed separately with [`parse_query`].

mod core;
mod trie;

pub use core::{
    ensure_leading_slash, parse_query, split_segments, Handler, ParamVec, Route, RouteMatch,
    RouteSpec, Router, MAX_INLINE_PARAMS,
};
pub use trie::VARIABLE_MARKER;
