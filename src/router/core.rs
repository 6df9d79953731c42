use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::trie::RouteTrie;
use crate::envelope::Method;
use crate::error::BridgeError;
use crate::params::{Args, ParamSpec};

/// Maximum number of path variables stored inline before spilling to the heap.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Path variable bindings in path order.
///
/// Names are shared with the trie node that declared them; values are the
/// request's segment text.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Type-erased handler body: positional arguments in, JSON value out.
pub type Handler = Arc<dyn Fn(Args) -> anyhow::Result<Value> + Send + Sync>;

/// Declaration of one operation before it is registered.
///
/// ```rust
/// use bridgeapi::params::Param;
/// use bridgeapi::router::RouteSpec;
///
/// let spec = RouteSpec::get("/users/:id")
///     .param(Param::path("id").of::<i64>())
///     .handle(|mut args| {
///         let id: i64 = args.require(0)?;
///         Ok(serde_json::json!({ "id": id }))
///     });
/// assert_eq!(spec.path(), "/users/:id");
/// ```
pub struct RouteSpec {
    method: Method,
    path: String,
    name: Option<String>,
    params: Vec<ParamSpec>,
    handler: Option<Handler>,
}

impl RouteSpec {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            name: None,
            params: Vec::new(),
            handler: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Name used in logs and route listings.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a parameter declaration. Order defines argument positions.
    #[must_use]
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Set the handler body. Its result is serialized to JSON.
    #[must_use]
    pub fn handle<F, R>(mut self, f: F) -> Self
    where
        F: Fn(Args) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Serialize,
    {
        self.handler = Some(Arc::new(move |args| {
            let out = f(args)?;
            serde_json::to_value(out)
                .map_err(|e| anyhow::Error::new(BridgeError::ResponseSerialization(e)))
        }));
        self
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }
}

impl fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSpec")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A registered operation.
pub struct Route {
    method: Method,
    path: String,
    name: String,
    params: Vec<ParamSpec>,
    handler: Option<Handler>,
}

impl Route {
    pub(crate) fn from_spec(full_path: String, spec: RouteSpec) -> Self {
        let name = spec
            .name
            .unwrap_or_else(|| format!("{} {}", spec.method, full_path));
        Self {
            method: spec.method,
            path: full_path,
            name,
            params: spec.params,
            handler: spec.handler,
        }
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Full path template, base path included.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Run the handler body with bound arguments.
    ///
    /// A route declared without a handler returns JSON `null`.
    pub fn invoke(&self, args: Args) -> anyhow::Result<Value> {
        match &self.handler {
            Some(handler) => handler(args),
            None => Ok(Value::Null),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Result of successfully matching a request path to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    /// Variable bindings in path order.
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path variable by name. The last binding with that name wins.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Non-empty `/`-separated segments of `path`.
#[must_use]
pub fn split_segments(path: &str) -> Vec<String> {
    super::trie::segments(path).map(str::to_string).collect()
}

/// Prefix `path` with `/` unless it already starts with one.
#[must_use]
pub fn ensure_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Parse a query string into a map.
///
/// Uses `application/x-www-form-urlencoded` decoding. Pairs with an empty key
/// or value (including pairs without `=`) are dropped; the last duplicate wins.
#[must_use]
pub fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// The route table.
///
/// Filled once with [`Router::register`] and read-only afterwards.
#[derive(Default)]
pub struct Router {
    trie: RouteTrie,
    routes: Vec<Arc<Route>>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one route per [`RouteSpec`] under `base_path`.
    ///
    /// The full path is `base_path` followed by the operation path with a
    /// leading `/`. An operation with the same method and full path as an
    /// existing route replaces it.
    pub fn register(&mut self, base_path: &str, specs: Vec<RouteSpec>) {
        for spec in specs {
            let full_path = format!("{base_path}{}", ensure_leading_slash(&spec.path));
            let method = spec.method;
            let route = Arc::new(Route::from_spec(full_path, spec));
            if let Some(replaced) = self.trie.insert(&route.path, method, Arc::clone(&route)) {
                warn!(
                    method = %method,
                    path = %route.path,
                    replaced = %replaced.name,
                    "Duplicate route registration - earlier route replaced"
                );
                self.routes.retain(|r| !Arc::ptr_eq(r, &replaced));
            }
            debug!(method = %method, path = %route.path, name = %route.name, "Route registered");
            self.routes.push(route);
        }
        info!(
            base_path = %base_path,
            routes_count = self.routes.len(),
            "Routing table updated"
        );
    }

    /// Match a path (without query) and method.
    #[must_use]
    pub fn route(&self, method: Method, path: &str) -> Option<RouteMatch> {
        let mut path_params = ParamVec::new();
        match self.trie.find(path, method, &mut path_params) {
            Some(route) => {
                debug!(
                    method = %method,
                    path = %path,
                    route = %route.name,
                    path_params = ?path_params,
                    "Route matched"
                );
                Some(RouteMatch { route, path_params })
            }
            None => {
                debug!(method = %method, path = %path, "No route matched");
                None
            }
        }
    }

    /// Registered routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// One line per route: `METHOD path -> name`.
    #[must_use]
    pub fn describe_routes(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|r| format!("{} {} -> {}", r.method, r.path, r.name))
            .collect()
    }

    /// Log every registered route at debug level.
    pub fn dump_routes(&self) {
        debug!(count = self.routes.len(), "Registered routes");
        for line in self.describe_routes() {
            debug!(route = %line, "Route");
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}
