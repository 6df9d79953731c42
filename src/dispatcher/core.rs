use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::envelope::{split_path_and_query, BridgeResponse, Envelope, Method, NOT_FOUND_MARKER};
use crate::error::{BridgeError, ErrorHandler, ErrorReducer};
use crate::middleware::{
    compose, BridgeService, HandlerInvoker, MeasureDecorator, ServiceDecorator, TracingDecorator,
};
use crate::params::{bind, header_value, Args, BindingSources};
use crate::router::{parse_query, ParamVec, Route, RouteSpec, Router};
use crate::runtime_config::BridgeConfig;

/// Per-request state handed through the decorator chain.
///
/// Parameters are already bound when a decorator sees the context; the
/// innermost service takes the arguments and invokes the handler.
pub struct RequestContext {
    pub route: Arc<Route>,
    pub method: Method,
    /// Path without the query string.
    pub path: String,
    /// Non-empty path segments.
    pub segments: Vec<String>,
    pub path_variables: ParamVec,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Value,
    args: Args,
}

impl RequestContext {
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_variables
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Exact key first, then ASCII case-insensitive.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    /// Whether any path segment equals `segment`.
    #[must_use]
    pub fn has_segment(&self, segment: &str) -> bool {
        self.segments.iter().any(|s| s == segment)
    }

    #[must_use]
    pub fn args(&self) -> &Args {
        &self.args
    }

    /// Move the bound arguments out, leaving an empty list.
    pub fn take_args(&mut self) -> Args {
        std::mem::take(&mut self.args)
    }

    #[cfg(test)]
    pub(crate) fn for_spec(path: &str, spec: RouteSpec) -> Self {
        let route = Arc::new(Route::from_spec(path.to_string(), spec));
        Self {
            method: route.method(),
            path: path.to_string(),
            segments: crate::router::split_segments(path),
            route,
            path_variables: ParamVec::new(),
            query: HashMap::new(),
            headers: HashMap::new(),
            body: Value::Null,
            args: Args::default(),
        }
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("route", &self.route.name())
            .field("method", &self.method)
            .field("path", &self.path)
            .field("path_variables", &self.path_variables)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// A group of operations registered under one base path.
///
/// Handlers usually capture a clone of the `Arc` to reach controller state.
pub trait Controller: Send + Sync + 'static {
    fn routes(self: Arc<Self>) -> Vec<RouteSpec>;
}

/// Collects registrations; [`DispatcherBuilder::build`] freezes them.
pub struct DispatcherBuilder {
    registrations: Vec<(String, Vec<RouteSpec>)>,
    error_handlers: Vec<Arc<dyn ErrorHandler>>,
    decorators: Vec<Arc<dyn ServiceDecorator>>,
    config: BridgeConfig,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            registrations: Vec::new(),
            error_handlers: Vec::new(),
            decorators: Vec::new(),
            config: BridgeConfig::default(),
        }
    }
}

impl DispatcherBuilder {
    #[must_use]
    pub fn with_config(mut self, config: &BridgeConfig) -> Self {
        self.config = *config;
        self
    }

    #[must_use]
    pub fn register_controller<C: Controller>(self, base_path: &str, controller: C) -> Self {
        self.register_shared_controller(base_path, Arc::new(controller))
    }

    #[must_use]
    pub fn register_shared_controller<C: Controller>(self, base_path: &str, controller: Arc<C>) -> Self {
        let routes = controller.routes();
        self.register_routes(base_path, routes)
    }

    #[must_use]
    pub fn register_routes(mut self, base_path: &str, routes: Vec<RouteSpec>) -> Self {
        debug!(base_path = %base_path, routes = routes.len(), "Controller registered");
        self.registrations.push((base_path.to_string(), routes));
        self
    }

    #[must_use]
    pub fn register_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handlers.push(handler);
        self
    }

    #[must_use]
    pub fn register_all_error_handlers(
        mut self,
        handlers: impl IntoIterator<Item = Arc<dyn ErrorHandler>>,
    ) -> Self {
        self.error_handlers.extend(handlers);
        self
    }

    #[must_use]
    pub fn register_decorator(mut self, decorator: Arc<dyn ServiceDecorator>) -> Self {
        self.decorators.push(decorator);
        self
    }

    #[must_use]
    pub fn register_all_decorators(
        mut self,
        decorators: impl IntoIterator<Item = Arc<dyn ServiceDecorator>>,
    ) -> Self {
        self.decorators.extend(decorators);
        self
    }

    /// Build the route table and compose the decorator chain.
    ///
    /// Built-in decorators enabled in the config wrap the registered ones.
    #[must_use]
    pub fn build(self) -> Dispatcher {
        let mut router = Router::new();
        for (base_path, routes) in self.registrations {
            router.register(&base_path, routes);
        }

        let mut chain: Vec<Arc<dyn ServiceDecorator>> = Vec::with_capacity(self.decorators.len() + 2);
        let measure = self.config.measure_execution.then(|| Arc::new(MeasureDecorator::new()));
        if let Some(m) = &measure {
            chain.push(Arc::clone(m) as Arc<dyn ServiceDecorator>);
        }
        if self.config.trace_requests {
            chain.push(Arc::new(TracingDecorator));
        }
        chain.extend(self.decorators);

        let service = compose(&chain, Arc::new(HandlerInvoker));

        info!(
            routes_count = router.len(),
            decorators = chain.len(),
            error_handlers = self.error_handlers.len(),
            "Dispatcher initialized"
        );
        router.dump_routes();

        Dispatcher {
            router,
            service,
            reducer: ErrorReducer::new(self.error_handlers),
            measure,
        }
    }
}

/// Envelope in, response string out.
///
/// Read-only after [`DispatcherBuilder::build`]; share it with `Arc` to
/// dispatch from several threads.
pub struct Dispatcher {
    router: Router,
    service: Arc<dyn BridgeService>,
    reducer: ErrorReducer,
    measure: Option<Arc<MeasureDecorator>>,
}

impl Dispatcher {
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Timing counters, when measurement is enabled.
    #[must_use]
    pub fn measurements(&self) -> Option<&MeasureDecorator> {
        self.measure.as_deref()
    }

    /// Parse a wire envelope and route it.
    ///
    /// An envelope that does not parse is reduced like any other failure.
    #[must_use]
    pub fn bridge_request(&self, raw_envelope: &str) -> String {
        match Envelope::from_json(raw_envelope) {
            Ok(envelope) => self.routing_request(
                &envelope.path_and_query,
                envelope.method,
                envelope.headers,
                envelope.body,
            ),
            Err(e) => self.reduce(anyhow::Error::new(e)),
        }
    }

    /// Route a request given as parts.
    ///
    /// Returns the serialized handler result, the not-found marker, or a
    /// reduced error body. Never panics on handler failure.
    #[must_use]
    pub fn routing_request(
        &self,
        path_and_query: &str,
        method: Method,
        headers: HashMap<String, String>,
        body: Value,
    ) -> String {
        debug!(path_and_query = %path_and_query, method = %method, "Routing request");
        match self.serve(path_and_query, method, headers, body) {
            Ok(Some(response)) => match response.to_wire() {
                Ok(wire) => {
                    debug!(path_and_query = %path_and_query, "Routing success");
                    wire
                }
                Err(e) => self.reduce(anyhow::Error::new(e)),
            },
            Ok(None) => {
                warn!(path_and_query = %path_and_query, method = %method, "Route not found");
                NOT_FOUND_MARKER.to_string()
            }
            Err(e) => self.reduce(e),
        }
    }

    /// Match, bind and run the chain. `Ok(None)` is a route miss.
    ///
    /// A panic anywhere past the route lookup, including in user conversion
    /// code called while binding, comes back as [`BridgeError::HandlerPanic`].
    fn serve(
        &self,
        path_and_query: &str,
        method: Method,
        headers: HashMap<String, String>,
        body: Value,
    ) -> anyhow::Result<Option<BridgeResponse>> {
        let (path, query) = split_path_and_query(path_and_query);
        let Some(matched) = self.router.route(method, path) else {
            return Ok(None);
        };

        match catch_unwind(AssertUnwindSafe(|| -> anyhow::Result<BridgeResponse> {
            let query = parse_query(query);
            let args = bind(
                matched.route.params(),
                &BindingSources {
                    path_variables: &matched.path_params,
                    query: &query,
                    headers: &headers,
                    body: &body,
                },
            )?;

            let ctx = RequestContext {
                route: matched.route,
                method,
                path: path.to_string(),
                segments: crate::router::split_segments(path),
                path_variables: matched.path_params,
                query,
                headers,
                body,
                args,
            };
            self.service.serve(ctx)
        })) {
            Ok(result) => result.map(Some),
            Err(payload) => Err(BridgeError::from_panic(payload.as_ref()).into()),
        }
    }

    fn reduce(&self, cause: anyhow::Error) -> String {
        error!(error = %cause, "Routing error");
        self.reducer.reduce(&cause).to_string()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("error_handlers", &self.reducer.len())
            .finish_non_exhaustive()
    }
}
