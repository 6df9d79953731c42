use serde_json::{json, Value};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

/// Converts a failure into a response body, or passes.
///
/// Returning `None` means "not applicable, try the next handler".
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, cause: &anyhow::Error) -> Option<Value>;
}

impl<F> ErrorHandler for F
where
    F: Fn(&anyhow::Error) -> Option<Value> + Send + Sync,
{
    fn handle(&self, cause: &anyhow::Error) -> Option<Value> {
        self(cause)
    }
}

/// Body produced when no registered handler accepts a failure.
#[must_use]
pub fn fallback_response(cause: &anyhow::Error) -> Value {
    json!({
        "status": 500,
        "message": cause.to_string(),
    })
}

/// Ordered list of error handlers; first match wins.
#[derive(Clone, Default)]
pub struct ErrorReducer {
    handlers: Vec<Arc<dyn ErrorHandler>>,
}

impl ErrorReducer {
    #[must_use]
    pub fn new(handlers: Vec<Arc<dyn ErrorHandler>>) -> Self {
        Self { handlers }
    }

    pub fn push(&mut self, handler: Arc<dyn ErrorHandler>) {
        self.handlers.push(handler);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Reduce a failure to a response body.
    ///
    /// Handlers are tried in registration order. A handler that returns
    /// `Some(Value::Null)` or panics is treated as a pass.
    #[must_use]
    pub fn reduce(&self, cause: &anyhow::Error) -> Value {
        for (idx, handler) in self.handlers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler.handle(cause))) {
                Ok(Some(body)) if !body.is_null() => {
                    debug!(handler_idx = idx, "Error handler matched");
                    return body;
                }
                Ok(_) => {}
                Err(_) => {
                    error!(handler_idx = idx, cause = %cause, "Error handler panicked - skipped");
                }
            }
        }
        fallback_response(cause)
    }
}
