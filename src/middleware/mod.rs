//! # Middleware Module
//!
//! The decorator chain wrapped around handler invocation.
//!
//! A [`ServiceDecorator`] receives the request context and the next
//! [`BridgeService`]. It may delegate (and post-process the result) or return
//! a response of its own, in which case nothing inside it runs. Decorators are
//! composed once, when the dispatcher is built:
//!
//! ```text
//! register_decorator(A); register_decorator(B);
//!
//! A ──▶ B ──▶ HandlerInvoker
//! A ◀── B ◀──
//! ```
//!
//! Closures with the signature
//! `Fn(RequestContext, &dyn BridgeService) -> anyhow::Result<BridgeResponse>`
//! are decorators too.

mod core;
mod measure;
mod tracing;

pub use core::{compose, BridgeService, HandlerInvoker, ServiceDecorator};
pub use measure::MeasureDecorator;
pub use tracing::TracingDecorator;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::RequestContext;
    use crate::envelope::{BridgeResponse, Method};
    use crate::router::RouteSpec;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn context(counter: Arc<AtomicUsize>) -> RequestContext {
        let spec = RouteSpec::get("/probe").handle(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("handled")
        });
        RequestContext::for_spec("/probe", spec)
    }

    fn recorder(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<dyn ServiceDecorator> {
        Arc::new(move |ctx: RequestContext, next: &dyn BridgeService| {
            log.lock().unwrap().push(format!("before {name}"));
            let res = next.serve(ctx);
            log.lock().unwrap().push(format!("after {name}"));
            res
        })
    }

    #[test]
    fn test_compose_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hits = Arc::new(AtomicUsize::new(0));
        let chain = compose(
            &[recorder("a", Arc::clone(&log)), recorder("b", Arc::clone(&log))],
            Arc::new(HandlerInvoker),
        );
        let res = chain.serve(context(Arc::clone(&hits))).unwrap();
        assert_eq!(res.body, json!("handled"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["before a", "before b", "after b", "after a"]
        );
    }

    #[test]
    fn test_short_circuit_skips_inner() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hits = Arc::new(AtomicUsize::new(0));
        let stop: Arc<dyn ServiceDecorator> =
            Arc::new(|ctx: RequestContext, next: &dyn BridgeService| {
                if ctx.method == Method::Get {
                    return Ok(BridgeResponse::new(json!("stopped")));
                }
                next.serve(ctx)
            });
        let chain = compose(
            &[stop, recorder("inner", Arc::clone(&log))],
            Arc::new(HandlerInvoker),
        );
        let res = chain.serve(context(Arc::clone(&hits))).unwrap();
        assert_eq!(res.body, json!("stopped"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_chain_is_base() {
        let hits = Arc::new(AtomicUsize::new(0));
        let chain = compose(&[], Arc::new(HandlerInvoker));
        chain.serve(context(Arc::clone(&hits))).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_measure_counts_calls_and_failures() {
        let measure = Arc::new(MeasureDecorator::new());
        let failing = RequestContext::for_spec(
            "/fail",
            RouteSpec::get("/fail").handle(|_| -> anyhow::Result<()> { anyhow::bail!("nope") }),
        );
        let chain = compose(
            &[Arc::clone(&measure) as Arc<dyn ServiceDecorator>],
            Arc::new(HandlerInvoker),
        );
        chain.serve(context(Arc::new(AtomicUsize::new(0)))).unwrap();
        assert!(chain.serve(failing).is_err());
        assert_eq!(measure.request_count(), 2);
        assert_eq!(measure.failure_count(), 1);
        assert!(measure.max_latency() >= measure.average_latency());
    }

    #[test]
    fn test_tracing_passes_through() {
        let hits = Arc::new(AtomicUsize::new(0));
        let tracing: Arc<dyn ServiceDecorator> = Arc::new(TracingDecorator);
        let chain = compose(&[tracing], Arc::new(HandlerInvoker));
        let res = chain.serve(context(Arc::clone(&hits))).unwrap();
        assert_eq!(res.body, json!("handled"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
