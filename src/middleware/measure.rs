use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tracing::debug;

use super::{BridgeService, ServiceDecorator};
use crate::dispatcher::RequestContext;
use crate::envelope::BridgeResponse;

/// Decorator that times each call through the rest of the chain.
///
/// Logs the execution time at debug level and keeps lock-free counters that
/// can be read at any time.
#[derive(Debug, Default)]
pub struct MeasureDecorator {
    request_count: AtomicUsize,
    failure_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    max_latency_ns: AtomicU64,
}

impl MeasureDecorator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls that went through this decorator.
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Calls whose inner chain returned an error.
    pub fn failure_count(&self) -> usize {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Mean time spent in the inner chain; zero before the first call.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    pub fn max_latency(&self) -> Duration {
        Duration::from_nanos(self.max_latency_ns.load(Ordering::Relaxed))
    }
}

impl ServiceDecorator for MeasureDecorator {
    fn serve(&self, ctx: RequestContext, next: &dyn BridgeService) -> anyhow::Result<BridgeResponse> {
        let route = ctx.route.name().to_string();
        let start = Instant::now();
        let result = next.serve(ctx);
        let elapsed = start.elapsed();

        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns.fetch_add(nanos, Ordering::Relaxed);
        self.max_latency_ns.fetch_max(nanos, Ordering::Relaxed);
        if result.is_err() {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }

        debug!(
            route = %route,
            duration_us = elapsed.as_micros(),
            ok = result.is_ok(),
            "Execution time"
        );
        result
    }
}
