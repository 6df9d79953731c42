use tracing::{info_span, warn};

use super::{BridgeService, ServiceDecorator};
use crate::dispatcher::RequestContext;
use crate::envelope::BridgeResponse;

/// Runs the rest of the chain inside a `bridge_request` span.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDecorator;

impl ServiceDecorator for TracingDecorator {
    fn serve(&self, ctx: RequestContext, next: &dyn BridgeService) -> anyhow::Result<BridgeResponse> {
        let span = info_span!(
            "bridge_request",
            method = %ctx.method,
            path = %ctx.path,
            route = %ctx.route.name(),
        );
        span.in_scope(|| {
            let result = next.serve(ctx);
            if let Err(e) = &result {
                warn!(error = %e, "Request failed inside chain");
            }
            result
        })
    }
}
