use std::sync::Arc;

use crate::dispatcher::RequestContext;
use crate::envelope::BridgeResponse;

/// Something that turns a request into a response.
pub trait BridgeService: Send + Sync {
    fn serve(&self, ctx: RequestContext) -> anyhow::Result<BridgeResponse>;
}

/// A wrapper around the next service in the chain.
///
/// Call `next.serve(ctx)` to delegate, or return without calling it to
/// short-circuit. Errors are propagated, not handled here.
pub trait ServiceDecorator: Send + Sync {
    fn serve(&self, ctx: RequestContext, next: &dyn BridgeService) -> anyhow::Result<BridgeResponse>;
}

impl<F> ServiceDecorator for F
where
    F: Fn(RequestContext, &dyn BridgeService) -> anyhow::Result<BridgeResponse> + Send + Sync,
{
    fn serve(&self, ctx: RequestContext, next: &dyn BridgeService) -> anyhow::Result<BridgeResponse> {
        self(ctx, next)
    }
}

/// Innermost service: runs the matched route's handler with the bound arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct HandlerInvoker;

impl BridgeService for HandlerInvoker {
    fn serve(&self, mut ctx: RequestContext) -> anyhow::Result<BridgeResponse> {
        let args = ctx.take_args();
        ctx.route.invoke(args).map(BridgeResponse::new)
    }
}

struct Decorated {
    decorator: Arc<dyn ServiceDecorator>,
    next: Arc<dyn BridgeService>,
}

impl BridgeService for Decorated {
    fn serve(&self, ctx: RequestContext) -> anyhow::Result<BridgeResponse> {
        self.decorator.serve(ctx, self.next.as_ref())
    }
}

/// Fold `decorators` around `base`, the last one innermost.
///
/// The first decorator sees the request first and the response last.
#[must_use]
pub fn compose(
    decorators: &[Arc<dyn ServiceDecorator>],
    base: Arc<dyn BridgeService>,
) -> Arc<dyn BridgeService> {
    decorators.iter().rev().fold(base, |next, decorator| {
        Arc::new(Decorated {
            decorator: Arc::clone(decorator),
            next,
        })
    })
}
