use std::sync::Arc;
use tracing::debug;

use super::core::PendingCalls;
use crate::dispatcher::Dispatcher;
use crate::ids::CallId;

/// The single call primitive crossing environments.
///
/// `send` hands the serialized envelope to the other side and returns at once.
/// The result comes back later through [`PendingCalls::on_resolve`] or
/// [`PendingCalls::on_reject`] with the same id.
pub trait Transport: Send + Sync {
    fn send(&self, id: &CallId, envelope: &str) -> anyhow::Result<()>;
}

impl<F> Transport for F
where
    F: Fn(&CallId, &str) -> anyhow::Result<()> + Send + Sync,
{
    fn send(&self, id: &CallId, envelope: &str) -> anyhow::Result<()> {
        self(id, envelope)
    }
}

/// In-process transport that dispatches directly.
///
/// Each call runs [`Dispatcher::bridge_request`] on tokio's blocking pool and
/// resolves the pending entry with the response.
#[derive(Clone)]
pub struct LoopbackTransport {
    dispatcher: Arc<Dispatcher>,
    pending: PendingCalls,
}

impl LoopbackTransport {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>, pending: PendingCalls) -> Self {
        Self {
            dispatcher,
            pending,
        }
    }
}

impl Transport for LoopbackTransport {
    fn send(&self, id: &CallId, envelope: &str) -> anyhow::Result<()> {
        let runtime = tokio::runtime::Handle::try_current()?;
        let dispatcher = Arc::clone(&self.dispatcher);
        let pending = self.pending.clone();
        let envelope = envelope.to_string();
        let id = *id;
        runtime.spawn_blocking(move || {
            let response = dispatcher.bridge_request(&envelope);
            debug!(call_id = %id, bytes = response.len(), "Loopback response ready");
            if !pending.on_resolve(&id.to_string(), &response) {
                debug!(call_id = %id, "Loopback response arrived after the call completed");
            }
        });
        Ok(())
    }
}

impl std::fmt::Debug for LoopbackTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackTransport")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
