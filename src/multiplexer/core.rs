use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::transport::Transport;
use crate::envelope::{Envelope, Method};
use crate::ids::CallId;
use crate::runtime_config::BridgeConfig;

/// Why a multiplexed call failed.
#[derive(Debug)]
pub enum CallError {
    /// No correlated result arrived in time.
    Timeout {
        id: CallId,
        method: Method,
        path_and_query: String,
        after: Duration,
    },
    /// The host rejected the call.
    Rejected { id: CallId, error: Value },
    /// The host resolved the call with something that is not JSON.
    MalformedResult { id: CallId, reason: String },
    /// The transport refused the envelope.
    Transport { id: CallId, reason: String },
    /// The envelope could not be serialized.
    Encode(serde_json::Error),
    /// Another outstanding call already uses this id.
    DuplicateId(CallId),
    /// The pending entry was dropped without an outcome.
    Abandoned(CallId),
    /// No tokio runtime was available to drive the call's timer.
    NoRuntime(CallId),
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Timeout {
                id,
                method,
                path_and_query,
                after,
            } => write!(
                f,
                "call {id} ({method} {path_and_query}) timed out after {}ms",
                after.as_millis()
            ),
            CallError::Rejected { id, error } => write!(f, "call {id} rejected: {error}"),
            CallError::MalformedResult { id, reason } => {
                write!(f, "call {id} resolved with malformed JSON: {reason}")
            }
            CallError::Transport { id, reason } => {
                write!(f, "call {id} could not be sent: {reason}")
            }
            CallError::Encode(e) => write!(f, "failed to encode envelope: {e}"),
            CallError::DuplicateId(id) => write!(f, "call id {id} is already pending"),
            CallError::Abandoned(id) => write!(f, "call {id} was abandoned"),
            CallError::NoRuntime(id) => write!(f, "call {id} issued outside a tokio runtime"),
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::Encode(e) => Some(e),
            _ => None,
        }
    }
}

impl CallError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CallError::Timeout { .. })
    }
}

type Outcome = Result<Value, CallError>;

struct PendingCall {
    reply: oneshot::Sender<Outcome>,
    timer: JoinHandle<()>,
    method: Method,
    path_and_query: String,
    issued_at: Instant,
}

/// Registry of outstanding calls keyed by id.
///
/// Every operation removes or inserts through the map's shard lock, so an
/// entry is completed by exactly one of resolve, reject, or expiry. Clones
/// share the same registry.
#[derive(Clone, Default)]
pub struct PendingCalls {
    inner: Arc<DashMap<CallId, PendingCall>>,
}

impl PendingCalls {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &CallId) -> bool {
        self.inner.contains_key(id)
    }

    /// Register a call and start its timer.
    ///
    /// The timer runs on the current tokio runtime; without one the call is
    /// refused with [`CallError::NoRuntime`] and nothing is registered.
    pub fn register(
        &self,
        id: CallId,
        envelope: &Envelope,
        timeout: Duration,
    ) -> Result<oneshot::Receiver<Outcome>, CallError> {
        let runtime = Handle::try_current().map_err(|_| CallError::NoRuntime(id))?;
        match self.inner.entry(id) {
            Entry::Occupied(_) => Err(CallError::DuplicateId(id)),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                // The shard lock held by `slot` keeps the timer from observing
                // the registry before the entry is inserted.
                let registry = self.clone();
                let timer = runtime.spawn(async move {
                    tokio::time::sleep(timeout).await;
                    registry.expire(id, timeout);
                });
                slot.insert(PendingCall {
                    reply: tx,
                    timer,
                    method: envelope.method,
                    path_and_query: envelope.path_and_query.clone(),
                    issued_at: Instant::now(),
                });
                debug!(
                    call_id = %id,
                    method = %envelope.method,
                    path_and_query = %envelope.path_and_query,
                    timeout_ms = timeout.as_millis(),
                    "Call issued"
                );
                Ok(rx)
            }
        }
    }

    /// Complete a call successfully. Returns `false` for an unknown id.
    pub fn resolve(&self, id: CallId, result: Value) -> bool {
        self.complete(id, Ok(result))
    }

    /// Fail a call with the host's error value. Returns `false` for an unknown id.
    pub fn reject(&self, id: CallId, error: Value) -> bool {
        self.complete(id, Err(CallError::Rejected { id, error }))
    }

    /// Host callback for a successful result.
    ///
    /// Unknown or unparseable ids are logged and dropped. A result that is not
    /// JSON fails the call with [`CallError::MalformedResult`].
    pub fn on_resolve(&self, id: &str, result_json: &str) -> bool {
        let Some(id) = parse_call_id(id) else {
            return false;
        };
        match serde_json::from_str::<Value>(result_json) {
            Ok(value) => self.resolve(id, value),
            Err(e) => self.complete(
                id,
                Err(CallError::MalformedResult {
                    id,
                    reason: e.to_string(),
                }),
            ),
        }
    }

    /// Host callback for a failure. A payload that is not JSON is kept as a string.
    pub fn on_reject(&self, id: &str, error_json: &str) -> bool {
        let Some(id) = parse_call_id(id) else {
            return false;
        };
        let error = serde_json::from_str::<Value>(error_json)
            .unwrap_or_else(|_| Value::String(error_json.to_string()));
        self.reject(id, error)
    }

    /// Drop every outstanding call; waiting callers get [`CallError::Abandoned`].
    pub fn abandon_all(&self) -> usize {
        let ids: Vec<CallId> = self.inner.iter().map(|e| *e.key()).collect();
        let mut dropped = 0;
        for id in ids {
            if let Some((_, call)) = self.inner.remove(&id) {
                call.timer.abort();
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!(count = dropped, "Outstanding calls abandoned");
        }
        dropped
    }

    /// Remove a call without an outcome; its caller sees [`CallError::Abandoned`].
    pub(crate) fn discard(&self, id: CallId) {
        if let Some((_, call)) = self.inner.remove(&id) {
            call.timer.abort();
        }
    }

    fn complete(&self, id: CallId, outcome: Outcome) -> bool {
        let Some((_, call)) = self.inner.remove(&id) else {
            warn!(call_id = %id, "Completion for unknown call id - dropped");
            return false;
        };
        call.timer.abort();
        debug!(
            call_id = %id,
            ok = outcome.is_ok(),
            elapsed_us = call.issued_at.elapsed().as_micros(),
            "Call completed"
        );
        if call.reply.send(outcome).is_err() {
            debug!(call_id = %id, "Caller no longer waiting");
        }
        true
    }

    fn expire(&self, id: CallId, after: Duration) {
        let Some((_, call)) = self.inner.remove(&id) else {
            return;
        };
        warn!(
            call_id = %id,
            method = %call.method,
            path_and_query = %call.path_and_query,
            timeout_ms = after.as_millis(),
            "Call timed out"
        );
        let timed_out = CallError::Timeout {
            id,
            method: call.method,
            path_and_query: call.path_and_query,
            after,
        };
        if call.reply.send(Err(timed_out)).is_err() {
            debug!(call_id = %id, "Caller no longer waiting");
        }
    }
}

impl fmt::Debug for PendingCalls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCalls")
            .field("outstanding", &self.inner.len())
            .finish()
    }
}

fn parse_call_id(raw: &str) -> Option<CallId> {
    match raw.parse::<CallId>() {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(call_id = %raw, error = %e, "Completion with unparseable call id - dropped");
            None
        }
    }
}

/// Issues concurrent calls over one [`Transport`].
#[derive(Clone)]
pub struct CallMultiplexer {
    pending: PendingCalls,
    transport: Arc<dyn Transport>,
    default_timeout: Duration,
}

impl CallMultiplexer {
    #[must_use]
    pub fn new(pending: PendingCalls, transport: Arc<dyn Transport>) -> Self {
        Self {
            pending,
            transport,
            default_timeout: BridgeConfig::default().call_timeout(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: &BridgeConfig) -> Self {
        self.default_timeout = config.call_timeout();
        self
    }

    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    #[must_use]
    pub fn pending(&self) -> &PendingCalls {
        &self.pending
    }

    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Send `envelope` and wait for its correlated result.
    ///
    /// `timeout` of `None` uses the default timeout. Must be polled inside a
    /// tokio runtime, otherwise it fails with [`CallError::NoRuntime`].
    pub async fn call(&self, envelope: Envelope, timeout: Option<Duration>) -> Result<Value, CallError> {
        let id = CallId::new();
        let raw = envelope.to_json().map_err(CallError::Encode)?;
        let rx = self
            .pending
            .register(id, &envelope, timeout.unwrap_or(self.default_timeout))?;

        if let Err(e) = self.transport.send(&id, &raw) {
            error!(call_id = %id, error = %e, "Transport failed to send call");
            self.pending.discard(id);
            return Err(CallError::Transport {
                id,
                reason: e.to_string(),
            });
        }

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(CallError::Abandoned(id)),
        }
    }

    pub async fn get(&self, path_and_query: &str) -> Result<Value, CallError> {
        self.call(Envelope::new(Method::Get, path_and_query), None)
            .await
    }

    pub async fn post(&self, path_and_query: &str, body: Value) -> Result<Value, CallError> {
        self.call(Envelope::new(Method::Post, path_and_query).with_body(body), None)
            .await
    }

    pub async fn put(&self, path_and_query: &str, body: Value) -> Result<Value, CallError> {
        self.call(Envelope::new(Method::Put, path_and_query).with_body(body), None)
            .await
    }

    pub async fn patch(&self, path_and_query: &str, body: Value) -> Result<Value, CallError> {
        self.call(Envelope::new(Method::Patch, path_and_query).with_body(body), None)
            .await
    }

    pub async fn delete(&self, path_and_query: &str) -> Result<Value, CallError> {
        self.call(Envelope::new(Method::Delete, path_and_query), None)
            .await
    }
}

impl fmt::Debug for CallMultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallMultiplexer")
            .field("pending", &self.pending)
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}
