//! # Multiplexer Module
//!
//! Caller-side correlation of many concurrent calls over one transport.
//!
//! ## Lifecycle of a call
//!
//! 1. [`CallMultiplexer::call`] generates a [`CallId`](crate::ids::CallId),
//!    registers a pending entry in [`PendingCalls`] and starts its timer
//! 2. The serialized envelope goes out through [`Transport::send`]
//! 3. The host answers through [`PendingCalls::on_resolve`] or
//!    [`PendingCalls::on_reject`]; the entry is removed and the caller wakes
//! 4. If the timer fires first the entry is removed and the caller gets
//!    [`CallError::Timeout`]; a late answer is an unknown id and is dropped
//!
//! Exactly one of resolve, reject and expiry completes an entry.
//!
//! ```rust
//! use bridgeapi::multiplexer::{CallMultiplexer, PendingCalls};
//! use bridgeapi::ids::CallId;
//! use std::sync::{Arc, Mutex};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sent: Arc<Mutex<Vec<CallId>>> = Arc::default();
//! let log = Arc::clone(&sent);
//! let pending = PendingCalls::new();
//! let mux = CallMultiplexer::new(
//!     pending.clone(),
//!     Arc::new(move |id: &CallId, _envelope: &str| -> anyhow::Result<()> {
//!         log.lock().unwrap().push(*id);
//!         Ok(())
//!     }),
//! );
//!
//! let call = tokio::spawn(async move { mux.get("/ping").await });
//! while sent.lock().unwrap().is_empty() {
//!     tokio::task::yield_now().await;
//! }
//! let id = sent.lock().unwrap()[0];
//! pending.on_resolve(&id.to_string(), "\"pong\"");
//! assert_eq!(call.await.unwrap().unwrap(), serde_json::json!("pong"));
//! # }
//! ```

mod core;
mod transport;

pub use core::{CallError, CallMultiplexer, PendingCalls};
pub use transport::{LoopbackTransport, Transport};
