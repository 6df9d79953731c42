//! Echo controller used by the `bridgeapi` binary.
//!
//! Mounted under `/echo`, it answers every verb with what it was given:
//!
//! | Route | Result |
//! |---|---|
//! | `GET /echo/:resource?verbose=` | `{"resource", "verbose"}` |
//! | `POST\|PUT\|PATCH /echo/:resource` | `{"resource", "body"}` |
//! | `DELETE /echo/:resource` | `{"deleted": resource}` |
//! | `GET /echo/fail` | always fails, to show error reduction |

use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::dispatcher::{Controller, Dispatcher};
use crate::envelope::Method;
use crate::params::Param;
use crate::router::RouteSpec;
use crate::runtime_config::BridgeConfig;

/// Base path the echo controller is mounted under.
pub const ECHO_BASE_PATH: &str = "/echo";

#[derive(Debug, Default)]
pub struct EchoController {
    served: AtomicU64,
}

impl EchoController {
    fn next_seq(&self) -> u64 {
        self.served.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn with_body(this: &Arc<Self>, method: Method) -> RouteSpec {
        let this = Arc::clone(this);
        RouteSpec::new(method, "/:resource")
            .name(format!("echo_{}", method.as_str().to_ascii_lowercase()))
            .param(Param::path("resource").of::<String>())
            .param(Param::body::<Value>())
            .handle(move |mut args| {
                let resource: String = args.require(0)?;
                let body: Value = args.require(1)?;
                Ok(json!({ "seq": this.next_seq(), "resource": resource, "body": body }))
            })
    }
}

impl Controller for EchoController {
    fn routes(self: Arc<Self>) -> Vec<RouteSpec> {
        let get = Arc::clone(&self);
        let delete = Arc::clone(&self);
        vec![
            RouteSpec::get("/:resource")
                .name("echo_get")
                .param(Param::path("resource").of::<String>())
                .param(Param::query("verbose").of::<bool>())
                .handle(move |mut args| {
                    let resource: String = args.require(0)?;
                    let verbose = args.take::<bool>(1)?.unwrap_or(false);
                    Ok(json!({ "seq": get.next_seq(), "resource": resource, "verbose": verbose }))
                }),
            Self::with_body(&self, Method::Post),
            Self::with_body(&self, Method::Put),
            Self::with_body(&self, Method::Patch),
            RouteSpec::delete("/:resource")
                .name("echo_delete")
                .param(Param::path("resource").of::<String>())
                .handle(move |mut args| {
                    let resource: String = args.require(0)?;
                    Ok(json!({ "seq": delete.next_seq(), "deleted": resource }))
                }),
            RouteSpec::get("/fail")
                .name("echo_fail")
                .handle(|_| -> anyhow::Result<()> { anyhow::bail!("echo failure requested") }),
        ]
    }
}

/// Dispatcher with the echo controller mounted at [`ECHO_BASE_PATH`].
#[must_use]
pub fn echo_dispatcher(config: &BridgeConfig) -> Dispatcher {
    Dispatcher::builder()
        .with_config(config)
        .register_controller(ECHO_BASE_PATH, EchoController::default())
        .build()
}
