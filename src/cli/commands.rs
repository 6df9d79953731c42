use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::echo::echo_dispatcher;
use crate::envelope::{Envelope, Method};
use crate::multiplexer::{CallMultiplexer, LoopbackTransport, PendingCalls};
use crate::runtime_config::BridgeConfig;

/// Command-line interface for the bridge demo
#[derive(Debug, Parser)]
#[command(name = "bridgeapi")]
#[command(about = "Route REST-style envelopes over an in-process bridge", long_about = None)]
pub struct Cli {
    /// YAML configuration file; environment variables override its values
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Route envelopes and print each response
    Dispatch {
        /// A single JSON envelope; without it, one envelope is read per stdin line
        #[arg(short, long)]
        envelope: Option<String>,
    },
    /// Issue one call through the multiplexer
    Call {
        #[arg(short, long, default_value = "GET")]
        method: Method,

        /// Path with an optional query string
        #[arg(short, long)]
        path: String,

        /// JSON body
        #[arg(short, long)]
        body: Option<String>,

        /// Per-call timeout; the configured default applies when omitted
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Print the route table
    Routes,
}

fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    let config = match path {
        Some(p) => BridgeConfig::load(p)?,
        None => BridgeConfig::default(),
    };
    Ok(config.with_env_overrides())
}

/// Run the parsed command line.
pub fn run_cli(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Dispatch { envelope } => {
            let dispatcher = echo_dispatcher(&config);
            let stdout = io::stdout();
            let mut out = stdout.lock();
            match envelope {
                Some(raw) => writeln!(out, "{}", dispatcher.bridge_request(&raw))?,
                None => {
                    for line in io::stdin().lock().lines() {
                        let line = line.context("Failed to read envelope from stdin")?;
                        if line.trim().is_empty() {
                            continue;
                        }
                        writeln!(out, "{}", dispatcher.bridge_request(&line))?;
                    }
                }
            }
            Ok(())
        }
        Commands::Call {
            method,
            path,
            body,
            timeout_ms,
        } => {
            let body = match body {
                Some(raw) => serde_json::from_str(&raw).context("--body is not valid JSON")?,
                None => Value::Null,
            };
            let result = run_call(&config, Envelope::new(method, path).with_body(body), timeout_ms)?;
            println!("{result}");
            Ok(())
        }
        Commands::Routes => {
            let dispatcher = echo_dispatcher(&config);
            for line in dispatcher.router().describe_routes() {
                println!("{line}");
            }
            Ok(())
        }
    }
}

pub(crate) fn run_call(config: &BridgeConfig, envelope: Envelope, timeout_ms: Option<u64>) -> Result<Value> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;

    let dispatcher = Arc::new(echo_dispatcher(config));
    let pending = PendingCalls::new();
    let transport = LoopbackTransport::new(dispatcher, pending.clone());
    let mux = CallMultiplexer::new(pending, Arc::new(transport)).with_config(config);

    info!(
        method = %envelope.method,
        path_and_query = %envelope.path_and_query,
        "Issuing call over loopback transport"
    );
    let result = runtime.block_on(mux.call(envelope, timeout_ms.map(Duration::from_millis)))?;
    Ok(result)
}
