//! # CLI Module
//!
//! Command-line front end of the `bridgeapi` binary. Every command runs
//! against the echo controller mounted at `/echo` (see [`crate::echo`]).
//!
//! ## Commands
//!
//! ### `dispatch`
//!
//! Route one envelope, or one envelope per stdin line, and print each response:
//!
//! ```bash
//! bridgeapi dispatch --envelope '{"pathAndQuery":"/echo/a","method":"GET","body":null}'
//! ```
//!
//! ### `call`
//!
//! Issue a call through the Call Multiplexer over the in-process loopback
//! transport:
//!
//! ```bash
//! bridgeapi call --method POST --path /echo/items --body '{"n":1}' --timeout-ms 500
//! ```
//!
//! ### `routes`
//!
//! Print the route table.
//!
//! ## Global options
//!
//! - `--config <FILE>` - YAML file with a top-level `bridge:` mapping
//! - `--log-level <LEVEL>` - overrides `BRIDGE_LOG_LEVEL`

mod commands;


pub use commands::{run_cli, Cli, Commands};
