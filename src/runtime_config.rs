//! # Runtime Configuration Module
//!
//! Bridge settings from a YAML file, environment variables, or both.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `BRIDGE_CALL_TIMEOUT_MS` | `10000` | Multiplexer timeout when the caller gives none |
//! | `BRIDGE_MEASURE_EXECUTION` | `true` | Install the timing decorator outermost |
//! | `BRIDGE_TRACE_REQUESTS` | `false` | Install the span decorator |
//!
//! Values that fail to parse are ignored and the previous value is kept.
//!
//! ## YAML
//!
//! ```yaml
//! bridge:
//!   call_timeout_ms: 2500
//!   trace_requests: true
//! ```
//!
//! Missing keys keep their defaults.
//!
//! ```rust
//! use bridgeapi::runtime_config::BridgeConfig;
//!
//! let config = BridgeConfig::from_yaml_str("bridge:\n  call_timeout_ms: 2500\n").unwrap();
//! assert_eq!(config.call_timeout_ms, 2500);
//! assert!(config.measure_execution);
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub const ENV_CALL_TIMEOUT_MS: &str = "BRIDGE_CALL_TIMEOUT_MS";
pub const ENV_MEASURE_EXECUTION: &str = "BRIDGE_MEASURE_EXECUTION";
pub const ENV_TRACE_REQUESTS: &str = "BRIDGE_TRACE_REQUESTS";

/// Bridge settings shared by the dispatcher and the multiplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Default timeout for multiplexed calls, in milliseconds.
    pub call_timeout_ms: u64,
    pub measure_execution: bool,
    pub trace_requests: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 10_000,
            measure_execution: true,
            trace_requests: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    bridge: BridgeConfig,
}

impl BridgeConfig {
    /// Defaults overridden by environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Parse a YAML document with a top-level `bridge:` mapping.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_yaml::from_str(yaml).context("Failed to parse bridge configuration")?;
        Ok(file.bridge)
    }

    /// Read and parse a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&raw)
    }

    /// Apply `BRIDGE_*` environment variables on top of `self`.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    #[must_use]
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_CALL_TIMEOUT_MS).and_then(|s| s.trim().parse().ok()) {
            self.call_timeout_ms = v;
        }
        if let Some(v) = lookup(ENV_MEASURE_EXECUTION).and_then(|s| parse_flag(&s)) {
            self.measure_execution = v;
        }
        if let Some(v) = lookup(ENV_TRACE_REQUESTS).and_then(|s| parse_flag(&s)) {
            self.trace_requests = v;
        }
        self
    }

    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
