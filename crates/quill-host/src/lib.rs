//! Native host for the Quill evaluation bridge.
//!
//! Speaks line-delimited JSON on stdin/stdout (see [`protocol`]) and writes
//! the readiness line to stderr. Configuration is read from an optional
//! `quill-host.json` in the working directory.

pub mod host;
pub mod protocol;

use std::path::Path;
use std::sync::Once;

use anyhow::Context;
use quill_bridge::BridgeConfig;

pub use host::StdioHost;

/// Configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "quill-host.json";

static TRACING_INIT: Once = Once::new();

/// Install the log subscriber. Safe to call more than once.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .try_init();
    });
}

/// Read `path` if it exists; a missing file means defaults.
pub fn load_config(path: &Path) -> anyhow::Result<BridgeConfig> {
    if !path.exists() {
        return Ok(BridgeConfig::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    BridgeConfig::from_json(&text).with_context(|| format!("invalid config in {}", path.display()))
}
