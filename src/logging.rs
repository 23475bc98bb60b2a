//! Logging initialization
//!
//! Sets up a `tracing` subscriber writing to stdout so container logs pick
//! everything up. The filter defaults to `info` and can be overridden with
//! the standard `RUST_LOG` environment variable.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Call this once, before anything else logs.
pub fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,recruit_agent=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}
