//! Structured logging setup.
//!
//! Library code only emits `tracing` events; the binary installs the
//! subscriber once at startup. `RUST_LOG` wins over the configured level.

use crate::shared::Result;
use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default level when neither `RUST_LOG` nor the config file sets one
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Builds the level filter, preferring `RUST_LOG` over `level`.
pub fn build_env_filter(level: Option<&str>) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level = level.unwrap_or(DEFAULT_LOG_LEVEL);
    EnvFilter::try_new(level).with_context(|| format!("Invalid log level: {}", level))
}

/// Installs a stderr subscriber so log lines never mix with command output.
pub fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = build_env_filter(level)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}
