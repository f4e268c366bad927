//! Diagnostics go to stderr through `tracing`; stdout stays reserved for
//! report output.

use crate::types::LogLevel;
use anyhow::{Context, Result};
use std::io;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. `RUST_LOG`, when set, overrides `level`.
pub fn init(level: LogLevel) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(level)))
        .context("Failed to create log filter")?;

    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()
        .context("Failed to install log subscriber")?;
    Ok(())
}

fn filter_directive(level: LogLevel) -> String {
    format!(
        "gerrymander={level},gerrymander_cli={level},gerrymander_client={level},gerrymander_core={level},gerrymander_types={level}"
    )
}
