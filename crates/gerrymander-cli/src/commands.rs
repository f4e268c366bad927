use super::args::{Cli, Commands};
use super::handlers;
use crate::logging;
use anyhow::{Context, Result};
use gerrymander_core::Config;

pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_level)?;

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    tracing::debug!(
        hostname = %config.server.hostname,
        port = ?config.server.port,
        cache = %config.cache.root().display(),
        "configuration loaded"
    );

    match cli.command {
        Commands::Changes(args) => handlers::changes::handle(&config, &args),
        Commands::Raw(args) => handlers::raw::handle(&config, &args),
        Commands::Watch(args) => handlers::watch::handle(&config, &args),
    }
}
