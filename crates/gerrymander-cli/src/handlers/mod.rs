pub mod changes;
pub mod raw;
pub mod watch;

use crate::args::CacheArgs;
use anyhow::{Context, Result};
use gerrymander_client::{CachingClient, Client, SshClient};
use gerrymander_core::Config;

/// The client a command reads through: the server directly with
/// `--no-cache`, otherwise the cache selected by `--long-cache`.
pub(crate) fn client(config: &Config, cache: &CacheArgs) -> Result<Box<dyn Client>> {
    if cache.no_cache {
        tracing::debug!("cache disabled");
        return Ok(Box::new(SshClient::from_config(&config.server)));
    }

    let purpose = cache.purpose();
    let client = CachingClient::from_config(config, purpose)
        .with_context(|| {
            format!(
                "Failed to open cache directory {}",
                config.cache.directory_for(purpose).display()
            )
        })?
        .with_refresh(cache.refresh);
    Ok(Box::new(client))
}
