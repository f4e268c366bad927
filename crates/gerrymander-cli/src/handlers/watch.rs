use crate::args::WatchArgs;
use crate::output::event_line;
use anyhow::Result;
use gerrymander_client::SshClient;
use gerrymander_core::Config;
use std::io::{self, Write};

pub fn handle(config: &Config, args: &WatchArgs) -> Result<()> {
    let projects = args.projects.resolve(config)?;
    // Events are live by nature; never read them through the cache.
    let mut client = SshClient::from_config(&config.server);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    gerrymander_client::watch(&mut client, |event| {
        if !projects.is_empty()
            && !event
                .project()
                .is_some_and(|p| projects.iter().any(|want| want == p))
        {
            return Ok(());
        }
        writeln!(out, "{}", event_line(&event))?;
        out.flush()?;
        Ok(())
    })?;
    Ok(())
}
