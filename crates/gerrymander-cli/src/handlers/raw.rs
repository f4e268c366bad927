use crate::args::RawArgs;
use anyhow::Result;
use gerrymander_client::{Client, Invocation};
use gerrymander_core::Config;
use gerrymander_types::Record;
use std::io::{self, Write};

pub fn handle(config: &Config, args: &RawArgs) -> Result<()> {
    let mut client = super::client(config, &args.cache)?;
    let invocation = Invocation::new(args.tokens.iter().cloned());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    client.run(&invocation, &mut |record: Record| {
        serde_json::to_writer(&mut out, &record).map_err(io::Error::from)?;
        writeln!(out)?;
        Ok(())
    })?;
    out.flush()?;
    Ok(())
}
