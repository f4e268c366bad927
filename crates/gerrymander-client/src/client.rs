use gerrymander_core::ServerConfig;
use gerrymander_types::Record;

use crate::decoder::decode_stream;
use crate::transport::SshTransport;
use crate::{Invocation, Result};

/// Something that can run a `gerrit` subcommand and stream back its
/// decoded output records.
pub trait Client {
    /// Run `invocation`, calling `sink` once per decoded record in output
    /// order. Records already delivered stay delivered if the command
    /// later fails.
    fn run(
        &mut self,
        invocation: &Invocation,
        sink: &mut dyn FnMut(Record) -> Result<()>,
    ) -> Result<()>;
}

impl<C: Client + ?Sized> Client for Box<C> {
    fn run(
        &mut self,
        invocation: &Invocation,
        sink: &mut dyn FnMut(Record) -> Result<()>,
    ) -> Result<()> {
        (**self).run(invocation, sink)
    }
}

/// Talks to the server directly on every call.
#[derive(Debug, Clone)]
pub struct SshClient {
    transport: SshTransport,
}

impl SshClient {
    pub fn new(transport: SshTransport) -> Self {
        Self { transport }
    }

    pub fn from_config(server: &ServerConfig) -> Self {
        Self::new(SshTransport::from_config(server))
    }

    pub fn transport(&self) -> &SshTransport {
        &self.transport
    }
}

impl Client for SshClient {
    fn run(
        &mut self,
        invocation: &Invocation,
        sink: &mut dyn FnMut(Record) -> Result<()>,
    ) -> Result<()> {
        let mut running = self.transport.spawn(invocation)?;

        match decode_stream(running.stdout(), sink) {
            Ok(stats) => {
                tracing::debug!(
                    records = stats.records,
                    skipped = stats.skipped,
                    "command output consumed"
                );
                running.finish()
            }
            Err(err) => {
                running.abort();
                Err(err)
            }
        }
    }
}
