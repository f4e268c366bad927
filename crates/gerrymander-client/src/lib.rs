//! Talking to a Gerrit server over ssh.
//!
//! An [`Invocation`] is run by a [`Client`]: either [`SshClient`], which
//! spawns the transport every time, or [`CachingClient`], which keeps the
//! raw output on disk for a while. Output is decoded line by line into
//! JSON records and pushed to a caller-supplied sink. [`Paginator`] turns
//! a [`Query`] into as many `gerrit query` calls as it takes.

pub mod cache;
pub mod client;
pub mod decoder;
pub mod error;
pub mod invocation;
pub mod paginate;
pub mod query;
pub mod transport;
pub mod watch;

pub use cache::{CachingClient, PurgeOutcome, cache_key};
pub use client::{Client, SshClient};
pub use decoder::{DecodeStats, Decoded, SkipReason, decode_line, decode_stream};
pub use error::{Error, Result};
pub use invocation::Invocation;
pub use paginate::{MAX_PAGE_SIZE, Paginator};
pub use query::{PatchSets, Query};
pub use transport::{RunningCommand, SshTransport};
pub use watch::watch;
