//! Response cache for gerrit commands.
//!
//! Raw command output is stored under `<dir>/<sha256(command line)>.json`
//! and replayed through the same decoder a live run uses. Entries older
//! than the configured lifetime are swept at most once an hour per process,
//! under an exclusive lock on `<dir>/lock` so that concurrent clients
//! sharing the directory do not sweep at the same time.
//!
//! Only the sweep is serialized. New entries are staged in a temporary file
//! and renamed into place once the command has succeeded, so readers never
//! observe a half-written entry and a failed command leaves nothing behind.
//! Two processes filling the same entry at once both run the command; the
//! last rename wins.
//!
//! Success is judged by exit status alone. A server error record sent with
//! exit status 0 is cached like any other output and replayed until the
//! entry expires or `--refresh` replaces it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fs2::FileExt;
use gerrymander_core::{CachePurpose, Config};
use gerrymander_types::Record;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::client::{Client, SshClient};
use crate::decoder::decode_stream;
use crate::{Invocation, Result};

pub const LOCK_FILE_NAME: &str = "lock";
pub const ENTRY_SUFFIX: &str = ".json";
pub const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Hex SHA-256 of a command line; the cache entry's base name.
pub fn cache_key(command_line: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(command_line.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Result of a purge check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// A sweep already ran within the last [`PURGE_INTERVAL`]
    Skipped,
    Swept { evicted: usize },
}

/// Exclusive advisory lock on the cache lock file, released on drop.
struct CacheLock {
    file: File,
    path: PathBuf,
}

impl CacheLock {
    fn acquire(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        tracing::debug!(path = %path.display(), "acquiring cache lock");
        FileExt::lock_exclusive(&file)?;
        Ok(Self { file, path })
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "could not release cache lock"
            );
        }
    }
}

/// A [`Client`] that answers from disk when it can and otherwise runs the
/// command through the wrapped [`SshClient`], keeping its output.
#[derive(Debug)]
pub struct CachingClient {
    inner: SshClient,
    dir: PathBuf,
    lifetime: Duration,
    refresh: bool,
    last_purge: Option<SystemTime>,
}

impl CachingClient {
    /// Creates `dir` if needed.
    pub fn new(inner: SshClient, dir: impl Into<PathBuf>, lifetime: Duration) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            inner,
            dir,
            lifetime,
            refresh: false,
            last_purge: None,
        })
    }

    pub fn from_config(config: &Config, purpose: CachePurpose) -> Result<Self> {
        Self::new(
            SshClient::from_config(&config.server),
            config.cache.directory_for(purpose),
            config.cache.lifetime_for(purpose),
        )
    }

    /// Always re-run commands, replacing any existing entry.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, invocation: &Invocation) -> PathBuf {
        let command_line = self.inner.transport().command_line(invocation);
        self.dir
            .join(format!("{}{}", cache_key(&command_line), ENTRY_SUFFIX))
    }

    pub fn purge(&mut self) -> Result<PurgeOutcome> {
        self.purge_at(SystemTime::now())
    }

    /// Sweep entries whose mtime is older than `now - lifetime`, unless a
    /// sweep already happened less than [`PURGE_INTERVAL`] before `now`.
    pub fn purge_at(&mut self, now: SystemTime) -> Result<PurgeOutcome> {
        if let Some(last) = self.last_purge {
            let recent = now
                .duration_since(last)
                .map(|elapsed| elapsed < PURGE_INTERVAL)
                .unwrap_or(true);
            if recent {
                return Ok(PurgeOutcome::Skipped);
            }
        }

        let _lock = CacheLock::acquire(self.dir.join(LOCK_FILE_NAME))?;
        self.last_purge = Some(now);

        let threshold = now.checked_sub(self.lifetime).unwrap_or(UNIX_EPOCH);
        tracing::debug!(dir = %self.dir.display(), "looking for expired cache entries");

        let mut evicted = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_name() == LOCK_FILE_NAME {
                continue;
            }

            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            if !metadata.is_file() || metadata.modified()? >= threshold {
                continue;
            }

            tracing::info!(path = %path.display(), "purging outdated cache entry");
            match fs::remove_file(&path) {
                Ok(()) => evicted += 1,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }

        Ok(PurgeOutcome::Swept { evicted })
    }

    /// Run the command and publish its output at `path`. Nothing is left
    /// at `path` (or in the staging file) if the command fails.
    fn fill(&self, invocation: &Invocation, path: &Path) -> Result<()> {
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        let mut running = self.inner.transport().spawn(invocation)?;

        if let Err(err) = io::copy(running.stdout(), staged.as_file_mut()) {
            running.abort();
            return Err(err.into());
        }
        running.finish()?;

        staged.as_file().sync_data()?;
        staged.persist(path)?;
        Ok(())
    }

    fn serve(&self, path: &Path, sink: &mut dyn FnMut(Record) -> Result<()>) -> Result<()> {
        let reader = BufReader::new(File::open(path)?);
        let stats = decode_stream(reader, sink)?;
        tracing::debug!(
            records = stats.records,
            skipped = stats.skipped,
            "served from cache"
        );
        Ok(())
    }
}

impl Client for CachingClient {
    fn run(
        &mut self,
        invocation: &Invocation,
        sink: &mut dyn FnMut(Record) -> Result<()>,
    ) -> Result<()> {
        self.purge()?;

        let path = self.entry_path(invocation);
        tracing::debug!(
            command = %invocation,
            entry = %path.display(),
            "looking up cache entry"
        );

        if self.refresh || !path.exists() {
            self.fill(invocation, &path)?;
        } else {
            tracing::debug!(entry = %path.display(), "cache hit");
        }

        self.serve(&path, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SshTransport;
    use tempfile::TempDir;

    fn client(dir: &Path, lifetime: Duration) -> CachingClient {
        CachingClient::new(SshClient::new(SshTransport::new("review")), dir, lifetime).unwrap()
    }

    #[test]
    fn test_cache_key_is_deterministic_hex() {
        let key = cache_key("ssh review gerrit query status:open");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, cache_key("ssh review gerrit query status:open"));
        assert_ne!(key, cache_key("ssh review gerrit query status:merged"));
    }

    #[test]
    fn test_entry_path_depends_on_every_token() {
        let temp = TempDir::new().unwrap();
        let cache = client(temp.path(), Duration::from_secs(300));

        let a = cache.entry_path(&Invocation::new(["query", "limit:10", "project:nova"]));
        let b = cache.entry_path(&Invocation::new(["query", "limit:10", "project:glance"]));
        let c = cache.entry_path(&Invocation::new(["query", "project:nova", "limit:10"]));
        let again = cache.entry_path(&Invocation::new(["query", "limit:10", "project:nova"]));

        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert!(a.to_string_lossy().ends_with(".json"));
        assert_eq!(a.parent(), Some(temp.path()));
    }

    #[test]
    fn test_entry_path_depends_on_server() {
        let temp = TempDir::new().unwrap();
        let one = client(temp.path(), Duration::from_secs(300));
        let other = CachingClient::new(
            SshClient::new(SshTransport::new("review").with_port(2222)),
            temp.path(),
            Duration::from_secs(300),
        )
        .unwrap();

        let inv = Invocation::new(["query", "status:open"]);
        assert_ne!(one.entry_path(&inv), other.entry_path(&inv));
    }

    #[test]
    fn test_new_tolerates_existing_directory() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        client(&nested, Duration::from_secs(1));
        client(&nested, Duration::from_secs(1));
        assert!(nested.is_dir());
    }

    #[test]
    fn test_first_purge_on_empty_dir_creates_lock() {
        let temp = TempDir::new().unwrap();
        let mut cache = client(temp.path(), Duration::from_secs(300));

        assert_eq!(cache.purge().unwrap(), PurgeOutcome::Swept { evicted: 0 });
        assert!(temp.path().join(LOCK_FILE_NAME).exists());
        assert_eq!(cache.purge().unwrap(), PurgeOutcome::Skipped);
    }
}
