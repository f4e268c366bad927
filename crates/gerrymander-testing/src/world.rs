//! TestWorld pattern for CLI integration tests.
//!
//! Each world owns a temp directory holding a config file, a cache root
//! and a [`FakeRemote`] that the config points the transport at. Nothing
//! from the invoking user's home directory is consulted.

use anyhow::Result;
use assert_cmd::Command;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::remote::FakeRemote;

/// Declarative test environment builder.
///
/// # Example
/// ```no_run
/// use gerrymander_testing::{TestWorld, fixtures};
///
/// let world = TestWorld::new();
/// world.remote().respond_json(1, [fixtures::change(1, "nova", "Fix"), fixtures::stats(1, false)]);
///
/// let result = world.run(&["changes", "--project", "nova"]).unwrap();
/// assert!(result.success());
/// ```
pub struct TestWorld {
    temp_dir: TempDir,
    remote: FakeRemote,
    config_path: PathBuf,
    cache_dir: PathBuf,
    env_vars: HashMap<String, String>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    /// Create a new isolated test environment.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_path = temp_dir.path().to_path_buf();
        let cache_dir = base_path.join("cache");
        let config_path = base_path.join("config.toml");

        let world = Self {
            temp_dir,
            remote: FakeRemote::new(),
            config_path,
            cache_dir,
            env_vars: HashMap::new(),
        };
        world.write_config("");
        world
    }

    pub fn remote(&self) -> &FakeRemote {
        &self.remote
    }

    /// Cache root; entries land in its `short` and `long` subdirectories.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Rewrite the config, appending `extra_server` lines to `[server]`.
    pub fn write_config(&self, extra_server: &str) {
        let ssh_command = self
            .remote
            .ssh_command()
            .iter()
            .map(|part| format!("'{}'", part))
            .collect::<Vec<_>>()
            .join(", ");

        let config = format!(
            "[server]\nhostname = 'review.example.org'\nport = 29418\nssh_command = [{}]\n{}\n\n[cache]\ndirectory = '{}'\n",
            ssh_command,
            extra_server,
            self.cache_dir.display()
        );
        fs::write(&self.config_path, config).expect("Failed to write config");
    }

    /// Append top-level TOML sections (e.g. `[groups.<name>]`) to the config.
    pub fn append_config(&self, sections: &str) {
        let mut config = fs::read_to_string(&self.config_path).expect("Failed to read config");
        config.push('\n');
        config.push_str(sections);
        config.push('\n');
        fs::write(&self.config_path, config).expect("Failed to write config");
    }

    /// Set an environment variable for CLI execution.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Configure a CLI command with this test environment's settings.
    ///
    /// The caller provides the base command (e.g. from
    /// `cargo_bin_cmd!("gerrymander")`).
    pub fn configure_command<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        cmd.arg("--config").arg(&self.config_path);
        cmd.current_dir(self.temp_dir.path());
        cmd.env("HOME", self.temp_dir.path());
        cmd.env_remove("RUST_LOG");
        cmd.env_remove("GERRYMANDER_CONFIG");

        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        cmd
    }

    /// Execute the `gerrymander` binary with `args` and capture its output.
    #[allow(deprecated)]
    pub fn run(&self, args: &[&str]) -> Result<CliResult> {
        let mut cmd = Command::cargo_bin("gerrymander")
            .map_err(|e| anyhow::anyhow!("Failed to find gerrymander binary: {}", e))?;

        self.configure_command(&mut cmd);
        cmd.args(args);

        let output = cmd.output()?;

        Ok(CliResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    /// Cache entry files currently stored for `purpose` (`short` or `long`).
    pub fn cache_entries(&self, purpose: &str) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.cache_dir.join(purpose)) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();
        paths
    }
}

/// Result of a CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CliResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Parse each stdout line as JSON.
    pub fn json_lines(&self) -> Result<Vec<serde_json::Value>> {
        self.stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Ok(serde_json::from_str(line)?))
            .collect()
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}
