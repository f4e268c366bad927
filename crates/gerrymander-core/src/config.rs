use crate::git::remote_info;
use crate::path::{expand_tilde, resolve_config_path};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HOSTNAME: &str = "review";
pub const DEFAULT_PORT: u16 = 29418;
pub const DEFAULT_CACHE_DIR: &str = "~/.gerrymander.d/cache";
pub const DEFAULT_SHORT_LIFETIME: u64 = 300;
pub const DEFAULT_LONG_LIFETIME: u64 = 86400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub hostname: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub keyfile: Option<String>,
    /// Name of a git remote to take username/hostname/port from
    pub remote: Option<String>,
    /// Program (plus leading arguments) used to reach the server
    pub ssh_command: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            port: Some(DEFAULT_PORT),
            username: None,
            keyfile: None,
            remote: None,
            ssh_command: vec!["ssh".to_string()],
        }
    }
}

impl ServerConfig {
    pub fn keyfile_path(&self) -> Option<PathBuf> {
        self.keyfile.as_deref().map(expand_tilde)
    }
}

/// Which cache a command reads through. Each purpose gets its own
/// subdirectory and lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePurpose {
    Short,
    Long,
}

impl CachePurpose {
    pub fn subdir(self) -> &'static str {
        match self {
            CachePurpose::Short => "short",
            CachePurpose::Long => "long",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub directory: String,
    /// Seconds
    pub short_lifetime: u64,
    /// Seconds
    pub long_lifetime: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: DEFAULT_CACHE_DIR.to_string(),
            short_lifetime: DEFAULT_SHORT_LIFETIME,
            long_lifetime: DEFAULT_LONG_LIFETIME,
        }
    }
}

impl CacheConfig {
    pub fn root(&self) -> PathBuf {
        expand_tilde(&self.directory)
    }

    pub fn directory_for(&self, purpose: CachePurpose) -> PathBuf {
        self.root().join(purpose.subdir())
    }

    pub fn lifetime_for(&self, purpose: CachePurpose) -> Duration {
        Duration::from_secs(match purpose {
            CachePurpose::Short => self.short_lifetime,
            CachePurpose::Long => self.long_lifetime,
        })
    }
}

/// Project groups reported on by `--all-groups`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationConfig {
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub projects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub organization: OrganizationConfig,
    /// `[groups.<name>]` tables
    #[serde(default)]
    pub groups: BTreeMap<String, GroupConfig>,
}

impl Config {
    /// Load from the resolved config path (see [`resolve_config_path`]) and
    /// apply any configured git remote.
    pub fn load(explicit_path: Option<&str>) -> Result<Self> {
        let config_path = resolve_config_path(explicit_path)?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_git_remote()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Projects of the named groups, in group order. Every name must have
    /// a `[groups.<name>]` table.
    pub fn group_projects<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>> {
        let mut projects: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref();
            let group = self
                .groups
                .get(name)
                .ok_or_else(|| Error::Config(format!("Unknown project group '{}'", name)))?;
            for project in &group.projects {
                if !projects.contains(project) {
                    projects.push(project.clone());
                }
            }
        }
        Ok(projects)
    }

    /// Projects of every group listed in `[organization] groups`.
    pub fn all_group_projects(&self) -> Result<Vec<String>> {
        self.group_projects(self.organization.groups.as_slice())
    }

    /// Override server connection details from `server.remote`, if set.
    pub fn apply_git_remote(&mut self) -> Result<()> {
        let Some(remote) = self.server.remote.clone() else {
            return Ok(());
        };

        if let Some(info) = remote_info(&remote)? {
            self.server.hostname = info.hostname;
            if info.username.is_some() {
                self.server.username = info.username;
            }
            if info.port.is_some() {
                self.server.port = info.port;
            }
        }
        Ok(())
    }
}
