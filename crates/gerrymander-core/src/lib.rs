pub mod config;
pub mod error;
pub mod git;
pub mod path;

pub use config::{
    CacheConfig, CachePurpose, Config, GroupConfig, OrganizationConfig, ServerConfig,
};
pub use error::{Error, Result};
pub use git::{RemoteInfo, parse_ssh_url, remote_info};
pub use path::{expand_tilde, resolve_config_path};
