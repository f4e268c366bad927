use crate::{Error, Result};
use std::path::PathBuf;

pub const CONFIG_ENV_VAR: &str = "GERRYMANDER_CONFIG";

/// Resolve the configuration file path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. GERRYMANDER_CONFIG environment variable (with tilde expansion)
/// 3. System config directory, if the file exists there
/// 4. ~/.gerrymander.toml, if it exists
///
/// When neither 3 nor 4 exists the config directory path is returned (or
/// the dotfile on systems without one), so a missing file means defaults.
pub fn resolve_config_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    // Priority 1: Explicit path
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    // Priority 2: GERRYMANDER_CONFIG environment variable
    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        return Ok(expand_tilde(&env_path));
    }

    // Priorities 3 and 4
    default_config_path(
        dirs::config_dir(),
        std::env::var_os("HOME").map(PathBuf::from),
    )
    .ok_or_else(|| {
        Error::Config(
            "Could not determine config path: no HOME directory or system config directory found"
                .to_string(),
        )
    })
}

fn default_config_path(config_dir: Option<PathBuf>, home: Option<PathBuf>) -> Option<PathBuf> {
    let in_config_dir = config_dir.map(|dir| dir.join("gerrymander").join("config.toml"));
    let dotfile = home.map(|home| home.join(".gerrymander.toml"));

    let existing = [&in_config_dir, &dotfile]
        .into_iter()
        .flatten()
        .find(|candidate| candidate.is_file())
        .cloned();
    existing
        .or(in_config_dir)
        .or(dotfile)
}

/// Expand tilde (~) in paths to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}
