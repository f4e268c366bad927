use crate::Result;
use std::process::Command;

/// Connection details pulled from a git remote URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteInfo {
    pub username: Option<String>,
    pub hostname: String,
    pub port: Option<u16>,
}

/// Read `remote.<name>.url` from the git configuration of the current
/// directory and extract the ssh connection details.
///
/// Returns `Ok(None)` when the remote is not configured or is not an
/// `ssh://` URL; remotes set up with `git review -s` always are.
pub fn remote_info(remote: &str) -> Result<Option<RemoteInfo>> {
    let key = format!("remote.{}.url", remote);
    let output = Command::new("git").args(["config", "--get", &key]).output()?;

    if !output.status.success() {
        tracing::debug!(remote, "git remote has no url configured");
        return Ok(None);
    }

    let url = String::from_utf8_lossy(&output.stdout);
    let info = parse_ssh_url(url.trim());
    if info.is_none() {
        tracing::debug!(remote, url = %url.trim(), "ignoring non-ssh remote url");
    }
    Ok(info)
}

/// Parse `ssh://[user@]host[:port][/path]`.
pub fn parse_ssh_url(url: &str) -> Option<RemoteInfo> {
    let rest = url.strip_prefix("ssh://")?;
    let netloc = rest.split('/').next().unwrap_or(rest);
    if netloc.is_empty() {
        return None;
    }

    let (username, hostport) = match netloc.rsplit_once('@') {
        Some((user, hostport)) => (Some(user.to_string()), hostport),
        None => (None, netloc),
    };

    let (hostname, port) = match hostport.rsplit_once(':') {
        Some((host, port)) => (host, port.parse().ok()),
        None => (hostport, None),
    };
    if hostname.is_empty() {
        return None;
    }

    Some(RemoteInfo {
        username,
        hostname: hostname.to_string(),
        port,
    })
}
