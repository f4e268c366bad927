use std::fmt;

/// Result type for gerrymander-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while talking to the server
#[derive(Debug)]
pub enum Error {
    /// IO operation failed (cache directory, cache entry, pipe)
    Io(std::io::Error),

    /// The transport program could not be started
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// The transport program exited unsuccessfully
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The server reported an error record in its output
    Remote(String),

    /// Query options that the server would reject
    InvalidQuery(String),

    /// A record did not match the expected shape
    Record(gerrymander_types::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Spawn { command, source } => {
                write!(f, "Unable to run command {}: {}", command, source)
            }
            Error::CommandFailed {
                command,
                code,
                stderr,
            } => {
                let status = match code {
                    Some(code) => format!("exit status {}", code),
                    None => "terminated by signal".to_string(),
                };
                write!(
                    f,
                    "Error running command {} ({}): {}",
                    command,
                    status,
                    stderr.trim_end()
                )
            }
            Error::Remote(msg) => write!(f, "Server error: {}", msg),
            Error::InvalidQuery(msg) => write!(f, "Invalid query: {}", msg),
            Error::Record(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Spawn { source, .. } => Some(source),
            Error::Record(err) => Some(err),
            Error::CommandFailed { .. } | Error::Remote(_) | Error::InvalidQuery(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<gerrymander_types::Error> for Error {
    fn from(err: gerrymander_types::Error) -> Self {
        Error::Record(err)
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}
