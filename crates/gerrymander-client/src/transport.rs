use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use gerrymander_core::ServerConfig;

use crate::{Error, Invocation, Result};

/// Runs `gerrit` subcommands on one server through ssh.
#[derive(Debug, Clone)]
pub struct SshTransport {
    command: Vec<String>,
    hostname: String,
    port: Option<u16>,
    username: Option<String>,
    keyfile: Option<PathBuf>,
}

impl SshTransport {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            command: vec!["ssh".to_string()],
            hostname: hostname.into(),
            port: None,
            username: None,
            keyfile: None,
        }
    }

    pub fn from_config(server: &ServerConfig) -> Self {
        let mut transport = Self::new(server.hostname.clone());
        if !server.ssh_command.is_empty() {
            transport.command = server.ssh_command.clone();
        }
        transport.port = server.port;
        transport.username = server.username.clone();
        transport.keyfile = server.keyfile_path();
        transport
    }

    /// Program and leading arguments used in place of plain `ssh`.
    pub fn with_command(mut self, command: Vec<String>) -> Self {
        if !command.is_empty() {
            self.command = command;
        }
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_keyfile(mut self, keyfile: impl Into<PathBuf>) -> Self {
        self.keyfile = Some(keyfile.into());
        self
    }

    /// Full argument vector, program first.
    pub fn argv(&self, invocation: &Invocation) -> Vec<String> {
        let mut argv = self.command.clone();
        argv.extend(["-o".to_string(), "BatchMode=yes".to_string()]);
        if let Some(port) = self.port {
            argv.extend(["-p".to_string(), port.to_string()]);
        }
        // A configured key that does not exist is ignored so that ssh can
        // still fall back to the agent.
        if let Some(keyfile) = &self.keyfile
            && keyfile.is_file()
        {
            argv.extend(["-i".to_string(), keyfile.display().to_string()]);
        }
        match &self.username {
            Some(user) => argv.push(format!("{}@{}", user, self.hostname)),
            None => argv.push(self.hostname.clone()),
        }
        argv.push("gerrit".to_string());
        argv.extend(invocation.tokens().iter().cloned());
        argv
    }

    /// Human readable command line; also the input to the cache key.
    pub fn command_line(&self, invocation: &Invocation) -> String {
        self.argv(invocation).join(" ")
    }

    /// Start the remote command. Nothing is written to its stdin.
    pub fn spawn(&self, invocation: &Invocation) -> Result<RunningCommand> {
        let argv = self.argv(invocation);
        let command_line = argv.join(" ");
        tracing::debug!(command = %command_line, "running command");

        let mut child = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                command: command_line.clone(),
                source,
            })?;

        let (Some(stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Spawn {
                command: command_line,
                source: std::io::Error::other("child pipes were not captured"),
            });
        };

        // Drained on a side thread so a child that writes a lot of
        // diagnostics cannot stall on a full stderr pipe while we are
        // still reading stdout.
        let stderr = std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        });

        Ok(RunningCommand {
            child,
            stdout: BufReader::new(stdout),
            stderr: Some(stderr),
            command_line,
            reaped: false,
        })
    }
}

/// A spawned remote command whose stdout has not yet been fully consumed.
///
/// Call [`RunningCommand::finish`] once stdout reaches EOF, or
/// [`RunningCommand::abort`] to give up early. Dropping it without either
/// kills the child.
pub struct RunningCommand {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    command_line: String,
    reaped: bool,
}

impl RunningCommand {
    pub fn stdout(&mut self) -> &mut BufReader<ChildStdout> {
        &mut self.stdout
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Wait for exit; a non-zero status becomes [`Error::CommandFailed`]
    /// carrying the command line and captured stderr.
    pub fn finish(mut self) -> Result<()> {
        let status = self.child.wait()?;
        self.reaped = true;
        let stderr = self.collect_stderr();

        if status.success() {
            if !stderr.trim().is_empty() {
                tracing::debug!(stderr = %stderr.trim_end(), "command wrote to stderr");
            }
            return Ok(());
        }

        Err(Error::CommandFailed {
            command: self.command_line.clone(),
            code: status.code(),
            stderr,
        })
    }

    /// Kill and reap the child, discarding whatever it had left to say.
    pub fn abort(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.reaped = true;
        self.collect_stderr();
    }

    fn collect_stderr(&mut self) -> String {
        self.stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }
}

impl Drop for RunningCommand {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
