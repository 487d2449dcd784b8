use std::{
    fmt,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
};

use tracing::{error, info};

use crate::{config::ServerConfig, error::LaunchError};

/// Command line for the external mock REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockApiCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl MockApiCommand {
    /// `<api_program> --watch <store> --port <api_port>`, run from the served root.
    ///
    /// `api_program` may carry its own leading arguments (`npx json-server`).
    pub fn from_config(config: &ServerConfig) -> Self {
        let mut segments = split_command(&config.api_program);
        let program = if segments.is_empty() {
            String::new()
        } else {
            segments.remove(0)
        };
        let mut args = segments;
        args.push("--watch".to_string());
        args.push(config.store_path.display().to_string());
        args.push("--port".to_string());
        args.push(config.api_port.to_string());

        Self {
            program,
            args,
            working_dir: config.root.clone(),
        }
    }

    fn command(&self) -> Command {
        // npm installs `.cmd` shims on Windows, which only a shell resolves.
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&self.program);
            cmd
        } else {
            Command::new(&self.program)
        };
        cmd.args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }
}

impl fmt::Display for MockApiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Unknown,
    Running,
    Exited(Option<i32>),
}

/// A spawned mock API the launcher does not own.
///
/// Dropping this neither waits for nor kills the child; it keeps running
/// until it exits on its own or the terminal's interrupt reaches it.
#[derive(Debug)]
pub struct DetachedProcess {
    command: MockApiCommand,
    child: Child,
}

impl DetachedProcess {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn command(&self) -> &MockApiCommand {
        &self.command
    }

    pub fn working_dir(&self) -> &Path {
        &self.command.working_dir
    }

    /// Non-blocking status check.
    pub fn liveness(&mut self) -> Liveness {
        match self.child.try_wait() {
            Ok(Some(status)) => Liveness::Exited(status.code()),
            Ok(None) => Liveness::Running,
            Err(_) => Liveness::Unknown,
        }
    }
}

pub fn spawn_detached(command: &MockApiCommand) -> Result<DetachedProcess, LaunchError> {
    if command.program.is_empty() {
        return Err(LaunchError::ChildLaunch {
            command: command.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        });
    }
    match command.command().spawn() {
        Ok(child) => Ok(DetachedProcess {
            command: command.clone(),
            child,
        }),
        Err(source) => Err(LaunchError::ChildLaunch {
            command: command.to_string(),
            source,
        }),
    }
}

/// Starts the mock API without waiting for it to accept connections.
///
/// A spawn failure is logged and reported as `None`; the caller carries on
/// without the API.
pub fn launch_mock_api(command: &MockApiCommand) -> Option<DetachedProcess> {
    info!(command = %command, "starting mock API");
    match spawn_detached(command) {
        Ok(process) => {
            info!(pid = process.pid(), "mock API process spawned");
            Some(process)
        }
        Err(err) => {
            error!(error = %err, "mock API unavailable, continuing without it");
            None
        }
    }
}

/// Splits a string into space-separated segments, ignoring spaces in quoted substrings.
pub fn split_command(command: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut segment = String::new();
    let mut in_quotes = false;

    for c in command.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ' ' if !in_quotes => {
                if !segment.is_empty() {
                    segments.push(std::mem::take(&mut segment));
                }
            }
            _ => segment.push(c),
        }
    }

    if !segment.is_empty() {
        segments.push(segment);
    }

    segments
}
