//! Narrow wrapper around external processes.
//!
//! Every external tool (converter, `lp`, `lpstat`) is run through a
//! [`CommandRunner`], which captures output and turns spawn failures and
//! non-zero exits into [`CommandError`]. Callers map that into their own
//! domain error. There is no timeout: the calling job waits for the tool.

use std::{
    ffi::{OsStr, OsString},
    fmt,
    path::{Path, PathBuf},
    process::Stdio,
};

use {
    async_trait::async_trait,
    tokio::process::Command,
    tracing::{debug, warn},
};

use crate::error::CommandError;

/// Longest stderr excerpt kept in an error.
const MAX_STDERR_BYTES: usize = 4 * 1024;

/// Program plus argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Program file name, used in logs and errors.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Lossy argument vector, mostly for logs and assertions.
    pub fn argv(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured output of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion. A non-zero exit is an error.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        debug!(command = %invocation, "running external command");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|source| CommandError::Spawn {
            program: invocation.program_name(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if stderr.len() > MAX_STDERR_BYTES {
            let mut cut = MAX_STDERR_BYTES;
            while !stderr.is_char_boundary(cut) {
                cut -= 1;
            }
            stderr.truncate(cut);
            stderr.push_str("\n... [truncated]");
        }

        if !output.status.success() {
            let code = output.status.code();
            warn!(command = %invocation, ?code, "external command failed");
            return Err(CommandError::NonZeroExit {
                program: invocation.program_name(),
                code,
                stderr: stderr.trim().to_string(),
            });
        }

        debug!(
            command = %invocation,
            stdout_len = stdout.len(),
            stderr_len = stderr.len(),
            "external command finished"
        );
        Ok(CommandOutput { stdout, stderr })
    }
}

/// Resolve `name` against `PATH`.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Explicit path if it points at a file, otherwise the first candidate on
/// `PATH`.
pub fn find_binary(explicit: Option<&Path>, candidates: &[String]) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        warn!(path = %path.display(), "configured binary does not exist, searching PATH");
    }
    candidates.iter().find_map(|name| find_on_path(name))
}
