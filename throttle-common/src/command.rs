//! Utilities for [`tokio::process::Command`].

use std::{io, process::Stdio};

use tokio::process;

/// Failure to run a command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No program was given.
    #[error("empty command provided")]
    Empty,
    /// The process could not be spawned or waited on.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The process exited unsuccessfully.
    #[error("non-zero exit status ({}): {}", .0.code_display(), .0.stderr.trim())]
    NonZero(Output),
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    /// Exit code, `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl Output {
    /// A successful output carrying the given stdout.
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self { code: Some(0), stdout: stdout.into(), stderr: String::new() }
    }

    /// Returns `true` if the process exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    fn code_display(&self) -> String {
        self.code.map_or_else(|| "signal".to_string(), |code| code.to_string())
    }
}

impl From<std::process::Output> for Output {
    fn from(value: std::process::Output) -> Self {
        Self {
            code: value.status.code(),
            stdout: String::from_utf8_lossy(&value.stdout).to_string(),
            stderr: String::from_utf8_lossy(&value.stderr).to_string(),
        }
    }
}

/// Result of running a command.
pub type Result<T> = std::result::Result<T, Error>;

/// Spawns processes and waits for them, one at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Runner;

impl Runner {
    /// Runs `argv[0]` with the remaining elements as arguments.
    pub async fn run(argv: &[&str]) -> Result<Output> {
        let (program, args) = argv.split_first().ok_or(Error::Empty)?;
        let mut cmd = process::Command::new(program);
        cmd.args(args);

        Self::wait(cmd).await
    }

    /// Runs the provided pipeline through `sh -c`.
    pub async fn shell(pipeline: &str) -> Result<Output> {
        if pipeline.trim().is_empty() {
            return Err(Error::Empty);
        }

        let mut cmd = process::Command::new("sh");
        cmd.arg("-c").arg(pipeline);

        Self::wait(cmd).await
    }

    async fn wait(mut cmd: process::Command) -> Result<Output> {
        cmd.stdin(Stdio::null()).stderr(Stdio::piped()).stdout(Stdio::piped());

        tracing::debug!(?cmd, "running command");

        let output: Output = cmd.output().await?.into();

        if !output.success() {
            tracing::debug!(?output.stderr, ?output.code, ?cmd, "command returned non-zero status");
            return Err(Error::NonZero(output));
        }

        Ok(output)
    }
}
