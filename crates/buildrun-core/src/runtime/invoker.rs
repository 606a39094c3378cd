//! Execution of assembled commands
//!
//! The `Invoker` trait is the seam between command compilation and process
//! execution. `ProcessInvoker` runs the command as a child process and streams
//! its output to the terminal while capturing it.

use crate::command::assemble::GeneratedCommand;
use crate::error::BuildError;
use colored::Colorize;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout, Command as TokioCommand};
use tracing::debug;

/// Captured result of one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read process output: {0}")]
    Io(#[from] std::io::Error),

    #[error("process was interrupted")]
    Cancelled,
}

impl From<InvokeError> for BuildError {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::Cancelled => BuildError::Aborted,
            other => BuildError::Invocation(other.to_string()),
        }
    }
}

/// Runs assembled commands
pub trait Invoker: Send + Sync {
    fn invoke(
        &self,
        command: &GeneratedCommand,
        working_dir: &Path,
    ) -> impl Future<Output = Result<InvocationOutput, InvokeError>> + Send;
}

/// Invoker backed by a real child process
#[derive(Debug, Clone, Default)]
pub struct ProcessInvoker {
    /// Suppress echoing output lines to the terminal
    quiet: bool,
}

impl ProcessInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    /// Echo and capture both pipes until they close
    async fn stream(
        &self,
        stdout: ChildStdout,
        stderr: ChildStderr,
        output: &mut InvocationOutput,
    ) -> std::io::Result<()> {
        let mut stdout_reader = BufReader::new(stdout).split(b'\n');
        let mut stderr_reader = BufReader::new(stderr).split(b'\n');
        let mut stdout_done = false;
        let mut stderr_done = false;

        while !(stdout_done && stderr_done) {
            tokio::select! {
                segment = stdout_reader.next_segment(), if !stdout_done => {
                    match segment? {
                        Some(bytes) => {
                            let line = decode_line(&bytes);
                            if !self.quiet {
                                println!("{}", line);
                            }
                            output.stdout.push_str(&line);
                            output.stdout.push('\n');
                        }
                        None => stdout_done = true,
                    }
                }
                segment = stderr_reader.next_segment(), if !stderr_done => {
                    match segment? {
                        Some(bytes) => {
                            let line = decode_line(&bytes);
                            if !self.quiet {
                                eprintln!("{}", line.yellow());
                            }
                            output.stderr.push_str(&line);
                            output.stderr.push('\n');
                        }
                        None => stderr_done = true,
                    }
                }
            }
        }
        Ok(())
    }
}

/// Build tools and applications do not always print UTF-8
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

impl Invoker for ProcessInvoker {
    async fn invoke(
        &self,
        command: &GeneratedCommand,
        working_dir: &Path,
    ) -> Result<InvocationOutput, InvokeError> {
        debug!(command = %command.preview(), dir = %working_dir.display(), "spawning");

        let mut child = TokioCommand::new(command.executable())
            .args(command.tokens())
            .current_dir(working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InvokeError::Spawn {
                program: command.executable().display().to_string(),
                source,
            })?;

        let mut output = InvocationOutput::default();

        if let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) {
            if let Err(err) = self.stream(stdout, stderr, &mut output).await {
                // Reap the child instead of leaving it writing into closed pipes
                let _ = child.kill().await;
                return Err(err.into());
            }
        }

        let status = child.wait().await?;
        // No exit code means the process was killed by a signal
        output.exit_code = status.code().ok_or(InvokeError::Cancelled)?;
        debug!(exit_code = output.exit_code, "process finished");
        Ok(output)
    }
}
