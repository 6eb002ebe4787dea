//! Builder for executing external tool commands.
//!
//! Arguments are always passed as an argv array, never through a shell, so
//! user-supplied text (overlay strings, file paths) cannot be interpreted as
//! shell syntax.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use reelcut_core::{Error, Result};

/// Which external binary a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Ffmpeg,
    Ffprobe,
}

impl ToolKind {
    /// The registry/tool name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Ffmpeg => "ffmpeg",
            ToolKind::Ffprobe => "ffprobe",
        }
    }
}

/// A fully built subprocess invocation.
///
/// Immutable once constructed; one spec corresponds to exactly one subprocess
/// run. Filter graphs, where present, have already been serialized into the
/// argument list.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// The binary this spec targets.
    pub tool: ToolKind,
    /// Ordered argument list (argv minus the program itself).
    pub args: Vec<String>,
    /// Short human-readable label for progress reporting and logs.
    pub label: String,
}

impl CommandSpec {
    /// Create an empty spec for the given tool.
    pub fn new(tool: ToolKind, label: impl Into<String>) -> Self {
        Self {
            tool,
            args: Vec::new(),
            label: label.into(),
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, a: impl Into<String>) -> Self {
        self.args.push(a.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }
}

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// There is no default timeout: an ffmpeg encode may legitimately run for
/// hours. Callers running short metadata queries can set one explicitly.
///
/// # Example
///
/// ```no_run
/// use reelcut_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> reelcut_core::Result<()> {
/// let mut cmd = ToolCommand::new(PathBuf::from("ffprobe"));
/// cmd.args(["-v", "quiet", "-print_format", "json", "-show_format"]);
/// cmd.arg("/path/to/video.mp4");
/// let output = cmd.execute().await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    tool_name: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        let tool_name = program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| program.to_string_lossy().to_string());
        Self {
            program,
            tool_name,
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set a maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = Some(d);
        self
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`Error::Spawn`] if the process cannot be launched at all.
    /// - [`Error::Tool`] if the process exits non-zero (message includes the
    ///   captured stderr) or exceeds a configured timeout.
    pub async fn execute(&self) -> Result<ToolOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| Error::spawn(&self.tool_name, format!("failed to spawn: {e}")))?;

        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(t) => match tokio::time::timeout(t, wait).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    // Dropping the wait future kills the child (kill_on_drop).
                    return Err(Error::tool(
                        &self.tool_name,
                        format!("timed out after {t:?}"),
                    ));
                }
            },
            None => wait.await,
        }
        .map_err(|e| {
            Error::tool(
                &self.tool_name,
                format!("I/O error waiting for process: {e}"),
            )
        })?;

        let tool_output = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !output.status.success() {
            return Err(Error::tool(
                &self.tool_name,
                format!(
                    "exited with status {}: {}",
                    output.status,
                    tool_output.stderr.trim()
                ),
            ));
        }

        Ok(tool_output)
    }

    /// Execute the command, streaming stderr line-by-line to `on_line`.
    ///
    /// FFmpeg writes all progress and diagnostic information to stderr; the
    /// callback receives each line as it arrives, for UI progress display.
    /// When `cancel` fires, the child is killed and [`Error::Cancelled`] is
    /// returned. Stdout is discarded (ffmpeg output goes to files).
    pub async fn execute_streaming(
        &self,
        mut on_line: impl FnMut(&str),
        cancel: &CancellationToken,
    ) -> Result<ToolOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::spawn(&self.tool_name, format!("failed to spawn: {e}")))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::spawn(&self.tool_name, "stderr pipe unavailable"))?;
        let mut lines = BufReader::new(stderr).lines();
        let mut collected = String::new();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            on_line(&line);
                            collected.push_str(&line);
                            collected.push('\n');
                        }
                        Ok(None) => break,
                        Err(e) => {
                            let _ = child.start_kill();
                            let _ = child.wait().await;
                            return Err(Error::tool(
                                &self.tool_name,
                                format!("I/O error reading diagnostics: {e}"),
                            ));
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    tracing::info!("cancelling {} run", self.tool_name);
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    return Err(Error::Cancelled);
                }
            }
        }

        let status = child.wait().await.map_err(|e| {
            Error::tool(
                &self.tool_name,
                format!("I/O error waiting for process: {e}"),
            )
        })?;

        if !status.success() {
            return Err(Error::tool(
                &self.tool_name,
                format!("exited with status {}: {}", status, collected.trim()),
            ));
        }

        Ok(ToolOutput {
            status,
            stdout: String::new(),
            stderr: collected,
        })
    }
}
