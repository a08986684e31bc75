//! Builder for executing external tool commands with timeout support.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::{Error, Result};

/// Default command timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Number of trailing stderr lines kept as diagnostics.
pub const DIAGNOSTIC_TAIL_LINES: usize = 64;

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8). When streaming, only the last
    /// [`DIAGNOSTIC_TAIL_LINES`] lines are retained.
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// The child is killed if the timeout elapses or the returned future is
/// dropped.
///
/// # Example
///
/// ```no_run
/// use hlsforged_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> hlsforged_av::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .arg("-v").arg("error")
///     .arg("-show_entries").arg("format=duration")
///     .arg("-of").arg("json")
///     .arg("/path/to/merged.ts")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
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

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Arguments accumulated so far.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if the process outlives the timeout (it is killed).
    /// - [`Error::ToolFailed`] if spawning fails or the exit status is
    ///   non-zero (message includes stderr).
    pub async fn execute(&self) -> Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| Error::tool_failed(&program_name, format!("failed to spawn: {e}")))?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let tool_output = ToolOutput {
                    status: output.status,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if !output.status.success() {
                    return Err(Error::tool_failed(
                        program_name,
                        format!(
                            "exited with status {}: {}",
                            output.status,
                            tool_output.stderr.trim()
                        ),
                    ));
                }

                Ok(tool_output)
            }
            Ok(Err(e)) => Err(Error::tool_failed(
                program_name,
                format!("I/O error waiting for process: {e}"),
            )),
            // The future owning the child is dropped here, which kills it.
            Err(_elapsed) => Err(Error::Timeout {
                tool: program_name,
                timeout: self.timeout,
                diagnostics: String::new(),
            }),
        }
    }

    /// Execute the command, handing each stderr line to `on_line` as it is
    /// produced.
    ///
    /// Lines are split on both `\n` and `\r`, since ffmpeg rewrites its
    /// status line in place with carriage returns. Stdout is discarded.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute). Failure messages carry the last
    /// [`DIAGNOSTIC_TAIL_LINES`] stderr lines.
    pub async fn execute_streaming<F>(&self, mut on_line: F) -> Result<ToolOutput>
    where
        F: FnMut(&str),
    {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::tool_failed(&program_name, format!("failed to spawn: {e}")))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::tool_failed(&program_name, "stderr was not captured"))?;

        let mut tail: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);

        let run = async {
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                if read_line_any_eol(&mut reader, &mut buf).await? == 0 {
                    break;
                }
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                on_line(line);
                if tail.len() == DIAGNOSTIC_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line.to_string());
            }
            child.wait().await
        };

        let result = tokio::time::timeout(self.timeout, run).await;
        let diagnostics = join_tail(&tail);

        match result {
            Ok(Ok(status)) if status.success() => Ok(ToolOutput {
                status,
                stdout: String::new(),
                stderr: diagnostics,
            }),
            Ok(Ok(status)) => Err(Error::tool_failed(
                program_name,
                format!("exited with status {status}: {diagnostics}"),
            )),
            Ok(Err(e)) => Err(Error::tool_failed(
                program_name,
                format!("I/O error waiting for process: {e}"),
            )),
            Err(_elapsed) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill {} after timeout: {}", program_name, e);
                }
                Err(Error::Timeout {
                    tool: program_name,
                    timeout: self.timeout,
                    diagnostics,
                })
            }
        }
    }
}

fn join_tail(tail: &VecDeque<String>) -> String {
    tail.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
}

/// Read bytes up to and including the next `\n` or `\r`, appending all but
/// the terminator to `out`. Returns the number of bytes consumed, 0 at EOF.
async fn read_line_any_eol<R>(reader: &mut R, out: &mut Vec<u8>) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut consumed = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(consumed);
        }
        match available.iter().position(|b| *b == b'\n' || *b == b'\r') {
            Some(pos) => {
                out.extend_from_slice(&available[..pos]);
                reader.consume(pos + 1);
                return Ok(consumed + pos + 1);
            }
            None => {
                let len = available.len();
                out.extend_from_slice(available);
                reader.consume(len);
                consumed += len;
            }
        }
    }
}
