//! Safe child-process runner
//!
//! The single spawning primitive of the engine. Children are spawned from
//! argv arrays with no shell anywhere in the path; user-supplied fragments
//! (file paths, config `extraArgs`) enter as discrete argv elements and
//! any `$()`, backticks, or pipes in them stay literal bytes.
//!
//! Output capture is bounded: when a stream overflows the cap the head is
//! retained with a truncation marker plus a tail window, because the tail
//! of stderr usually carries the actual error.

use crate::constants::sizes::{CHILD_OUTPUT_TAIL_BYTES, MAX_CHILD_OUTPUT_BYTES};
use crate::error::{ProcessError, ProcessResult};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Options for one child invocation
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Working directory for the child
    pub cwd: PathBuf,
    /// Hard wall-clock limit; on expiry the child is killed and reaped
    pub timeout: Duration,
    /// Per-stream capture cap in bytes
    pub max_output_bytes: usize,
    /// Extra environment entries on top of the inherited environment
    pub env: Vec<(String, String)>,
}

impl RunOptions {
    pub fn new(cwd: PathBuf, timeout: Duration) -> Self {
        Self {
            cwd,
            timeout,
            max_output_bytes: MAX_CHILD_OUTPUT_BYTES,
            env: Vec::new(),
        }
    }
}

/// Result of a completed (or killed) child
#[derive(Debug, Default)]
pub struct RunOutput {
    /// Exit code when the child exited normally
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// True when the timeout expired and the child was killed
    pub timed_out: bool,
}

impl RunOutput {
    /// True for a clean zero exit
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// The most useful diagnostic text: the tail of stderr when present,
    /// else the tail of stdout (TypeScript and ESLint report on stdout).
    pub fn diagnostic_tail(&self, max_chars: usize) -> String {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        tail_chars(source, max_chars)
    }
}

/// Take the last `max_chars` characters of `text`, on a char boundary.
pub fn tail_chars(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim_end();
    let count = trimmed.chars().count();
    if count <= max_chars {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - max_chars).collect()
}

/// The engine's process runner
///
/// Stateless; exists as a struct so hooks receive it through the context
/// rather than reaching for a global.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Spawn `program` with `args` and await it under the options'
    /// timeout.
    ///
    /// # Errors
    ///
    /// [`ProcessError::Spawn`] when the binary cannot be started (the
    /// usual caller response is a soft-skip, not a block) and
    /// [`ProcessError::Wait`] when the OS loses the child. A non-zero
    /// exit or a timeout is a normal [`RunOutput`], not an error.
    pub async fn run(
        &self,
        program: &str,
        args: &[String],
        options: &RunOptions,
    ) -> ProcessResult<RunOutput> {
        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(&options.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &options.env {
            command.env(key, value);
        }

        tracing::debug!(program, ?args, cwd = %options.cwd.display(), "spawning child");

        let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let stdout = child.stdout.take().ok_or_else(|| ProcessError::Capture {
            program: program.to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| ProcessError::Capture {
            program: program.to_string(),
        })?;

        // Streams are drained concurrently with the wait so a chatty
        // child can never deadlock on pipe backpressure.
        let cap = options.max_output_bytes;
        let stdout_task = tokio::spawn(capture_stream(stdout, cap));
        let stderr_task = tokio::spawn(capture_stream(stderr, cap));

        let (exit_code, timed_out) =
            match tokio::time::timeout(options.timeout, child.wait()).await {
                Ok(status) => {
                    let status = status.map_err(|source| ProcessError::Wait {
                        program: program.to_string(),
                        source,
                    })?;
                    (status.code(), false)
                }
                Err(_) => {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    (None, true)
                }
            };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        Ok(RunOutput {
            exit_code,
            stdout: stdout.into_string(),
            stderr: stderr.into_string(),
            timed_out,
        })
    }
}

/// Bounded stream capture: head up to the cap, then a rolling tail.
#[derive(Default)]
struct BoundedCapture {
    head: Vec<u8>,
    tail: Vec<u8>,
    truncated: bool,
}

impl BoundedCapture {
    fn push(&mut self, chunk: &[u8], cap: usize) {
        let mut rest = chunk;
        if !self.truncated {
            let room = cap.saturating_sub(self.head.len());
            if chunk.len() <= room {
                self.head.extend_from_slice(chunk);
                return;
            }
            self.head.extend_from_slice(&chunk[..room]);
            self.truncated = true;
            rest = &chunk[room..];
        }
        self.tail.extend_from_slice(rest);
        if self.tail.len() > CHILD_OUTPUT_TAIL_BYTES {
            let excess = self.tail.len() - CHILD_OUTPUT_TAIL_BYTES;
            self.tail.drain(..excess);
        }
    }

    fn into_string(self) -> String {
        if !self.truncated {
            return String::from_utf8_lossy(&self.head).into_owned();
        }
        format!(
            "{}\n… [output truncated] …\n{}",
            String::from_utf8_lossy(&self.head),
            String::from_utf8_lossy(&self.tail)
        )
    }
}

async fn capture_stream<R>(mut reader: R, cap: usize) -> BoundedCapture
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut capture = BoundedCapture::default();
    let mut chunk = vec![0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => capture.push(&chunk[..n], cap),
        }
    }
    capture
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(timeout_ms: u64) -> RunOptions {
        RunOptions::new(std::env::temp_dir(), Duration::from_millis(timeout_ms))
    }

    #[tokio::test]
    async fn captures_stdout() {
        let runner = ProcessRunner::new();
        let output = runner
            .run("echo", &["hello".to_string()], &options(5_000))
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn shell_metacharacters_are_literal_argv() {
        let runner = ProcessRunner::new();
        let hazard = "weird;`rm -rf /`$(whoami).ts".to_string();
        let output = runner.run("echo", &[hazard.clone()], &options(5_000)).await.unwrap();
        // echo received one literal argument; nothing was interpreted
        assert_eq!(output.stdout.trim(), hazard);
    }

    #[tokio::test]
    async fn timeout_kills_and_flags() {
        let runner = ProcessRunner::new();
        let output = runner
            .run("sleep", &["30".to_string()], &options(200))
            .await
            .unwrap();
        assert!(output.timed_out);
        assert!(!output.success());
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let runner = ProcessRunner::new();
        let result = runner
            .run("definitely-not-a-binary-9b1c", &[], &options(1_000))
            .await;
        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
    }

    #[tokio::test]
    async fn nonzero_exit_is_not_an_error() {
        let runner = ProcessRunner::new();
        let output = runner
            .run("false", &[], &options(5_000))
            .await
            .unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(1));
    }

    #[test]
    fn bounded_capture_keeps_head_and_tail() {
        let mut capture = BoundedCapture::default();
        capture.push(b"head-part", 4);
        capture.push(b"tail-part", 4);
        let text = capture.into_string();
        assert!(text.starts_with("head"));
        assert!(text.contains("[output truncated]"));
        assert!(text.ends_with("tail-part"));
    }

    #[test]
    fn diagnostic_tail_prefers_stderr() {
        let output = RunOutput {
            exit_code: Some(1),
            stdout: "noise".into(),
            stderr: "error: bad thing".into(),
            timed_out: false,
        };
        assert_eq!(output.diagnostic_tail(1_000), "error: bad thing");

        let stdout_only = RunOutput {
            exit_code: Some(1),
            stdout: "src/b.ts(3,1): error TS2322".into(),
            stderr: String::new(),
            timed_out: false,
        };
        assert!(stdout_only.diagnostic_tail(1_000).contains("TS2322"));
    }

    #[test]
    fn tail_chars_respects_boundaries() {
        assert_eq!(tail_chars("abcdef", 3), "def");
        assert_eq!(tail_chars("ab", 3), "ab");
    }
}
