//! Subprocess execution for external engines.
//!
//! Input goes in on stdin, formatted output comes back on stdout. Input is fed
//! and output drained on their own threads while the child is polled, so the
//! timeout holds even for an engine that never reads its input. A child that
//! outlives its timeout is killed.

use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Default per-call timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Captured result of one engine invocation.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, -1 when the process was terminated by a signal.
    pub exit_code: i32,
    pub success: bool,
}

impl ProcessOutput {
    /// The engine's own diagnostic text for a failed run.
    pub fn diagnostic(&self) -> String {
        if !self.stderr.trim().is_empty() {
            self.stderr.clone()
        } else if !self.stdout.trim().is_empty() {
            self.stdout.clone()
        } else {
            format!("exited with code {}", self.exit_code)
        }
    }
}

/// Runs engine processes with a timeout.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout_ms: u64,
}

impl ProcessExecutor {
    /// A zero timeout waits indefinitely.
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Run `program` with `args`, feeding `input` on stdin when given.
    ///
    /// `engine` names the engine in any resulting error.
    pub fn run(
        &self,
        engine: &str,
        program: &Path,
        args: &[String],
        input: Option<&str>,
        cwd: Option<&Path>,
    ) -> Result<ProcessOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::engine_missing(engine)
            } else {
                Error::FormatterFailed {
                    engine: engine.to_string(),
                    diagnostic: format!("failed to start '{}': {e}", program.display()),
                }
            }
        })?;

        let mut stdout_handle = child
            .stdout
            .take()
            .map(|stdout| thread::spawn(move || read_pipe_to_string(stdout)));
        let mut stderr_handle = child
            .stderr
            .take()
            .map(|stderr| thread::spawn(move || read_pipe_to_string(stderr)));

        let mut stdin_handle = match (input, child.stdin.take()) {
            (Some(input), Some(stdin)) => {
                let input = input.to_string();
                Some(thread::spawn(move || write_pipe(stdin, &input)))
            }
            _ => None,
        };

        let timeout = Duration::from_millis(self.timeout_ms);
        let status = if timeout.is_zero() {
            child
                .wait()
                .map_err(|e| Error::Internal(format!("failed to wait for {engine}: {e}")))?
        } else {
            let start = Instant::now();
            loop {
                if let Some(status) = child
                    .try_wait()
                    .map_err(|e| Error::Internal(format!("failed to poll {engine}: {e}")))?
                {
                    break status;
                }
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    // The writer is left detached; it ends once the pipe closes.
                    drop(stdin_handle.take());
                    let _ = join_reader(stdout_handle.take());
                    let _ = join_reader(stderr_handle.take());
                    return Err(Error::FormatterTimeout {
                        engine: engine.to_string(),
                        timeout_ms: self.timeout_ms,
                    });
                }
                thread::sleep(Duration::from_millis(5));
            }
        };

        join_writer(stdin_handle.take())
            .map_err(|e| Error::Internal(format!("failed to write to {engine} stdin: {e}")))?;
        let stdout = join_reader(stdout_handle.take()).map_err(Error::Internal)?;
        let stderr = join_reader(stderr_handle.take()).map_err(Error::Internal)?;

        Ok(ProcessOutput {
            stdout,
            stderr,
            exit_code: status.code().unwrap_or(-1),
            success: status.success(),
        })
    }

    /// Run a formatter and return its stdout, or `FormatterFailed` with the
    /// engine's diagnostic when it exits unsuccessfully.
    pub fn format(
        &self,
        engine: &str,
        program: &Path,
        args: &[String],
        input: &str,
        cwd: Option<&Path>,
    ) -> Result<String> {
        let output = self.run(engine, program, args, Some(input), cwd)?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(Error::FormatterFailed {
                engine: engine.to_string(),
                diagnostic: output.diagnostic(),
            })
        }
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}

/// An engine that exits before reading everything closes the pipe; its exit
/// status is what gets reported, so a broken pipe is not an error here.
fn write_pipe<W: Write>(mut pipe: W, input: &str) -> std::io::Result<()> {
    match pipe.write_all(input.as_bytes()) {
        Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

fn join_writer(handle: Option<thread::JoinHandle<std::io::Result<()>>>) -> std::result::Result<(), String> {
    match handle {
        Some(handle) => match handle.join() {
            Ok(res) => res.map_err(|e| e.to_string()),
            Err(_) => Err("engine input writer thread panicked".to_string()),
        },
        None => Ok(()),
    }
}

fn read_pipe_to_string<R: Read>(mut pipe: R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn join_reader(handle: Option<thread::JoinHandle<std::io::Result<String>>>) -> std::result::Result<String, String> {
    match handle {
        Some(handle) => match handle.join() {
            Ok(res) => res.map_err(|e| format!("failed to read engine output: {e}")),
            Err(_) => Err("engine output reader thread panicked".to_string()),
        },
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind as FmtErrorKind;
    use std::path::PathBuf;

    #[test]
    fn test_missing_program() {
        let executor = ProcessExecutor::default();
        let result = executor.run(
            "ghost",
            &PathBuf::from("nonexistent-engine-xyz123"),
            &[],
            Some("input"),
            None,
        );
        assert_eq!(result.unwrap_err().kind(), FmtErrorKind::NotFound);
    }

    #[test]
    fn test_diagnostic_prefers_stderr() {
        let output = ProcessOutput {
            stdout: "partial".to_string(),
            stderr: "[error] stdin: SyntaxError: Unexpected token (1:9)\n".to_string(),
            exit_code: 2,
            success: false,
        };
        assert_eq!(output.diagnostic(), "[error] stdin: SyntaxError: Unexpected token (1:9)\n");

        let silent = ProcessOutput {
            stdout: String::new(),
            stderr: " ".to_string(),
            exit_code: 3,
            success: false,
        };
        assert_eq!(silent.diagnostic(), "exited with code 3");
    }

    #[test]
    #[cfg(unix)]
    #[ignore = "requires 'cat' to be available"]
    fn test_format_through_cat() {
        let executor = ProcessExecutor::default();
        let out = executor
            .format("cat", &PathBuf::from("cat"), &[], "hello world\n", None)
            .expect("cat should succeed");
        assert_eq!(out, "hello world\n");
    }

    #[test]
    #[cfg(unix)]
    #[ignore = "requires 'sleep' to be available"]
    fn test_timeout() {
        let executor = ProcessExecutor::new(5);
        let result = executor.run("sleep", &PathBuf::from("sleep"), &["1".to_string()], None, None);
        assert_eq!(result.unwrap_err().kind(), FmtErrorKind::FormatterTimeout);
    }

    #[test]
    #[cfg(unix)]
    #[ignore = "requires 'sleep' to be available"]
    fn test_timeout_when_engine_ignores_large_input() {
        // Far more than a pipe buffer holds; `sleep` never reads it.
        let input = "x".repeat(4 * 1024 * 1024);
        let executor = ProcessExecutor::new(200);
        let start = Instant::now();
        let result = executor.run("sleep", &PathBuf::from("sleep"), &["5".to_string()], Some(&input), None);
        assert_eq!(result.unwrap_err().kind(), FmtErrorKind::FormatterTimeout);
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_write_pipe_ignores_broken_pipe() {
        struct ClosedPipe;
        impl Write for ClosedPipe {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        assert!(write_pipe(ClosedPipe, "input").is_ok());

        let mut sink = Vec::new();
        write_pipe(&mut sink, "input").unwrap();
        assert_eq!(sink, b"input");
    }

    #[test]
    #[cfg(unix)]
    #[ignore = "requires 'sh' to be available"]
    fn test_nonzero_exit_is_formatter_failed() {
        let executor = ProcessExecutor::default();
        let args = vec!["-c".to_string(), "echo 'bad input' >&2; exit 2".to_string()];
        let err = executor
            .format("sh", &PathBuf::from("sh"), &args, "", None)
            .unwrap_err();
        match err {
            Error::FormatterFailed { diagnostic, .. } => assert_eq!(diagnostic, "bad input\n"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
