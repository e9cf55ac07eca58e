// src/system/executor.rs

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, #[source] std::io::Error),
    #[error("Command '{0}' exited with a non-zero error code.")]
    NonZeroExitStatus(String),
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Per-invocation settings: working directory override and extra
/// environment variables, on top of the inherited environment.
#[derive(Debug, Default, Clone)]
pub struct ExecOptions {
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl ExecOptions {
    pub fn in_dir(cwd: Option<&Path>) -> Self {
        Self {
            cwd: cwd.map(Path::to_path_buf),
            env: Vec::new(),
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// The collected result of a finished external command.
///
/// A non-zero exit is not an `ExecutionError` here; callers that tolerate
/// tool findings (linters, test runners) inspect `success` and still get the
/// capture.
#[derive(Debug)]
pub struct Execution {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

fn display_line(cmd_and_args: &[String]) -> String {
    cmd_and_args.join(" ")
}

fn build(cmd_and_args: &[String], opts: &ExecOptions) -> Result<StdCommand, ExecutionError> {
    let (program, args) = cmd_and_args.split_first().ok_or(ExecutionError::EmptyCommand)?;

    let mut cmd = StdCommand::new(program);
    cmd.args(args);
    if let Some(dir) = &opts.cwd {
        cmd.current_dir(dir);
    }
    for (key, value) in &opts.env {
        cmd.env(key, value);
    }
    Ok(cmd)
}

/// Runs an external command to completion, capturing stdout and stderr.
///
/// Blocks the calling thread until the process exits; there is no timeout or
/// cancellation. Errors are spawn-level only; the exit status is reported in
/// the returned [`Execution`].
pub fn capture(cmd_and_args: &[String], opts: &ExecOptions) -> Result<Execution, ExecutionError> {
    let line = display_line(cmd_and_args);
    log::debug!("Executing (captured): {line}");

    let output = build(cmd_and_args, opts)?
        .output()
        .map_err(|e| ExecutionError::CommandFailed(line.clone(), e))?;

    let stdout =
        String::from_utf8(output.stdout).map_err(|source| ExecutionError::InvalidUtf8Output {
            command: line.clone(),
            source,
        })?;
    let stderr =
        String::from_utf8(output.stderr).map_err(|source| ExecutionError::InvalidUtf8Output {
            command: line.clone(),
            source,
        })?;

    Ok(Execution {
        success: output.status.success(),
        stdout,
        stderr,
    })
}

/// Runs an external command, streaming its output to the given sinks and
/// mapping a non-zero exit status to an error.
///
/// Both streams are forwarded as the child produces them, so long-running
/// tools show progress instead of dumping everything after exit.
pub fn run(
    cmd_and_args: &[String],
    opts: &ExecOptions,
    out: &mut (dyn Write + Send),
    err: &mut (dyn Write + Send),
) -> Result<(), ExecutionError> {
    let line = display_line(cmd_and_args);
    log::debug!("Executing: {line}");

    let mut cmd = build(cmd_and_args, opts)?;
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = cmd
        .spawn()
        .map_err(|e| ExecutionError::CommandFailed(line.clone(), e))?;

    // Stderr drains on its own thread so neither pipe can fill up and
    // stall the child while the other one is being read.
    let mut child_out = child.stdout.take();
    let mut child_err = child.stderr.take();
    std::thread::scope(|scope| {
        scope.spawn(move || {
            if let Some(stream) = child_err.as_mut() {
                let _ = io::copy(stream, err);
            }
        });
        if let Some(stream) = child_out.as_mut() {
            let _ = io::copy(stream, out);
        }
    });

    let status = child
        .wait()
        .map_err(|e| ExecutionError::CommandFailed(line.clone(), e))?;

    if status.success() {
        Ok(())
    } else {
        Err(ExecutionError::NonZeroExitStatus(line))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn empty_command_is_an_error() {
        let err = capture(&[], &ExecOptions::default()).unwrap_err();
        assert!(matches!(err, ExecutionError::EmptyCommand));
    }

    #[test]
    fn unknown_program_is_a_spawn_failure() {
        let err = capture(
            &cmd(&["taskforge-definitely-not-a-real-program"]),
            &ExecOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExecutionError::CommandFailed(..)));
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_and_exit_status() {
        let exec = capture(&cmd(&["sh", "-c", "echo hi"]), &ExecOptions::default()).unwrap();
        assert!(exec.success);
        assert_eq!(exec.stdout, "hi\n");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_reported_not_errored_when_capturing() {
        let exec = capture(&cmd(&["sh", "-c", "exit 3"]), &ExecOptions::default()).unwrap();
        assert!(!exec.success);
    }

    #[cfg(unix)]
    #[test]
    fn run_maps_non_zero_exit_to_an_error() {
        let mut out = Vec::new();
        let mut err_sink = Vec::new();
        let err = run(
            &cmd(&["sh", "-c", "echo oops >&2; exit 1"]),
            &ExecOptions::default(),
            &mut out,
            &mut err_sink,
        )
        .unwrap_err();

        assert!(matches!(err, ExecutionError::NonZeroExitStatus(_)));
        assert_eq!(String::from_utf8_lossy(&err_sink), "oops\n");
    }

    #[cfg(unix)]
    #[test]
    fn both_streams_are_forwarded_even_when_a_pipe_fills_up() {
        // Well over one pipe buffer lands on stderr before anything is
        // written to stdout; reading the streams one after the other
        // would stall here.
        let mut out = Vec::new();
        let mut err_sink = Vec::new();
        run(
            &cmd(&["sh", "-c", "seq 1 20000 >&2; echo done"]),
            &ExecOptions::default(),
            &mut out,
            &mut err_sink,
        )
        .unwrap();

        assert_eq!(String::from_utf8_lossy(&out), "done\n");
        assert!(err_sink.len() > 65536, "stderr was not fully drained");
    }

    #[cfg(unix)]
    #[test]
    fn extra_environment_reaches_the_child() {
        let exec = capture(
            &cmd(&["sh", "-c", "printf %s \"$FORGE_PROBE\""]),
            &ExecOptions::default().env("FORGE_PROBE", "42"),
        )
        .unwrap();
        assert_eq!(exec.stdout, "42");
    }

    #[cfg(unix)]
    #[test]
    fn working_directory_override_applies() {
        let dir = tempfile::tempdir().unwrap();
        let exec = capture(
            &cmd(&["sh", "-c", "pwd"]),
            &ExecOptions::in_dir(Some(dir.path())),
        )
        .unwrap();
        let reported = exec.stdout.trim();
        // Compare canonically; the temp dir may be behind a symlink.
        assert_eq!(
            std::fs::canonicalize(reported).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }
}
