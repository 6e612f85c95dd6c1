//! Small process-related helpers shared across the workspace.
//!
//! Every external tool (yt-dlp, whisper, claude) is invoked through the
//! [`CommandRunner`] trait so adapters can be exercised without real binaries.

use std::ffi::OsStr;
use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[cfg(feature = "testing")]
mod scripted;

#[cfg(feature = "testing")]
pub use scripted::ScriptedRunner;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Apply the Windows `CREATE_NO_WINDOW` flag to child processes.
///
/// On non-Windows targets this is a no-op.
pub trait NoWindowExt {
    fn no_window(&mut self);
}

impl NoWindowExt for tokio::process::Command {
    fn no_window(&mut self) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
    }
}

/// Create a `tokio::process::Command` with `CREATE_NO_WINDOW` applied on Windows.
pub fn tokio_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    cmd.no_window();
    cmd
}

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `-1` when the process was terminated by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Failure to run a child process, feed its stdin, or a non-zero exit.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to execute `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write stdin of `{program}`: {source}")]
    Stdin {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("command `{program}` exited with code {}: {}", .output.exit_code, .output.stderr.trim())]
    Exit { program: String, output: CommandOutput },
}

/// Executes external commands and captures their output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, optionally writing `stdin` to the child.
    ///
    /// A non-zero exit status is reported as [`CommandError::Exit`].
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<CommandOutput, CommandError>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<CommandOutput, CommandError> {
        debug!(program, ?args, "Spawning command");

        let mut cmd = tokio_command(program);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        let spawn_err = |source| CommandError::Spawn {
            program: program.to_string(),
            source,
        };

        let mut child = cmd.spawn().map_err(spawn_err)?;

        // The writer runs beside `wait_with_output` so a child that fills its
        // stdout pipe before draining stdin cannot deadlock us.
        let writer = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => {
                let input = input.to_owned();
                Some(tokio::spawn(async move {
                    pipe.write_all(input.as_bytes()).await
                    // `pipe` drops here, closing stdin for tools that read until EOF.
                }))
            }
            _ => None,
        };

        let out = child.wait_with_output().await.map_err(spawn_err)?;

        if let Some(writer) = writer
            && let Ok(Err(e)) = writer.await
            && e.kind() != io::ErrorKind::BrokenPipe
        {
            return Err(CommandError::Stdin {
                program: program.to_string(),
                source: e,
            });
        }

        let output = CommandOutput {
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            exit_code: out.status.code().unwrap_or(-1),
        };

        if !out.status.success() {
            return Err(CommandError::Exit {
                program: program.to_string(),
                output,
            });
        }

        Ok(output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout() {
        let runner = TokioCommandRunner::new();
        let out = runner
            .run("echo", &["hello".to_string()], None)
            .await
            .unwrap();
        assert_eq!(out.stdout, "hello\n");
        assert!(out.success());
    }

    #[tokio::test]
    async fn pipes_stdin() {
        let runner = TokioCommandRunner::new();
        let out = runner.run("cat", &[], Some("prompt text")).await.unwrap();
        assert_eq!(out.stdout, "prompt text");
    }

    #[tokio::test]
    async fn non_zero_exit_is_an_error() {
        let runner = TokioCommandRunner::new();
        let err = runner.run("false", &[], None).await.unwrap_err();
        assert!(matches!(err, CommandError::Exit { .. }));
        assert!(err.to_string().contains("exited with code 1"));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let runner = TokioCommandRunner::new();
        let err = runner
            .run("nonexistent-command-civic-xyz", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
        assert!(err.to_string().starts_with("failed to execute `nonexistent-command-civic-xyz`"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn stdin_failure_names_the_pipe() {
        let err = CommandError::Stdin {
            program: "claude".to_string(),
            source: io::Error::other("disk gone"),
        };
        assert_eq!(err.to_string(), "failed to write stdin of `claude`: disk gone");
    }

    #[test]
    fn exit_error_trims_stderr() {
        let err = CommandError::Exit {
            program: "yt-dlp".to_string(),
            output: CommandOutput {
                stderr: "  ERROR: private video\n".to_string(),
                exit_code: 1,
                ..Default::default()
            },
        };
        assert_eq!(
            err.to_string(),
            "command `yt-dlp` exited with code 1: ERROR: private video"
        );
    }
}
