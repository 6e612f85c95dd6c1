//! Recording test double for [`CommandRunner`].

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{CommandError, CommandOutput, CommandRunner};

#[derive(Debug, Clone)]
enum Scripted {
    Output(CommandOutput),
    Fail(CommandOutput),
}

/// Returns pre-configured outputs and records every invocation.
///
/// Responses are keyed by `"program arg1 arg2"`; a key holding only the
/// program name matches any arguments. Unscripted commands succeed with
/// empty output unless a default is set.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Mutex<HashMap<String, Scripted>>,
    default: Mutex<Option<CommandOutput>>,
    calls: Mutex<Vec<String>>,
    stdin: Mutex<Vec<Option<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful invocation.
    pub fn on(&self, key: impl Into<String>, stdout: impl Into<String>) -> &Self {
        self.responses.lock().insert(
            key.into(),
            Scripted::Output(CommandOutput {
                stdout: stdout.into(),
                ..Default::default()
            }),
        );
        self
    }

    /// Script an invocation that exits with `exit_code` and `stderr`.
    pub fn fail(&self, key: impl Into<String>, exit_code: i32, stderr: impl Into<String>) -> &Self {
        self.responses.lock().insert(
            key.into(),
            Scripted::Fail(CommandOutput {
                stderr: stderr.into(),
                exit_code,
                ..Default::default()
            }),
        );
        self
    }

    /// Output returned for commands with no scripted response.
    pub fn set_default(&self, stdout: impl Into<String>) {
        *self.default.lock() = Some(CommandOutput {
            stdout: stdout.into(),
            ..Default::default()
        });
    }

    /// Every invocation so far, formatted as `"program arg1 arg2"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Stdin passed to each invocation, in call order.
    pub fn stdin_inputs(&self) -> Vec<Option<String>> {
        self.stdin.lock().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<CommandOutput, CommandError> {
        let key = if args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, args.join(" "))
        };
        self.calls.lock().push(key.clone());
        self.stdin.lock().push(stdin.map(str::to_string));

        let scripted = {
            let responses = self.responses.lock();
            responses
                .get(&key)
                .or_else(|| responses.get(program))
                .cloned()
        };

        match scripted {
            Some(Scripted::Output(output)) => Ok(output),
            Some(Scripted::Fail(output)) => Err(CommandError::Exit {
                program: program.to_string(),
                output,
            }),
            None => Ok(self.default.lock().clone().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_and_matches_full_key() {
        let runner = ScriptedRunner::new();
        runner.on("git status", "clean");

        let out = runner
            .run("git", &["status".to_string()], None)
            .await
            .unwrap();
        assert_eq!(out.stdout, "clean");
        assert_eq!(runner.calls(), vec!["git status".to_string()]);
    }

    #[tokio::test]
    async fn program_key_matches_any_args() {
        let runner = ScriptedRunner::new();
        runner.fail("whisper", 2, "model missing");

        let err = runner
            .run("whisper", &["a.mp3".to_string()], None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("model missing"));
    }

    #[tokio::test]
    async fn falls_back_to_default() {
        let runner = ScriptedRunner::new();
        runner.set_default("default");
        let out = runner.run("anything", &[], Some("in")).await.unwrap();
        assert_eq!(out.stdout, "default");
        assert_eq!(runner.stdin_inputs(), vec![Some("in".to_string())]);
    }
}
