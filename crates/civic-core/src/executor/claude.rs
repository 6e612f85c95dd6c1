use std::sync::Arc;

use process_utils::CommandRunner;

use crate::Result;

/// Text generation through `claude --print`, prompt on stdin.
pub struct Claude {
    runner: Arc<dyn CommandRunner>,
    binary: String,
}

impl Claude {
    pub fn new(runner: Arc<dyn CommandRunner>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let output = self
            .runner
            .run(&self.binary, &["--print".to_string()], Some(prompt))
            .await?;
        Ok(output.stdout.trim().to_string())
    }
}
