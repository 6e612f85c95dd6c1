use std::path::{Path, PathBuf};
use std::sync::Arc;

use process_utils::CommandRunner;

use super::args;
use crate::Result;

pub const DEFAULT_MODEL: &str = "base";

/// Audio transcription through a whisper CLI.
pub struct Whisper {
    runner: Arc<dyn CommandRunner>,
    binary: String,
    model: String,
}

impl Whisper {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        binary: impl Into<String>,
        model: Option<String>,
    ) -> Self {
        Self {
            runner,
            binary: binary.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Transcribe `audio` into `<output_dir>/<audio stem>.srt`.
    pub async fn transcribe(&self, audio: &Path, output_dir: &Path) -> Result<PathBuf> {
        let audio_arg = audio.to_string_lossy();
        let dir_arg = output_dir.to_string_lossy();
        self.runner
            .run(
                &self.binary,
                &args([
                    &*audio_arg,
                    "--model",
                    self.model.as_str(),
                    "--output_format",
                    "srt",
                    "--output_dir",
                    &*dir_arg,
                    "--language",
                    "en",
                ]),
                None,
            )
            .await?;

        let stem = audio
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(output_dir.join(format!("{stem}.srt")))
    }
}

#[cfg(test)]
mod tests {
    use process_utils::ScriptedRunner;

    use super::*;

    #[tokio::test]
    async fn srt_path_follows_audio_stem() {
        let runner = Arc::new(ScriptedRunner::new());
        let whisper = Whisper::new(runner.clone(), "whisper", Some("medium.en".to_string()));

        let srt = whisper
            .transcribe(Path::new("/data/abc.mp3"), Path::new("/data"))
            .await
            .unwrap();
        assert_eq!(srt, PathBuf::from("/data/abc.srt"));
        assert_eq!(
            runner.calls(),
            vec![
                "whisper /data/abc.mp3 --model medium.en --output_format srt --output_dir /data --language en"
                    .to_string()
            ]
        );
    }
}
