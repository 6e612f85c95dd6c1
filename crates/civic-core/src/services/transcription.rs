use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::{Meeting, Transcript, TranscriptOrigin};
use crate::executor::Whisper;
use crate::pipeline::{TranscriptSource, VideoSource};
use crate::utils::fs;
use crate::{Error, Result};

/// Transcripts shorter than this are not worth summarizing.
pub const MIN_TRANSCRIPT_WORDS: usize = 500;

/// Captions first, audio plus whisper as the fallback.
pub struct Transcriber {
    source: Arc<dyn VideoSource>,
    whisper: Option<Whisper>,
}

impl Transcriber {
    pub fn new(source: Arc<dyn VideoSource>, whisper: Option<Whisper>) -> Self {
        Self { source, whisper }
    }

    async fn try_captions(&self, meeting: &Meeting, dir: &Path) -> Result<Option<Transcript>> {
        let Some(srt) = self.source.fetch_captions(&meeting.video_id, dir).await? else {
            return Ok(None);
        };
        let text = fs::read_to_string_with_op("reading captions", &srt).await?;

        let target = dir.join(format!("{}.srt", meeting.video_id));
        let path = if srt == target {
            srt
        } else {
            match tokio::fs::rename(&srt, &target).await {
                Ok(()) => target,
                Err(e) => {
                    debug!(path = %srt.display(), error = %e, "Keeping caption file name");
                    srt
                }
            }
        };

        Ok(Some(Transcript {
            text,
            path,
            origin: TranscriptOrigin::Captions,
        }))
    }

    async fn try_whisper(&self, meeting: &Meeting, dir: &Path) -> Result<Transcript> {
        let whisper = self
            .whisper
            .as_ref()
            .ok_or_else(|| Error::config("whisper not configured"))?;

        let audio: PathBuf = dir.join(format!("{}.mp3", meeting.video_id));
        self.source.fetch_audio(&meeting.video_id, &audio).await?;
        let srt = whisper.transcribe(&audio, dir).await?;
        let text = fs::read_to_string_with_op("reading transcript", &srt).await?;

        Ok(Transcript {
            text: text.trim().to_string(),
            path: srt,
            origin: TranscriptOrigin::FallbackAudio,
        })
    }
}

#[async_trait]
impl TranscriptSource for Transcriber {
    async fn obtain(&self, meeting: &Meeting, dir: &Path) -> Result<Transcript> {
        fs::ensure_dir_all_with_op("creating transcript dir", dir).await?;

        match self.try_captions(meeting, dir).await {
            Ok(Some(t)) if !t.is_empty() => {
                info!(video_id = %meeting.video_id, words = t.word_count(), "Transcript from captions");
                return Ok(t);
            }
            Ok(_) => info!(video_id = %meeting.video_id, "No captions, falling back to audio"),
            Err(e) => warn!(video_id = %meeting.video_id, error = %e, "Captions failed, falling back to audio"),
        }

        let t = self.try_whisper(meeting, dir).await?;
        info!(video_id = %meeting.video_id, words = t.word_count(), "Transcript from audio");
        Ok(t)
    }
}

/// Reject empty or too-short transcripts.
pub fn check_transcript(transcript: &Transcript) -> Result<()> {
    if transcript.is_empty() {
        return Err(Error::other("transcript is empty"));
    }
    let words = transcript.word_count();
    if words < MIN_TRANSCRIPT_WORDS {
        return Err(Error::other(format!(
            "transcript too short ({words} words, need {MIN_TRANSCRIPT_WORDS})"
        )));
    }
    Ok(())
}
