//! Collaborator seams used by discovery and the stage sequence.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::Result;
use crate::domain::{Body, Meeting, Transcript, ValidationResult, VideoEntry};

/// Lists recordings and fetches their media.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// List `(id, title)` pairs, optionally limited to titles mentioning `year_filter`.
    async fn list_recent(&self, source_url: &str, year_filter: Option<i32>)
    -> Result<Vec<VideoEntry>>;

    /// Download captions into `dir`. `Ok(None)` means the video has none.
    async fn fetch_captions(&self, video_id: &str, dir: &Path) -> Result<Option<PathBuf>>;

    async fn fetch_audio(&self, video_id: &str, output: &Path) -> Result<()>;
}

/// Produces a transcript for a meeting inside `dir`.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn obtain(&self, meeting: &Meeting, dir: &Path) -> Result<Transcript>;
}

/// Writes the summary document from a transcript.
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn generate(&self, meeting: &Meeting, transcript: &str, body: &Body) -> Result<String>;
}

/// Links references to other meetings. Never fails; unresolvable text is left as is.
#[async_trait]
pub trait CrossReferencer: Send + Sync {
    async fn cross_reference(&self, content: &str, meeting: &Meeting, body: &Body) -> String;
}

pub trait Validator: Send + Sync {
    fn validate(&self, content: &str, body: &Body) -> ValidationResult;
}
