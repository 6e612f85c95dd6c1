use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where a transcript came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranscriptOrigin {
    Captions,
    FallbackAudio,
}

impl fmt::Display for TranscriptOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Captions => "captions",
            Self::FallbackAudio => "fallback-audio",
        })
    }
}

/// Transcript text together with the file it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub path: PathBuf,
    pub origin: TranscriptOrigin,
}

impl Transcript {
    pub fn word_count(&self) -> usize {
        super::word_count(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
