use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-run counters for one body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub discovered: usize,
    pub skipped: usize,
    pub processed: usize,
    pub failed: usize,
    pub quarantined: usize,
}

/// One step of the per-meeting stage sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Transcription,
    Analysis,
    CrossReference,
    Validation,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
            Self::Analysis => "analysis",
            Self::CrossReference => "cross-reference",
            Self::Validation => "validation",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
