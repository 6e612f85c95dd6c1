//! Core domain types.

mod body;
mod meeting;
mod quarantine;
mod stats;
mod transcript;
mod validation;

pub use body::{Body, DATE_PLACEHOLDER};
pub use meeting::{Meeting, OutputSlot, VideoEntry};
pub use quarantine::{QuarantineEntry, QuarantineManifest, QuarantineManifestEntry};
pub use stats::{ProcessingStats, Stage};
pub use transcript::{Transcript, TranscriptOrigin};
pub use validation::{Severity, ValidationIssue, ValidationResult};

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
