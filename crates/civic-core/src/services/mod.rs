//! Concrete implementations of the stage collaborators.

mod analysis;
mod crossref;
mod index;
mod transcription;
mod validation;

pub use analysis::{Analyzer, build_prompt, meeting_type_tag};
pub use crossref::WikilinkCrossReferencer;
pub use index::update_index;
pub use transcription::{MIN_TRANSCRIPT_WORDS, Transcriber, check_transcript};
pub use validation::SummaryValidator;
