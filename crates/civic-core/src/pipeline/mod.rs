//! Per-meeting stage sequence and the body-level run loop.

mod orchestrator;
mod traits;

pub use orchestrator::{BodyReport, PipelineOrchestrator, StageFailure, Stages};
pub use traits::{CrossReferencer, SummaryGenerator, TranscriptSource, Validator, VideoSource};
