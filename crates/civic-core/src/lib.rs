//! Core of the civic meeting summary pipeline.
//!
//! A run over one government body discovers new recordings, pushes each one
//! through transcription, analysis, cross-referencing, validation and
//! persistence with bounded retries, and quarantines what still fails so a
//! later run can try again.

pub mod config;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod executor;
pub mod markdown;
pub mod pipeline;
pub mod quarantine;
pub mod retry;
pub mod services;
pub mod utils;

pub use config::{AppConfig, OutputLayout};
pub use discovery::{Discovery, DiscoveryEngine};
pub use error::{Error, Result};
pub use pipeline::{BodyReport, PipelineOrchestrator, Stages};
pub use quarantine::{QuarantineStore, Salvage};
pub use retry::{RetryError, RetryPolicy, retry_with_backoff};
