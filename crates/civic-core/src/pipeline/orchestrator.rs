use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Datelike, Local};
use process_utils::CommandRunner;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

use super::traits::{CrossReferencer, SummaryGenerator, TranscriptSource, Validator, VideoSource};
use crate::config::{AppConfig, OutputLayout};
use crate::discovery::{DiscoveryEngine, SequenceLedger};
use crate::domain::{Body, Meeting, ProcessingStats, Stage};
use crate::executor::{Claude, Whisper, YtDlp};
use crate::quarantine::{QuarantineStore, Salvage};
use crate::retry::{RetryError, RetryPolicy, retry_with_backoff};
use crate::services::{
    Analyzer, SummaryValidator, Transcriber, WikilinkCrossReferencer, check_transcript,
    update_index,
};
use crate::utils::fs;
use crate::{Error, Result};

/// The stage collaborators for one orchestrator.
#[derive(Clone)]
pub struct Stages {
    pub transcripts: Arc<dyn TranscriptSource>,
    pub generator: Arc<dyn SummaryGenerator>,
    pub crossref: Arc<dyn CrossReferencer>,
    pub validator: Arc<dyn Validator>,
}

/// A failed stage sequence together with whatever it produced first.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct StageFailure {
    pub error: Error,
    pub salvage: Salvage,
}

impl StageFailure {
    fn new(stage: Stage, error: Error, salvage: &Salvage) -> Self {
        Self {
            error: Error::in_stage(stage, error),
            salvage: salvage.clone(),
        }
    }

    fn cancelled() -> Self {
        Self {
            error: Error::Cancelled,
            salvage: Salvage::default(),
        }
    }
}

/// Outcome of one body within [`PipelineOrchestrator::process_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BodyReport {
    pub stats: ProcessingStats,
    /// Set when the body run stopped early.
    pub error: Option<String>,
}

pub struct PipelineOrchestrator {
    config: Arc<AppConfig>,
    discovery: DiscoveryEngine,
    stages: Stages,
    quarantine: QuarantineStore,
    policy: RetryPolicy,
    year_filter: Option<i32>,
}

impl PipelineOrchestrator {
    pub fn new(config: Arc<AppConfig>, source: Arc<dyn VideoSource>, stages: Stages) -> Self {
        Self {
            discovery: DiscoveryEngine::new(source, config.output_dir.clone()),
            quarantine: QuarantineStore::new(config.output_dir.clone()),
            policy: config.retry_policy(),
            year_filter: Some(Local::now().year()),
            stages,
            config,
        }
    }

    /// Wire the yt-dlp, whisper and claude backed collaborators.
    pub fn from_config(config: Arc<AppConfig>, runner: Arc<dyn CommandRunner>) -> Self {
        let tools = &config.tools;
        let source: Arc<dyn VideoSource> = Arc::new(YtDlp::new(runner.clone(), tools.ytdlp.clone()));
        let whisper = tools
            .whisper
            .clone()
            .map(|bin| Whisper::new(runner.clone(), bin, tools.whisper_model.clone()));

        let stages = Stages {
            transcripts: Arc::new(Transcriber::new(source.clone(), whisper)),
            generator: Arc::new(Analyzer::new(
                Claude::new(runner, tools.claude.clone()),
                config.template_dir(),
            )),
            crossref: Arc::new(WikilinkCrossReferencer::new(config.output_dir.clone())),
            validator: Arc::new(SummaryValidator::new()),
        };
        Self::new(config, source, stages)
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Restrict discovery to titles mentioning `year`; `None` lists everything.
    pub fn with_year_filter(mut self, year: Option<i32>) -> Self {
        self.year_filter = year;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn discovery(&self) -> &DiscoveryEngine {
        &self.discovery
    }

    pub fn quarantine(&self) -> &QuarantineStore {
        &self.quarantine
    }

    pub fn stages(&self) -> &Stages {
        &self.stages
    }

    pub fn year_filter(&self) -> Option<i32> {
        self.year_filter
    }

    /// Run every configured body in slug order.
    ///
    /// A failing body is logged and reported; the others still run. Once
    /// `token` is cancelled, remaining bodies are reported as cancelled.
    pub async fn process_all(
        &self,
        dry_run: bool,
        token: &CancellationToken,
    ) -> BTreeMap<String, BodyReport> {
        let mut reports = BTreeMap::new();

        for body in self.config.bodies() {
            let mut report = BodyReport::default();
            if token.is_cancelled() {
                report.error = Some(Error::Cancelled.to_string());
                reports.insert(body.slug.clone(), report);
                continue;
            }

            let span = info_span!("process_body", body = %body.slug);
            let result = self
                .run_body(body, dry_run, token, &mut report.stats)
                .instrument(span)
                .await;
            if let Err(e) = result {
                error!(body = %body.slug, error = %e, "Body processing failed");
                report.error = Some(e.to_string());
            }
            reports.insert(body.slug.clone(), report);
        }

        reports
    }

    /// Discover, process, retry quarantined entries, then refresh the index.
    pub async fn process_body(
        &self,
        body: &Body,
        dry_run: bool,
        token: &CancellationToken,
    ) -> Result<ProcessingStats> {
        let mut stats = ProcessingStats::default();
        self.run_body(body, dry_run, token, &mut stats)
            .instrument(info_span!("process_body", body = %body.slug))
            .await?;
        Ok(stats)
    }

    async fn run_body(
        &self,
        body: &Body,
        dry_run: bool,
        token: &CancellationToken,
        stats: &mut ProcessingStats,
    ) -> Result<()> {
        // Reserve quarantined slots first so discovery cannot hand them out.
        // Those meetings get their single attempt in the quarantine pass.
        let held: HashSet<String> = match self.reserve_quarantined(body, !dry_run).await {
            Ok(meetings) => meetings.into_iter().map(|m| m.video_id).collect(),
            Err(e) => {
                warn!(body = %body.slug, error = %e, "Could not list quarantine");
                HashSet::new()
            }
        };
        let found = self.discovery.discover(body, self.year_filter).await?;
        let (waiting, fresh): (Vec<_>, Vec<_>) = found
            .pending
            .into_iter()
            .partition(|m| held.contains(&m.video_id));
        stats.discovered = fresh.len();

        if dry_run {
            for meeting in &fresh {
                info!(
                    video_id = %meeting.video_id,
                    date = %meeting.iso_date(),
                    title = %meeting.title,
                    "Would process"
                );
            }
            for meeting in &waiting {
                info!(video_id = %meeting.video_id, "Quarantined, would retry");
            }
            return Ok(());
        }
        stats.skipped = found.already_processed.len() + found.unparsed;

        for meeting in &fresh {
            let span = info_span!("meeting", video_id = %meeting.video_id, date = %meeting.iso_date());
            let outcome = self
                .process_with_retry(body, meeting, token)
                .instrument(span)
                .await;

            match outcome {
                Ok(path) => {
                    info!(video_id = %meeting.video_id, path = %path.display(), "Summary finalized");
                    stats.processed += 1;
                }
                Err(RetryError::Cancelled { .. }) => {
                    warn!(body = %body.slug, video_id = %meeting.video_id, "Run cancelled");
                    return Err(Error::Cancelled);
                }
                Err(RetryError::Exhausted { source, .. }) if source.error.is_cancelled() => {
                    warn!(body = %body.slug, video_id = %meeting.video_id, "Run cancelled");
                    return Err(Error::Cancelled);
                }
                Err(RetryError::Exhausted {
                    attempts, source, ..
                }) => {
                    let message = source.error.to_string();
                    error!(
                        video_id = %meeting.video_id,
                        attempts,
                        error = %message,
                        "Meeting failed, quarantining"
                    );
                    stats.failed += 1;
                    match self
                        .quarantine
                        .quarantine(body, meeting, &message, &source.salvage)
                        .await
                    {
                        Ok(_) => {
                            self.pin_sequence(&self.config.layout(body), meeting).await;
                            stats.quarantined += 1;
                        }
                        Err(e) => {
                            error!(video_id = %meeting.video_id, error = %e, "Quarantine failed");
                        }
                    }
                }
            }
        }

        self.quarantine_pass(body, token, stats).await?;
        self.refresh_index(body).await;
        Ok(())
    }

    /// Run only the quarantine pass for `body`.
    pub async fn retry_quarantined(
        &self,
        body: &Body,
        token: &CancellationToken,
    ) -> Result<ProcessingStats> {
        let mut stats = ProcessingStats::default();
        self.quarantine_pass(body, token, &mut stats)
            .instrument(info_span!("retry_quarantined", body = %body.slug))
            .await?;
        self.refresh_index(body).await;
        Ok(stats)
    }

    /// One attempt for one quarantined entry. Returns whether it succeeded.
    pub async fn retry_quarantined_entry(
        &self,
        body: &Body,
        video_id: &str,
        token: &CancellationToken,
    ) -> Result<bool> {
        let entry = self.quarantine.get(body, video_id).await?;
        let meeting = self
            .reserve_quarantined(body, true)
            .await?
            .into_iter()
            .find(|m| m.video_id == video_id)
            .ok_or_else(|| {
                Error::other(format!(
                    "quarantine entry {video_id} has invalid date {}",
                    entry.meeting_date
                ))
            })?;

        let succeeded = self.retry_one(body, &meeting, token).await?;
        if succeeded {
            self.refresh_index(body).await;
        }
        Ok(succeeded)
    }

    async fn quarantine_pass(
        &self,
        body: &Body,
        token: &CancellationToken,
        stats: &mut ProcessingStats,
    ) -> Result<()> {
        let meetings = match self.reserve_quarantined(body, true).await {
            Ok(meetings) => meetings,
            Err(e) => {
                warn!(body = %body.slug, error = %e, "Could not list quarantine");
                return Ok(());
            }
        };
        if meetings.is_empty() {
            return Ok(());
        }
        info!(body = %body.slug, count = meetings.len(), "Retrying quarantined meetings");

        let layout = self.config.layout(body);
        for meeting in meetings {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let existing = layout.summary_path(&meeting);
            if fs::exists(&existing).await {
                if self.slot_owner(&layout, &meeting).await.as_deref() == Some(meeting.video_id.as_str()) {
                    info!(video_id = %meeting.video_id, path = %existing.display(), "Already finalized, leaving quarantine");
                    if let Err(e) = self.quarantine.remove(body, &meeting.video_id).await {
                        warn!(video_id = %meeting.video_id, error = %e, "Failed to remove from quarantine");
                    }
                } else {
                    warn!(video_id = %meeting.video_id, path = %existing.display(), "Slot holds another meeting's summary, keeping in quarantine");
                }
                continue;
            }

            let span = info_span!("meeting", video_id = %meeting.video_id, date = %meeting.iso_date());
            if self.retry_one(body, &meeting, token).instrument(span).await? {
                stats.processed += 1;
            }
        }
        Ok(())
    }

    /// Quarantined meetings of `body`, each holding a slot in the sequence ledger.
    ///
    /// An entry already pinned keeps its pin. Otherwise its stored slot is
    /// reserved, or the next free one on its date when another video owns it.
    /// New reservations are written only when `save` is set and the ledger
    /// was readable.
    async fn reserve_quarantined(&self, body: &Body, save: bool) -> Result<Vec<Meeting>> {
        let entries = self.quarantine.list_quarantined(body).await?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let path = self.config.layout(body).ledger_path();
        let (mut ledger, readable) = match SequenceLedger::load(&path).await {
            Ok(ledger) => (ledger, true),
            Err(e) => {
                warn!(body = %body.slug, error = %e, "Ignoring unreadable sequence ledger");
                (SequenceLedger::default(), false)
            }
        };

        let mut changed = false;
        let mut meetings = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(mut meeting) = entry.to_meeting() else {
                warn!(video_id = %entry.video_id, date = %entry.meeting_date, "Skipping entry with invalid date");
                continue;
            };

            if let Some(seq) = ledger.pinned(&meeting.video_id, meeting.date) {
                meeting.sequence = seq;
            } else {
                if let Some(owner) = ledger.owner_of(meeting.date, meeting.sequence) {
                    let moved = ledger.next_free(meeting.date);
                    warn!(
                        video_id = %meeting.video_id,
                        owner,
                        from = meeting.sequence,
                        to = moved,
                        "Quarantined slot already taken, moving"
                    );
                    meeting.sequence = moved;
                }
                ledger.pin(&meeting);
                changed = true;
            }
            meetings.push(meeting);
        }

        if changed
            && save
            && readable
            && let Err(e) = ledger.save(&path).await
        {
            warn!(body = %body.slug, error = %e, "Failed to reserve quarantined sequences");
        }
        Ok(meetings)
    }

    /// Video the ledger pins to `meeting`'s slot, if the ledger is readable.
    async fn slot_owner(&self, layout: &OutputLayout, meeting: &Meeting) -> Option<String> {
        let ledger = SequenceLedger::load(&layout.ledger_path()).await.ok()?;
        ledger
            .owner_of(meeting.date, meeting.sequence)
            .map(str::to_string)
    }

    /// Single attempt without backoff. Success removes the entry; failure bumps its retry count.
    async fn retry_one(
        &self,
        body: &Body,
        meeting: &Meeting,
        token: &CancellationToken,
    ) -> Result<bool> {
        info!(video_id = %meeting.video_id, "Retrying quarantined meeting");

        match self.attempt(body, meeting, token).await {
            Ok(path) => {
                info!(video_id = %meeting.video_id, path = %path.display(), "Quarantined meeting recovered");
                if let Err(e) = self.quarantine.remove(body, &meeting.video_id).await {
                    warn!(video_id = %meeting.video_id, error = %e, "Failed to remove from quarantine");
                }
                Ok(true)
            }
            Err(failure) if failure.error.is_cancelled() => Err(Error::Cancelled),
            Err(failure) => {
                let message = failure.error.to_string();
                warn!(video_id = %meeting.video_id, error = %message, "Retry failed, keeping in quarantine");
                if let Err(e) = self
                    .quarantine
                    .increment_retry(body, &meeting.video_id, Some(&message))
                    .await
                {
                    warn!(video_id = %meeting.video_id, error = %e, "Failed to increment retry count");
                }
                Ok(false)
            }
        }
    }

    async fn process_with_retry(
        &self,
        body: &Body,
        meeting: &Meeting,
        token: &CancellationToken,
    ) -> std::result::Result<PathBuf, RetryError<StageFailure>> {
        retry_with_backoff(&self.policy, token, &meeting.video_id, |_| {
            self.attempt(body, meeting, token)
        })
        .await
    }

    /// One pass of the stage sequence, abandoned as soon as `token` is cancelled.
    async fn attempt(
        &self,
        body: &Body,
        meeting: &Meeting,
        token: &CancellationToken,
    ) -> std::result::Result<PathBuf, StageFailure> {
        tokio::select! {
            _ = token.cancelled() => Err(StageFailure::cancelled()),
            result = self.run_stages(body, meeting) => result,
        }
    }

    /// transcribe → analyze → cross-reference → validate → persist.
    pub async fn run_stages(
        &self,
        body: &Body,
        meeting: &Meeting,
    ) -> std::result::Result<PathBuf, StageFailure> {
        let layout = self.config.layout(body);
        let mut salvage = Salvage::default();

        let date_dir = layout.date_dir(meeting);
        fs::ensure_dir_all_with_op("creating date directory", &date_dir)
            .await
            .map_err(|e| StageFailure::new(Stage::Transcription, e, &salvage))?;

        let transcript = self
            .stages
            .transcripts
            .obtain(meeting, &date_dir)
            .await
            .map_err(|e| StageFailure::new(Stage::Transcription, e, &salvage))?;
        salvage.transcript_path = Some(transcript.path.clone());
        check_transcript(&transcript)
            .map_err(|e| StageFailure::new(Stage::Transcription, e, &salvage))?;

        let summary = self
            .stages
            .generator
            .generate(meeting, &transcript.text, body)
            .await
            .map_err(|e| StageFailure::new(Stage::Analysis, e, &salvage))?;
        salvage.partial_output = Some(summary.clone());

        let content = self
            .stages
            .crossref
            .cross_reference(&summary, meeting, body)
            .await;
        salvage.partial_output = Some(content.clone());

        let result = self.stages.validator.validate(&content, body);
        for issue in result.warnings() {
            warn!(video_id = %meeting.video_id, %issue, "Validation warning");
        }
        if !result.is_valid() {
            for issue in result.errors() {
                error!(video_id = %meeting.video_id, %issue, "Validation error");
            }
            return Err(StageFailure::new(
                Stage::Validation,
                Error::ValidationFailed(result.error_count()),
                &salvage,
            ));
        }

        let path = layout.summary_path(meeting);
        fs::write_with_op("writing summary", &path, content.as_bytes())
            .await
            .map_err(|e| StageFailure::new(Stage::Persist, e, &salvage))?;
        self.pin_sequence(&layout, meeting).await;

        Ok(path)
    }

    async fn pin_sequence(&self, layout: &OutputLayout, meeting: &Meeting) {
        let path = layout.ledger_path();
        let result: Result<()> = async {
            let mut ledger = SequenceLedger::load(&path).await?;
            ledger.pin(meeting);
            ledger.save(&path).await
        }
        .await;
        if let Err(e) = result {
            warn!(video_id = %meeting.video_id, error = %e, "Failed to record sequence");
        }
    }

    async fn refresh_index(&self, body: &Body) {
        if let Err(e) = update_index(&self.config.layout(body), body).await {
            warn!(body = %body.slug, error = %e, "Index update failed");
        }
    }
}
