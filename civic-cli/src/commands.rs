//! Command implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use civic_core::domain::{Body, Meeting};
use civic_core::services::check_transcript;
use civic_core::{AppConfig, PipelineOrchestrator};
use process_utils::{CommandRunner, TokioCommandRunner};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::{BodiesAction, Command, QuarantineAction};
use crate::output::OutputManager;

/// Meeting type used when a command has no title to detect one from.
const DEFAULT_MEETING_TYPE: &str = "Regular Session";

pub struct CommandExecutor {
    config: Arc<AppConfig>,
    pipeline: PipelineOrchestrator,
    out: OutputManager,
    token: CancellationToken,
}

impl CommandExecutor {
    pub fn new(config: AppConfig, out: OutputManager, token: CancellationToken) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner::new());
        Self::with_runner(config, runner, out, token)
    }

    pub fn with_runner(
        config: AppConfig,
        runner: Arc<dyn CommandRunner>,
        out: OutputManager,
        token: CancellationToken,
    ) -> Self {
        let config = Arc::new(config);
        let pipeline = PipelineOrchestrator::from_config(config.clone(), runner);
        Self {
            config,
            pipeline,
            out,
            token,
        }
    }

    pub async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::Discover { body } => self.discover(&body).await,
            Command::Transcribe {
                video_id,
                body,
                date,
                output_dir,
            } => self.transcribe(&video_id, &body, date, output_dir).await,
            Command::Analyze {
                video_id,
                body,
                date,
                transcript,
                output,
            } => self.analyze(&video_id, &body, date, transcript, output).await,
            Command::Crossref {
                file,
                body,
                date,
                in_place,
            } => self.crossref(&file, &body, date, in_place).await,
            Command::Validate { files, body } => self.validate(&files, &body).await,
            Command::Process { body, all, dry_run } => {
                self.process(body.as_deref(), all, dry_run).await
            }
            Command::Quarantine { action } => self.quarantine(action).await,
            Command::Status { body } => self.status(body.as_deref()).await,
            Command::Bodies { action } => self.bodies(action),
            Command::Version => {
                print_version();
                Ok(())
            }
        }
    }

    fn body(&self, slug: &str) -> Result<&Body> {
        Ok(self.config.get_body(slug)?)
    }

    async fn discover(&self, slug: &str) -> Result<()> {
        let body = self.body(slug)?;
        let found = self
            .pipeline
            .discovery()
            .discover(body, self.pipeline.year_filter())
            .await?;

        if found.pending.is_empty() {
            self.out.success(&format!("No new videos for {}", body.name));
            return Ok(());
        }

        self.out.info(&format!(
            "Found {} new video(s) for {}:",
            found.pending.len(),
            body.name
        ));
        for m in &found.pending {
            println!("  {} | {} | {}", m.video_id, m.iso_date(), m.title);
        }
        Ok(())
    }

    async fn transcribe(
        &self,
        video_id: &str,
        slug: &str,
        date: Option<NaiveDate>,
        output_dir: Option<PathBuf>,
    ) -> Result<()> {
        let body = self.body(slug)?;
        let meeting = adhoc_meeting(
            video_id,
            body,
            date.unwrap_or_else(|| Local::now().date_naive()),
        );
        let layout = self.config.layout(body);
        let dir = match (output_dir, date) {
            (Some(dir), _) => dir,
            (None, Some(_)) => layout.date_dir(&meeting),
            (None, None) => layout.finalized_dir(),
        };

        let transcript = self
            .pipeline
            .stages()
            .transcripts
            .obtain(&meeting, &dir)
            .await?;
        check_transcript(&transcript)?;

        self.out.success(&format!(
            "Transcript saved: {} ({} words, source: {})",
            transcript.path.display(),
            transcript.word_count(),
            transcript.origin
        ));
        println!("{}", transcript.path.display());
        Ok(())
    }

    async fn analyze(
        &self,
        video_id: &str,
        slug: &str,
        date: NaiveDate,
        transcript: Option<PathBuf>,
        output: Option<PathBuf>,
    ) -> Result<()> {
        let body = self.body(slug)?;
        let meeting = adhoc_meeting(video_id, body, date);
        let transcript_path = transcript.unwrap_or_else(|| {
            self.config
                .layout(body)
                .date_dir(&meeting)
                .join(format!("{video_id}.srt"))
        });

        let text = tokio::fs::read_to_string(&transcript_path)
            .await
            .with_context(|| format!("reading transcript {}", transcript_path.display()))?;

        let summary = self
            .pipeline
            .stages()
            .generator
            .generate(&meeting, &text, body)
            .await?;

        match output {
            Some(path) => {
                tokio::fs::write(&path, &summary)
                    .await
                    .with_context(|| format!("writing summary {}", path.display()))?;
                self.out
                    .success(&format!("Summary written to {}", path.display()));
            }
            None => print!("{summary}"),
        }
        Ok(())
    }

    async fn crossref(&self, file: &Path, slug: &str, date: NaiveDate, in_place: bool) -> Result<()> {
        let body = self.body(slug)?;
        let content = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;

        let meeting = adhoc_meeting("", body, date);
        let linked = self
            .pipeline
            .stages()
            .crossref
            .cross_reference(&content, &meeting, body)
            .await;

        if in_place {
            tokio::fs::write(file, &linked)
                .await
                .with_context(|| format!("writing {}", file.display()))?;
            self.out.success(&format!(
                "Cross-references updated in {}",
                file.display()
            ));
        } else {
            print!("{linked}");
        }
        Ok(())
    }

    async fn validate(&self, files: &[PathBuf], slug: &str) -> Result<()> {
        let body = self.body(slug)?;
        let validator = &self.pipeline.stages().validator;
        let mut failed = 0usize;

        for file in files {
            let content = match tokio::fs::read_to_string(file).await {
                Ok(content) => content,
                Err(e) => {
                    self.out
                        .failure(&format!("Cannot read {}: {e}", file.display()));
                    failed += 1;
                    continue;
                }
            };

            let result = validator.validate(&content, body);
            println!("\n--- {} ---", file.display());
            if result.is_valid() {
                self.out.success("PASS");
            } else {
                self.out.failure("FAIL");
                failed += 1;
            }
            for issue in &result.issues {
                println!("  {issue}");
            }
        }

        if failed > 0 {
            bail!("validation failed for {failed} of {} file(s)", files.len());
        }
        Ok(())
    }

    async fn process(&self, slug: Option<&str>, all: bool, dry_run: bool) -> Result<()> {
        if let Some(slug) = slug {
            let body = self.body(slug)?;
            let stats = self
                .pipeline
                .process_body(body, dry_run, &self.token)
                .await?;
            self.out.stats(&body.name, &stats);
            return Ok(());
        }

        if !all && self.config.bodies.len() > 1 {
            bail!("multiple bodies configured; use --body=<slug> or --all");
        }

        let reports = self.pipeline.process_all(dry_run, &self.token).await;
        let mut failed = Vec::new();
        for (slug, report) in &reports {
            let name = self
                .config
                .get_body(slug)
                .map(|b| b.name.as_str())
                .unwrap_or(slug);
            self.out.stats(name, &report.stats);
            if let Some(error) = &report.error {
                self.out.failure(error);
                failed.push(slug.as_str());
            }
        }

        if self.token.is_cancelled() {
            bail!(civic_core::Error::Cancelled);
        }
        if !failed.is_empty() {
            bail!("processing failed for: {}", failed.join(", "));
        }
        Ok(())
    }

    async fn quarantine(&self, action: QuarantineAction) -> Result<()> {
        let store = self.pipeline.quarantine();
        match action {
            QuarantineAction::List { body } => {
                let body = self.body(&body)?;
                let entries = store.list_quarantined(body).await?;
                if entries.is_empty() {
                    self.out
                        .success(&format!("No quarantined items for {}", body.name));
                    return Ok(());
                }

                self.out
                    .info(&format!("Quarantined items for {}:", body.name));
                for e in &entries {
                    println!("  Video: {}", e.video_id);
                    println!("    Date:    {}", e.meeting_date);
                    println!("    Retries: {}", e.retry_count);
                    println!("    Error:   {}", e.last_error);
                    println!(
                        "    Since:   {}\n",
                        e.quarantined_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
                Ok(())
            }
            QuarantineAction::Retry { video_id, body } => {
                let body = self.body(&body)?;
                match video_id {
                    Some(id) => {
                        self.out.info(&format!("Retrying video {id}..."));
                        if self
                            .pipeline
                            .retry_quarantined_entry(body, &id, &self.token)
                            .await?
                        {
                            self.out.success(&format!("{id} recovered"));
                            Ok(())
                        } else {
                            bail!("retry of {id} failed, still quarantined");
                        }
                    }
                    None => {
                        let stats = self.pipeline.retry_quarantined(body, &self.token).await?;
                        self.out.stats(&body.name, &stats);
                        Ok(())
                    }
                }
            }
            QuarantineAction::Remove { video_id, body } => {
                let body = self.body(&body)?;
                if store.remove(body, &video_id).await? {
                    self.out
                        .success(&format!("Removed {video_id} from quarantine"));
                } else {
                    self.out
                        .warning(&format!("{video_id} is not quarantined"));
                }
                Ok(())
            }
        }
    }

    async fn status(&self, slug: Option<&str>) -> Result<()> {
        let bodies: Vec<&Body> = match slug {
            Some(slug) => vec![self.body(slug)?],
            None => self.config.bodies().collect(),
        };

        for body in bodies {
            self.out.banner(&body.name);
            let finalized = self.config.layout(body).finalized_dir();
            let count = count_summaries(&finalized).await;
            self.out.field("Finalized summaries", &count.to_string(), 20);

            let entries = self
                .pipeline
                .quarantine()
                .list_quarantined(body)
                .await
                .unwrap_or_default();
            self.out.field("Quarantined", &entries.len().to_string(), 20);
            for e in &entries {
                println!(
                    "    - {} (date: {}, retries: {}, error: {})",
                    e.video_id, e.meeting_date, e.retry_count, e.last_error
                );
            }
            println!();
        }
        Ok(())
    }

    fn bodies(&self, action: BodiesAction) -> Result<()> {
        match action {
            BodiesAction::List => {
                self.out.info("Configured bodies:");
                for body in self.config.bodies() {
                    println!("  {}: {}", body.slug, body.name);
                    println!("    Source: {}", body.discovery_url());
                    println!("    Template: {}\n", body.prompt_template);
                }
            }
            BodiesAction::Show { slug } => {
                let body = self.body(&slug)?;
                let layout = self.config.layout(body);
                let w = 17;

                self.out.banner(&body.name);
                self.out.field("Slug", &body.slug, w);
                if !body.playlist_id.is_empty() {
                    self.out.field("Playlist ID", &body.playlist_id, w);
                }
                if !body.video_source_url.is_empty() {
                    self.out.field("Video Source URL", &body.video_source_url, w);
                }
                self.out.field("Discovery URL", &body.discovery_url(), w);
                self.out.field("Output Subdir", &body.output_subdir, w);
                self.out.field("Filename Pattern", &body.filename_pattern, w);
                self.out.field("Date Regex", &body.title_date_regex, w);
                self.out.field("Prompt Template", &body.prompt_template, w);
                self.out.field("Author", &body.author, w);
                self.out.field("Tags", &body.tags.join(", "), w);
                if !body.meeting_types.is_empty() {
                    self.out.field("Meeting Types", &body.meeting_types.join(", "), w);
                }
                self.out
                    .field("Output Dir", &layout.body_dir().display().to_string(), w);
                self.out.field(
                    "Finalized Dir",
                    &layout.finalized_dir().display().to_string(),
                    w,
                );
            }
        }
        Ok(())
    }
}

pub fn print_version() {
    println!("civic-summary {}", env!("CARGO_PKG_VERSION"));
}

/// A meeting built from command arguments rather than discovery.
fn adhoc_meeting(video_id: &str, body: &Body, date: NaiveDate) -> Meeting {
    info!(video_id, body = %body.slug, date = %date, "Running single stage");
    Meeting {
        video_id: video_id.to_string(),
        title: String::new(),
        date,
        meeting_type: DEFAULT_MEETING_TYPE.to_string(),
        body_slug: body.slug.clone(),
        sequence: 0,
    }
}

/// Markdown files across all `<finalized>/<date>/` folders. Missing dirs count as zero.
async fn count_summaries(finalized: &Path) -> usize {
    let Ok(mut dates) = tokio::fs::read_dir(finalized).await else {
        return 0;
    };

    let mut count = 0;
    while let Ok(Some(date_dir)) = dates.next_entry().await {
        if !date_dir.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let Ok(mut files) = tokio::fs::read_dir(date_dir.path()).await else {
            continue;
        };
        while let Ok(Some(file)) = files.next_entry().await {
            if file.path().extension().is_some_and(|ext| ext == "md") {
                count += 1;
            }
        }
    }
    count
}
