//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use civic_core::domain::{Body, Meeting, Transcript, TranscriptOrigin, VideoEntry};
use civic_core::pipeline::{SummaryGenerator, TranscriptSource, VideoSource};
use civic_core::services::{SummaryValidator, WikilinkCrossReferencer};
use civic_core::{AppConfig, Error, PipelineOrchestrator, Result, RetryPolicy, Stages};

pub fn body(slug: &str) -> Body {
    Body {
        slug: slug.to_string(),
        name: format!("{slug} council"),
        playlist_id: format!("PL-{slug}"),
        video_source_url: String::new(),
        output_subdir: slug.to_string(),
        filename_pattern: format!("{slug}-{{date}}-Summary"),
        title_date_regex: r"(\w+ \d{1,2}(?:st|nd|rd|th)?,? \d{4})".to_string(),
        tags: vec![slug.to_string()],
        prompt_template: "prompt.md".to_string(),
        meeting_types: Vec::new(),
        author: "Citizen Observer".to_string(),
        footer_text: String::new(),
    }
}

pub fn config(output_dir: &Path, slugs: &[&str]) -> AppConfig {
    let mut config = AppConfig {
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    };
    config.bodies = slugs
        .iter()
        .map(|s| (s.to_string(), body(s)))
        .collect::<BTreeMap<_, _>>();
    config
}

pub fn entry(id: &str, title: &str) -> VideoEntry {
    VideoEntry {
        id: id.to_string(),
        title: title.to_string(),
    }
}

/// Lists scripted entries per discovery URL. Unknown URLs fail.
#[derive(Default)]
pub struct FakeSource {
    listings: Mutex<HashMap<String, Vec<VideoEntry>>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, body: &Body, entries: Vec<VideoEntry>) -> Self {
        self.set(body, entries);
        self
    }

    pub fn set(&self, body: &Body, entries: Vec<VideoEntry>) {
        self.listings
            .lock()
            .unwrap()
            .insert(body.discovery_url(), entries);
    }
}

#[async_trait]
impl VideoSource for FakeSource {
    async fn list_recent(&self, source_url: &str, _: Option<i32>) -> Result<Vec<VideoEntry>> {
        self.listings
            .lock()
            .unwrap()
            .get(source_url)
            .cloned()
            .ok_or_else(|| Error::other(format!("ERROR: unable to list {source_url}")))
    }

    async fn fetch_captions(&self, _: &str, _: &Path) -> Result<Option<PathBuf>> {
        Ok(None)
    }

    async fn fetch_audio(&self, _: &str, _: &Path) -> Result<()> {
        Ok(())
    }
}

/// Writes a `<id>.srt` transcript of `words` words.
pub struct FakeTranscripts {
    pub words: usize,
    pub calls: AtomicU32,
}

impl FakeTranscripts {
    pub fn new(words: usize) -> Self {
        Self {
            words,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl TranscriptSource for FakeTranscripts {
    async fn obtain(&self, meeting: &Meeting, dir: &Path) -> Result<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = "council ".repeat(self.words);
        let path = dir.join(format!("{}.srt", meeting.video_id));
        tokio::fs::write(&path, &text).await?;
        Ok(Transcript {
            text,
            path,
            origin: TranscriptOrigin::Captions,
        })
    }
}

/// Produces a valid summary unless the video id is marked as failing or
/// given a scripted response.
#[derive(Default)]
pub struct FakeGenerator {
    failing: Mutex<HashSet<String>>,
    responses: Mutex<HashMap<String, String>>,
    pub calls: AtomicU32,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, video_id: &str) {
        self.failing.lock().unwrap().insert(video_id.to_string());
    }

    pub fn respond_with(&self, video_id: &str, content: String) {
        self.responses
            .lock()
            .unwrap()
            .insert(video_id.to_string(), content);
    }

    pub fn recover(&self, video_id: &str) {
        self.failing.lock().unwrap().remove(video_id);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryGenerator for FakeGenerator {
    async fn generate(&self, meeting: &Meeting, _: &str, body: &Body) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&meeting.video_id) {
            return Err(Error::other("claude exited with code 1"));
        }
        if let Some(content) = self.responses.lock().unwrap().get(&meeting.video_id) {
            return Ok(content.clone());
        }
        Ok(valid_summary(meeting, body))
    }
}

pub fn valid_summary(meeting: &Meeting, body: &Body) -> String {
    format!(
        "---\ndate: 2025-06-01\nauthor: {author}\ntags:\n  - {slug}\nsource: {url}\nmeeting_date: {iso}\n---\n\n# {name}\n\n## 1. Overview\n[00:00:10] Call to order.\n## 2. Votes\n## 3. Discussion\n## 4. Public Comment\n## 5. Next Steps\n{filler}\n## Conclusion\nThis citizen summary was created by a resident.\n",
        author = body.author,
        slug = body.slug,
        url = body.video_url(&meeting.video_id),
        iso = meeting.iso_date(),
        name = body.name,
        filler = "word ".repeat(1100),
    )
}

pub fn meeting(body: &Body, id: &str, date: NaiveDate, sequence: u32) -> Meeting {
    Meeting {
        video_id: id.to_string(),
        title: format!("{} Regular Session", date.format("%B %-d, %Y")),
        date,
        meeting_type: "Regular Session".to_string(),
        body_slug: body.slug.clone(),
        sequence,
    }
}

pub fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        delays: vec![Duration::ZERO],
    }
}

pub struct Harness {
    pub source: Arc<FakeSource>,
    pub transcripts: Arc<FakeTranscripts>,
    pub generator: Arc<FakeGenerator>,
    pub orchestrator: PipelineOrchestrator,
}

pub fn harness(config: AppConfig, source: FakeSource, policy: RetryPolicy) -> Harness {
    let source = Arc::new(source);
    let transcripts = Arc::new(FakeTranscripts::new(800));
    let generator = Arc::new(FakeGenerator::new());
    let stages = Stages {
        transcripts: transcripts.clone(),
        generator: generator.clone(),
        crossref: Arc::new(WikilinkCrossReferencer::new(config.output_dir.clone())),
        validator: Arc::new(SummaryValidator::new()),
    };
    let orchestrator = PipelineOrchestrator::new(Arc::new(config), source.clone(), stages)
        .with_retry_policy(policy)
        .with_year_filter(None);

    Harness {
        source,
        transcripts,
        generator,
        orchestrator,
    }
}
