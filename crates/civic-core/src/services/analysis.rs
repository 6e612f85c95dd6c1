use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Local;
use tracing::info;

use crate::Result;
use crate::domain::{Body, Meeting, word_count};
use crate::executor::Claude;
use crate::markdown::sanitize;
use crate::pipeline::SummaryGenerator;
use crate::utils::fs;

/// Renders the body's prompt template and asks the model for a summary.
pub struct Analyzer {
    claude: Claude,
    template_dir: PathBuf,
}

impl Analyzer {
    pub fn new(claude: Claude, template_dir: impl Into<PathBuf>) -> Self {
        Self {
            claude,
            template_dir: template_dir.into(),
        }
    }

    pub async fn load_template(&self, body: &Body) -> Result<String> {
        let path = self.template_dir.join(&body.prompt_template);
        fs::read_to_string_with_op("reading prompt template", &path).await
    }
}

#[async_trait]
impl SummaryGenerator for Analyzer {
    async fn generate(&self, meeting: &Meeting, transcript: &str, body: &Body) -> Result<String> {
        let template = self.load_template(body).await?;
        let prompt = build_prompt(&template, meeting, transcript, body);

        info!(
            body = %body.slug,
            video_id = %meeting.video_id,
            transcript_words = word_count(transcript),
            "Generating summary"
        );
        let raw = self.claude.complete(&prompt).await?;
        Ok(sanitize(&raw))
    }
}

/// Tag form of a meeting type.
pub fn meeting_type_tag(meeting_type: &str) -> &'static str {
    match meeting_type {
        "Work Session" => "Work-Session",
        "Special Meeting" => "Special-Meeting",
        "Evening Meeting" => "Evening-Meeting",
        _ => "Regular-Session",
    }
}

/// Fill the template placeholders. The transcript is substituted last.
pub fn build_prompt(template: &str, meeting: &Meeting, transcript: &str, body: &Body) -> String {
    let tags = body
        .tags
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(meeting_type_tag(&meeting.meeting_type)))
        .map(|t| format!("  - {t}"))
        .collect::<Vec<_>>()
        .join("\n");

    template
        .replace("{meeting_date_human}", &meeting.human_date())
        .replace("{meeting_date_iso}", &meeting.iso_date())
        .replace("{meeting_type}", &meeting.meeting_type)
        .replace("{video_id}", &meeting.video_id)
        .replace("{video_url}", &body.video_url(&meeting.video_id))
        .replace("{today}", &Local::now().format("%Y-%m-%d").to_string())
        .replace("{author}", &body.author)
        .replace("{tags}", &tags)
        .replace("{body_name}", &body.name)
        .replace("{footer_text}", &body.footer_text)
        .replace("{transcript}", transcript)
}
