//! Government body configuration.

use serde::{Deserialize, Serialize};

/// Placeholder in `filename_pattern` replaced by the ISO meeting date.
pub const DATE_PLACEHOLDER: &str = "{date}";

/// A government entity whose meetings are processed.
///
/// Bodies are loaded from configuration and are immutable at runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Injected from the configuration table key.
    #[serde(default)]
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub playlist_id: String,
    /// Channel or stream page URL; takes precedence over `playlist_id`.
    #[serde(default)]
    pub video_source_url: String,
    pub output_subdir: String,
    /// File stem of a summary, e.g. `Hagerstown-City-Council-{date}-Citizen-Summary`.
    pub filename_pattern: String,
    /// Regex whose first capture group holds the date text of a video title.
    pub title_date_regex: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub prompt_template: String,
    #[serde(default)]
    pub meeting_types: Vec<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub footer_text: String,
}

impl Body {
    /// URL handed to the video source when listing recordings.
    pub fn discovery_url(&self) -> String {
        if !self.video_source_url.is_empty() {
            return self.video_source_url.clone();
        }
        format!("https://www.youtube.com/playlist?list={}", self.playlist_id)
    }

    pub fn video_url(&self, video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={video_id}")
    }

    /// Fill the filename pattern for an ISO date, without sequence suffix.
    pub fn filename_for(&self, iso_date: &str) -> String {
        self.filename_pattern.replace(DATE_PLACEHOLDER, iso_date)
    }
}
