//! Finding meetings that still need a summary.

mod dates;
mod ledger;
mod sequence;

pub use dates::parse_flexible_date;
pub use ledger::{PinnedSlot, SequenceLedger};
pub use sequence::{assign_sequences, assign_sequences_pinned};

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Datelike, Local};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::OutputLayout;
use crate::domain::{Body, Meeting, VideoEntry};
use crate::pipeline::VideoSource;
use crate::utils::fs;
use crate::{Error, Result};

/// Result of one discovery pass over a body's video source.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Meetings without a summary, ordered by date then sequence.
    pub pending: Vec<Meeting>,
    /// Meetings whose summary already exists.
    pub already_processed: Vec<Meeting>,
    /// Listed entries whose title had no parsable date.
    pub unparsed: usize,
}

pub struct DiscoveryEngine {
    source: Arc<dyn VideoSource>,
    output_dir: PathBuf,
}

impl DiscoveryEngine {
    pub fn new(source: Arc<dyn VideoSource>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            output_dir: output_dir.into(),
        }
    }

    pub fn layout(&self, body: &Body) -> OutputLayout {
        OutputLayout::new(&self.output_dir, body)
    }

    /// Unprocessed meetings from the current year.
    pub async fn discover_new(&self, body: &Body) -> Result<Vec<Meeting>> {
        let year = Local::now().year();
        Ok(self.discover(body, Some(year)).await?.pending)
    }

    /// List, parse, number and filter a body's recordings.
    ///
    /// Listing and date-pattern errors are fatal for the body. Titles without a
    /// parsable date are skipped.
    pub async fn discover(&self, body: &Body, year_filter: Option<i32>) -> Result<Discovery> {
        let date_re = Regex::new(&body.title_date_regex).map_err(|source| Error::DatePattern {
            body: body.slug.clone(),
            source,
        })?;

        let url = body.discovery_url();
        info!(body = %body.slug, source = %url, ?year_filter, "Discovering videos");

        let entries = self
            .source
            .list_recent(&url, year_filter)
            .await
            .map_err(|e| Error::SourceListing {
                body: body.slug.clone(),
                source: Box::new(e),
            })?;
        debug!(body = %body.slug, count = entries.len(), "Listed videos");

        let (mut meetings, unparsed) = parse_entries(body, &entries, &date_re);

        let layout = self.layout(body);
        let ledger = match SequenceLedger::load(&layout.ledger_path()).await {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!(body = %body.slug, error = %e, "Ignoring unreadable sequence ledger");
                SequenceLedger::default()
            }
        };
        assign_sequences_pinned(&mut meetings, &ledger);
        meetings.sort_by(|a, b| (a.date, a.sequence).cmp(&(b.date, b.sequence)));

        let mut discovery = Discovery {
            unparsed,
            ..Default::default()
        };
        for meeting in meetings {
            if fs::exists(&layout.summary_path(&meeting)).await {
                debug!(
                    body = %body.slug,
                    date = %meeting.iso_date(),
                    sequence = meeting.sequence,
                    "Already processed"
                );
                discovery.already_processed.push(meeting);
            } else {
                discovery.pending.push(meeting);
            }
        }

        info!(
            body = %body.slug,
            new = discovery.pending.len(),
            processed = discovery.already_processed.len(),
            skipped = discovery.unparsed,
            "Discovery complete"
        );
        Ok(discovery)
    }
}

/// Parse listed entries into meetings with sequence 0.
///
/// Returns the meetings and the number of entries skipped.
pub fn parse_entries(body: &Body, entries: &[VideoEntry], date_re: &Regex) -> (Vec<Meeting>, usize) {
    let mut meetings = Vec::with_capacity(entries.len());
    let mut skipped = 0;

    for entry in entries {
        match parse_meeting(body, entry, date_re) {
            Some(meeting) => meetings.push(meeting),
            None => {
                warn!(video_id = %entry.id, title = %entry.title, "Skipping video without a parsable date");
                skipped += 1;
            }
        }
    }

    (meetings, skipped)
}

fn parse_meeting(body: &Body, entry: &VideoEntry, date_re: &Regex) -> Option<Meeting> {
    let date_text = date_re.captures(&entry.title)?.get(1)?.as_str();
    let date = parse_flexible_date(date_text)?;

    Some(Meeting {
        video_id: entry.id.clone(),
        title: entry.title.clone(),
        date,
        meeting_type: detect_meeting_type(&entry.title, &body.meeting_types),
        body_slug: body.slug.clone(),
        sequence: 0,
    })
}

/// Configured types win by case-insensitive substring; then built-in heuristics.
pub fn detect_meeting_type(title: &str, configured: &[String]) -> String {
    let lower = title.to_lowercase();
    if let Some(found) = configured
        .iter()
        .find(|t| !t.is_empty() && lower.contains(&t.to_lowercase()))
    {
        return found.clone();
    }

    let label = if lower.contains("work session") {
        "Work Session"
    } else if lower.contains("special") {
        "Special Meeting"
    } else if lower.contains("evening") {
        "Evening Meeting"
    } else {
        "Regular Session"
    };
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> Body {
        Body {
            slug: "hagerstown".to_string(),
            title_date_regex: r"(\w+ \d{1,2}(?:st|nd|rd|th)?,? \d{4})".to_string(),
            ..Default::default()
        }
    }

    fn entry(id: &str, title: &str) -> VideoEntry {
        VideoEntry {
            id: id.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn configured_type_wins() {
        let types = vec!["Budget Hearing".to_string()];
        assert_eq!(
            detect_meeting_type("Special Budget Hearing May 2, 2025", &types),
            "Budget Hearing"
        );
    }

    #[test]
    fn fallback_heuristics() {
        assert_eq!(detect_meeting_type("Mayor and Council Work Session", &[]), "Work Session");
        assert_eq!(detect_meeting_type("SPECIAL meeting", &[]), "Special Meeting");
        assert_eq!(detect_meeting_type("Evening Session", &[]), "Evening Meeting");
        assert_eq!(detect_meeting_type("City Council", &[]), "Regular Session");
    }

    #[test]
    fn unparsable_titles_are_counted_not_fatal() {
        let body = body();
        let re = Regex::new(&body.title_date_regex).unwrap();
        let entries = vec![
            entry("a", "February 4, 2025 Regular Session"),
            entry("b", "Livestream test"),
            entry("c", "March 11th, 2025 Work Session"),
        ];
        let (meetings, skipped) = parse_entries(&body, &entries, &re);
        assert_eq!(skipped, 1);
        assert_eq!(meetings.len(), 2);
        assert_eq!(meetings[1].meeting_type, "Work Session");
        assert_eq!(meetings[1].date.to_string(), "2025-03-11");
    }
}
