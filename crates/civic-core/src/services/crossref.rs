use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use crate::config::OutputLayout;
use crate::domain::{Body, Meeting};
use crate::markdown::{add_wikilinks, referenced_dates};
use crate::pipeline::CrossReferencer;

/// Links date mentions to summaries already in the finalized folder.
pub struct WikilinkCrossReferencer {
    output_dir: PathBuf,
}

impl WikilinkCrossReferencer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl CrossReferencer for WikilinkCrossReferencer {
    async fn cross_reference(&self, content: &str, meeting: &Meeting, body: &Body) -> String {
        let finalized = OutputLayout::new(&self.output_dir, body).finalized_dir();

        let mut targets = HashMap::new();
        for date in referenced_dates(content, meeting.date) {
            let stem = body.filename_for(&date.format("%Y-%m-%d").to_string());
            if let Some(target) = resolve_target(&finalized, date, &stem).await {
                targets.insert(date, target);
            }
        }

        debug!(
            body = %body.slug,
            meeting_date = %meeting.iso_date(),
            links = targets.len(),
            "Cross-references resolved"
        );
        add_wikilinks(content, meeting.date, |d: NaiveDate| targets.get(&d).cloned())
    }
}

/// `<stem>.md` if present, otherwise the first `<stem>-N.md` in name order.
async fn resolve_target(finalized: &Path, date: NaiveDate, stem: &str) -> Option<String> {
    let folder = finalized.join(date.format("%Y%m%d").to_string());
    if tokio::fs::try_exists(folder.join(format!("{stem}.md")))
        .await
        .unwrap_or(false)
    {
        return Some(stem.to_string());
    }

    let prefix = format!("{stem}-");
    let mut dir = tokio::fs::read_dir(&folder).await.ok()?;
    let mut candidates = Vec::new();
    while let Ok(Some(entry)) = dir.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(candidate) = name.strip_suffix(".md")
            && candidate.starts_with(&prefix)
        {
            candidates.push(candidate.to_string());
        }
    }
    candidates.sort();
    candidates.into_iter().next()
}
