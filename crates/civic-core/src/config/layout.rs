use std::path::{Path, PathBuf};

use crate::domain::{Body, Meeting};

/// Folder of finalized summaries inside a body directory.
pub const FINALIZED_DIR_NAME: &str = "Finalized Meeting Summaries";

/// On-disk locations for one body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    body_dir: PathBuf,
    filename_pattern: String,
}

impl OutputLayout {
    pub fn new(output_dir: &Path, body: &Body) -> Self {
        Self {
            body_dir: output_dir.join(&body.output_subdir),
            filename_pattern: body.filename_pattern.clone(),
        }
    }

    pub fn body_dir(&self) -> &Path {
        &self.body_dir
    }

    pub fn finalized_dir(&self) -> PathBuf {
        self.body_dir.join(FINALIZED_DIR_NAME)
    }

    pub fn automation_dir(&self) -> PathBuf {
        self.body_dir.join("Automation")
    }

    pub fn quarantine_dir(&self) -> PathBuf {
        self.automation_dir().join("quarantine")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.automation_dir().join("sequences.json")
    }

    pub fn index_path(&self) -> PathBuf {
        self.finalized_dir().join("index.md")
    }

    /// `<finalized>/<YYYYMMDD>`.
    pub fn date_dir(&self, meeting: &Meeting) -> PathBuf {
        self.finalized_dir().join(meeting.date_folder())
    }

    /// Summary file stem: pattern filled with the ISO date plus the sequence suffix.
    pub fn file_stem(&self, meeting: &Meeting) -> String {
        format!(
            "{}{}",
            self.filename_pattern
                .replace(crate::domain::DATE_PLACEHOLDER, &meeting.iso_date()),
            meeting.sequence_suffix()
        )
    }

    /// `<finalized>/<YYYYMMDD>/<stem>.md`.
    pub fn summary_path(&self, meeting: &Meeting) -> PathBuf {
        self.date_dir(meeting)
            .join(format!("{}.md", self.file_stem(meeting)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn body() -> Body {
        Body {
            slug: "hagerstown".to_string(),
            output_subdir: "Hagerstown".to_string(),
            filename_pattern: "Hagerstown-{date}-Summary".to_string(),
            ..Default::default()
        }
    }

    fn meeting(sequence: u32) -> Meeting {
        Meeting {
            video_id: "v".to_string(),
            title: String::new(),
            date: NaiveDate::from_ymd_opt(2025, 2, 4).unwrap(),
            meeting_type: "Regular Session".to_string(),
            body_slug: "hagerstown".to_string(),
            sequence,
        }
    }

    #[test]
    fn summary_path_layout() {
        let layout = OutputLayout::new(Path::new("/vault"), &body());
        assert_eq!(
            layout.summary_path(&meeting(0)),
            PathBuf::from(
                "/vault/Hagerstown/Finalized Meeting Summaries/20250204/Hagerstown-2025-02-04-Summary.md"
            )
        );
        assert_eq!(
            layout.summary_path(&meeting(2)).file_name().unwrap(),
            "Hagerstown-2025-02-04-Summary-2.md"
        );
    }

    #[test]
    fn automation_paths() {
        let layout = OutputLayout::new(Path::new("/vault"), &body());
        assert_eq!(
            layout.quarantine_dir(),
            PathBuf::from("/vault/Hagerstown/Automation/quarantine")
        );
        assert_eq!(
            layout.ledger_path(),
            PathBuf::from("/vault/Hagerstown/Automation/sequences.json")
        );
    }
}
