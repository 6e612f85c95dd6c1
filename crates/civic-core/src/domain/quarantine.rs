use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Meeting;

/// Durable failure record stored as `quarantine/<video-id>/metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarantineEntry {
    pub video_id: String,
    /// ISO date (`YYYY-MM-DD`).
    pub meeting_date: String,
    pub body_slug: String,
    #[serde(default)]
    pub sequence: u32,
    /// Older records store this under `error`.
    #[serde(alias = "error")]
    pub last_error: String,
    pub quarantined_at: DateTime<Local>,
    pub retry_count: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub meeting_type: String,
}

impl QuarantineEntry {
    pub fn new(meeting: &Meeting, error_message: impl Into<String>) -> Self {
        Self {
            video_id: meeting.video_id.clone(),
            meeting_date: meeting.iso_date(),
            body_slug: meeting.body_slug.clone(),
            sequence: meeting.sequence,
            last_error: error_message.into(),
            quarantined_at: Local::now(),
            retry_count: 0,
            title: meeting.title.clone(),
            meeting_type: meeting.meeting_type.clone(),
        }
    }

    /// Rebuild the meeting this entry was recorded for.
    ///
    /// Returns `None` when the stored date is not a valid ISO date.
    pub fn to_meeting(&self) -> Option<Meeting> {
        let date = NaiveDate::parse_from_str(&self.meeting_date, "%Y-%m-%d").ok()?;
        let meeting_type = if self.meeting_type.is_empty() {
            "Regular Session".to_string()
        } else {
            self.meeting_type.clone()
        };
        Some(Meeting {
            video_id: self.video_id.clone(),
            title: self.title.clone(),
            date,
            meeting_type,
            body_slug: self.body_slug.clone(),
            sequence: self.sequence,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarantineManifestEntry {
    pub meeting_date: String,
    pub body_slug: String,
    pub sequence: u32,
    pub added: DateTime<Local>,
}

/// Advisory index over quarantined entries; entry directories are authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarantineManifest {
    #[serde(default)]
    pub items: BTreeMap<String, QuarantineManifestEntry>,
    pub created: DateTime<Local>,
}

impl Default for QuarantineManifest {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
            created: Local::now(),
        }
    }
}

impl QuarantineManifest {
    pub fn insert(&mut self, entry: &QuarantineEntry) {
        self.items.insert(
            entry.video_id.clone(),
            QuarantineManifestEntry {
                meeting_date: entry.meeting_date.clone(),
                body_slug: entry.body_slug.clone(),
                sequence: entry.sequence,
                added: entry.quarantined_at,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meeting() -> Meeting {
        Meeting {
            video_id: "vid_a".to_string(),
            title: "March 3, 2025 Work Session".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            meeting_type: "Work Session".to_string(),
            body_slug: "bocc".to_string(),
            sequence: 1,
        }
    }

    #[test]
    fn entry_round_trips_to_meeting() {
        let entry = QuarantineEntry::new(&meeting(), "analysis: boom");
        assert_eq!(entry.retry_count, 0);
        assert_eq!(entry.meeting_date, "2025-03-03");
        assert_eq!(entry.to_meeting(), Some(meeting()));
    }

    #[test]
    fn legacy_metadata_uses_error_key() {
        let json = r#"{
            "video_id": "x1",
            "meeting_date": "2025-01-07",
            "body_slug": "hagerstown",
            "sequence": 0,
            "error": "transcription: too short",
            "quarantined_at": "2025-01-08T10:00:00.123456789-05:00",
            "retry_count": 2
        }"#;
        let entry: QuarantineEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.last_error, "transcription: too short");
        assert_eq!(entry.retry_count, 2);
        assert_eq!(entry.title, "");
        let meeting = entry.to_meeting().unwrap();
        assert_eq!(meeting.meeting_type, "Regular Session");
    }

    #[test]
    fn missing_sequence_defaults_to_zero() {
        let json = r#"{
            "video_id": "x2",
            "meeting_date": "2025-01-07",
            "body_slug": "hagerstown",
            "error": "analysis: boom",
            "quarantined_at": "2025-01-08T10:00:00-05:00",
            "retry_count": 0
        }"#;
        let entry: QuarantineEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.sequence, 0);
    }

    #[test]
    fn new_records_write_last_error() {
        let json = serde_json::to_value(QuarantineEntry::new(&meeting(), "boom")).unwrap();
        assert_eq!(json["last_error"], "boom");
        assert!(json.get("error").is_none());
    }
}
