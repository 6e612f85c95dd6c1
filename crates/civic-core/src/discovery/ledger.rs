//! Persisted video → sequence assignments.
//!
//! Once a summary is written, or its meeting is quarantined, the
//! `(date, sequence)` slot is pinned here so later discovery runs cannot
//! renumber it when new same-date recordings appear or old ones drop out of
//! the listing.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::domain::Meeting;
use crate::utils::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedSlot {
    pub date: NaiveDate,
    pub sequence: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceLedger {
    #[serde(default)]
    pub videos: BTreeMap<String, PinnedSlot>,
}

impl SequenceLedger {
    /// Load the ledger; a missing file yields an empty ledger.
    pub async fn load(path: &Path) -> Result<Self> {
        if !fs::exists(path).await {
            return Ok(Self::default());
        }
        fs::read_json("reading sequence ledger", path).await
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        fs::write_json("writing sequence ledger", path, self).await
    }

    pub fn pin(&mut self, meeting: &Meeting) {
        self.videos.insert(
            meeting.video_id.clone(),
            PinnedSlot {
                date: meeting.date,
                sequence: meeting.sequence,
            },
        );
    }

    /// Pinned sequence for `video_id`, if it was pinned on `date`.
    pub fn pinned(&self, video_id: &str, date: NaiveDate) -> Option<u32> {
        self.videos
            .get(video_id)
            .filter(|slot| slot.date == date)
            .map(|slot| slot.sequence)
    }

    /// Video pinned to `sequence` on `date`.
    pub fn owner_of(&self, date: NaiveDate, sequence: u32) -> Option<&str> {
        self.videos
            .iter()
            .find(|(_, slot)| slot.date == date && slot.sequence == sequence)
            .map(|(id, _)| id.as_str())
    }

    /// Lowest sequence from 1 not taken on `date`.
    pub fn next_free(&self, date: NaiveDate) -> u32 {
        let taken = self.taken_on(date);
        (1..).find(|seq| !taken.contains(seq)).unwrap_or(1)
    }

    /// Every sequence already taken on `date`.
    pub fn taken_on(&self, date: NaiveDate) -> BTreeSet<u32> {
        self.videos
            .values()
            .filter(|slot| slot.date == date)
            .map(|slot| slot.sequence)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn meeting(id: &str, seq: u32) -> Meeting {
        Meeting {
            video_id: id.to_string(),
            title: String::new(),
            date: NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
            meeting_type: "Regular Session".to_string(),
            body_slug: "b".to_string(),
            sequence: seq,
        }
    }

    #[tokio::test]
    async fn missing_ledger_is_empty() {
        let temp = TempDir::new().unwrap();
        let ledger = SequenceLedger::load(&temp.path().join("sequences.json"))
            .await
            .unwrap();
        assert!(ledger.videos.is_empty());
    }

    #[tokio::test]
    async fn pins_persist() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Automation").join("sequences.json");

        let mut ledger = SequenceLedger::default();
        ledger.pin(&meeting("vid_a", 1));
        ledger.save(&path).await.unwrap();

        let loaded = SequenceLedger::load(&path).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        assert_eq!(loaded.pinned("vid_a", date), Some(1));
        assert_eq!(loaded.pinned("vid_a", date.succ_opt().unwrap()), None);
        assert_eq!(loaded.taken_on(date), BTreeSet::from([1]));
    }

    #[test]
    fn owner_and_next_free() {
        let mut ledger = SequenceLedger::default();
        ledger.pin(&meeting("vid_a", 1));
        ledger.pin(&meeting("vid_c", 3));
        let date = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();

        assert_eq!(ledger.owner_of(date, 1), Some("vid_a"));
        assert_eq!(ledger.owner_of(date, 2), None);
        assert_eq!(ledger.next_free(date), 2);
        assert_eq!(ledger.next_free(date.succ_opt().unwrap()), 1);
    }
}
