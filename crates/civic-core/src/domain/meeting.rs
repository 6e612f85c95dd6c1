use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single recorded meeting tracked from discovery to finalized summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub video_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub meeting_type: String,
    pub body_slug: String,
    /// 0 for the sole meeting on its date, otherwise 1..N among same-date meetings.
    pub sequence: u32,
}

/// A raw `(id, title)` pair listed by a video source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub id: String,
    pub title: String,
}

/// The identity of a summary file: two meetings with equal slots write to the same output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputSlot {
    pub body_slug: String,
    pub date: NaiveDate,
    pub sequence: u32,
}

impl Meeting {
    /// Folder name for this meeting (`YYYYMMDD`).
    pub fn date_folder(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// e.g. "February 04, 2025".
    pub fn human_date(&self) -> String {
        self.date.format("%B %d, %Y").to_string()
    }

    /// `""` for a solo meeting, `"-N"` otherwise.
    pub fn sequence_suffix(&self) -> String {
        match self.sequence {
            0 => String::new(),
            n => format!("-{n}"),
        }
    }

    pub fn output_slot(&self) -> OutputSlot {
        OutputSlot {
            body_slug: self.body_slug.clone(),
            date: self.date,
            sequence: self.sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meeting(sequence: u32) -> Meeting {
        Meeting {
            video_id: "abc123".to_string(),
            title: "February 4, 2025 Regular Session".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 2, 4).unwrap(),
            meeting_type: "Regular Session".to_string(),
            body_slug: "hagerstown".to_string(),
            sequence,
        }
    }

    #[test]
    fn date_formats() {
        let m = meeting(0);
        assert_eq!(m.date_folder(), "20250204");
        assert_eq!(m.iso_date(), "2025-02-04");
        assert_eq!(m.human_date(), "February 04, 2025");
    }

    #[test]
    fn sequence_suffix() {
        assert_eq!(meeting(0).sequence_suffix(), "");
        assert_eq!(meeting(2).sequence_suffix(), "-2");
    }

    #[test]
    fn output_slot_ignores_video_identity() {
        let mut other = meeting(1);
        other.video_id = "zzz".to_string();
        assert_eq!(meeting(1).output_slot(), other.output_slot());
        assert_ne!(meeting(1).output_slot(), meeting(2).output_slot());
    }
}
