//! Same-date disambiguation.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::ledger::SequenceLedger;
use crate::domain::Meeting;

/// Assign sequences within one batch.
///
/// A meeting alone on its date gets 0. Meetings sharing a date are ordered
/// by video id and numbered from 1.
pub fn assign_sequences(meetings: &mut [Meeting]) {
    assign_sequences_pinned(meetings, &SequenceLedger::default());
}

/// Assign sequences, keeping every slot already pinned in `ledger`.
///
/// Pinned meetings keep their number. The rest of a date group, in id order,
/// take the lowest numbers from 1 not pinned on that date. A lone meeting on a
/// date with no pins still gets 0, so without pins this is
/// [`assign_sequences`].
pub fn assign_sequences_pinned(meetings: &mut [Meeting], ledger: &SequenceLedger) {
    let mut groups: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for (idx, meeting) in meetings.iter().enumerate() {
        groups.entry(meeting.date).or_default().push(idx);
    }

    for (date, mut indices) in groups {
        indices.sort_by(|a, b| meetings[*a].video_id.cmp(&meetings[*b].video_id));

        let mut taken = ledger.taken_on(date);
        let mut unpinned = Vec::with_capacity(indices.len());
        for idx in indices.iter().copied() {
            match ledger.pinned(&meetings[idx].video_id, date) {
                Some(seq) => meetings[idx].sequence = seq,
                None => unpinned.push(idx),
            }
        }

        if indices.len() == 1 && taken.is_empty() {
            meetings[indices[0]].sequence = 0;
            continue;
        }

        let mut next = 1u32;
        for idx in unpinned {
            while taken.contains(&next) {
                next += 1;
            }
            meetings[idx].sequence = next;
            taken.insert(next);
        }
    }
}
