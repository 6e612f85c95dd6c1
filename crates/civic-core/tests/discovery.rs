mod common;

use std::sync::Arc;

use civic_core::discovery::{DiscoveryEngine, SequenceLedger};
use civic_core::domain::Meeting;
use civic_core::{Error, OutputLayout};
use common::{FakeSource, body, entry};
use tempfile::TempDir;

fn ids(meetings: &[Meeting]) -> Vec<(&str, u32)> {
    meetings
        .iter()
        .map(|m| (m.video_id.as_str(), m.sequence))
        .collect()
}

#[tokio::test]
async fn same_date_meetings_are_numbered_by_id() {
    let temp = TempDir::new().unwrap();
    let body = body("hagerstown");
    let source = FakeSource::new().with(
        &body,
        vec![
            entry("vid_b", "February 4, 2025 Evening Session"),
            entry("vid_a", "February 4, 2025 Regular Session"),
            entry("vid_c", "February 11, 2025 Regular Session"),
        ],
    );
    let engine = DiscoveryEngine::new(Arc::new(source), temp.path());

    let found = engine.discover(&body, None).await.unwrap();
    assert_eq!(
        ids(&found.pending),
        vec![("vid_a", 1), ("vid_b", 2), ("vid_c", 0)]
    );
    assert_eq!(found.pending[1].meeting_type, "Evening Meeting");

    let layout = OutputLayout::new(temp.path(), &body);
    assert!(
        layout
            .summary_path(&found.pending[0])
            .ends_with("20250204/hagerstown-2025-02-04-Summary-1.md")
    );
}

#[tokio::test]
async fn existing_summary_is_filtered_out() {
    let temp = TempDir::new().unwrap();
    let body = body("hagerstown");
    let date_dir = OutputLayout::new(temp.path(), &body)
        .finalized_dir()
        .join("20250204");
    tokio::fs::create_dir_all(&date_dir).await.unwrap();
    tokio::fs::write(date_dir.join("hagerstown-2025-02-04-Summary.md"), "done")
        .await
        .unwrap();

    let source = FakeSource::new().with(
        &body,
        vec![
            entry("vid_a", "February 4, 2025 Regular Session"),
            entry("vid_x", "no date here"),
        ],
    );
    let engine = DiscoveryEngine::new(Arc::new(source), temp.path());

    let found = engine.discover(&body, None).await.unwrap();
    assert!(found.pending.is_empty());
    assert_eq!(found.already_processed.len(), 1);
    assert_eq!(found.unparsed, 1);
}

#[tokio::test]
async fn rediscovery_is_stable() {
    let temp = TempDir::new().unwrap();
    let body = body("hagerstown");
    let source = FakeSource::new().with(
        &body,
        vec![
            entry("vid_b", "March 3, 2025 Regular Session"),
            entry("vid_a", "March 3, 2025 Work Session"),
        ],
    );
    let engine = DiscoveryEngine::new(Arc::new(source), temp.path());

    let first = engine.discover(&body, None).await.unwrap();
    let second = engine.discover(&body, None).await.unwrap();
    assert_eq!(ids(&first.pending), ids(&second.pending));
}

#[tokio::test]
async fn pinned_solo_slot_is_not_renumbered() {
    let temp = TempDir::new().unwrap();
    let body = body("hagerstown");
    let layout = OutputLayout::new(temp.path(), &body);
    let source = Arc::new(
        FakeSource::new().with(&body, vec![entry("vid_z", "May 6, 2025 Regular Session")]),
    );
    let engine = DiscoveryEngine::new(source.clone(), temp.path());

    // First run: vid_z alone, finalized as sequence 0.
    let first = engine.discover(&body, None).await.unwrap();
    assert_eq!(ids(&first.pending), vec![("vid_z", 0)]);
    let mut ledger = SequenceLedger::default();
    ledger.pin(&first.pending[0]);
    ledger.save(&layout.ledger_path()).await.unwrap();
    let path = layout.summary_path(&first.pending[0]);
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(&path, "done").await.unwrap();

    // A second recording for the same date shows up later.
    source.set(
        &body,
        vec![
            entry("vid_z", "May 6, 2025 Regular Session"),
            entry("vid_a", "May 6, 2025 Special Session"),
        ],
    );
    let second = engine.discover(&body, None).await.unwrap();
    assert_eq!(ids(&second.already_processed), vec![("vid_z", 0)]);
    assert_eq!(ids(&second.pending), vec![("vid_a", 1)]);
}

#[tokio::test]
async fn listing_failure_is_fatal() {
    let temp = TempDir::new().unwrap();
    let engine = DiscoveryEngine::new(Arc::new(FakeSource::new()), temp.path());

    let err = engine.discover(&body("broken"), None).await.unwrap_err();
    assert!(matches!(err, Error::SourceListing { .. }));
    assert!(err.to_string().starts_with("listing videos for broken"));
}

#[tokio::test]
async fn bad_date_pattern_is_fatal() {
    let temp = TempDir::new().unwrap();
    let mut body = body("hagerstown");
    body.title_date_regex = "(unclosed".to_string();
    let source = FakeSource::new().with(&body, vec![entry("a", "February 4, 2025")]);
    let engine = DiscoveryEngine::new(Arc::new(source), temp.path());

    let err = engine.discover(&body, None).await.unwrap_err();
    assert!(matches!(err, Error::DatePattern { .. }));
}
