//! Durable store for meetings that failed processing.
//!
//! Layout under a body's quarantine directory:
//!
//! ```text
//! quarantine/
//!   manifest.json
//!   <video-id>/
//!     metadata.json
//!     transcript.srt   (optional)
//!     output.md        (optional)
//! ```
//!
//! Entry directories are authoritative. The manifest is a cache that can be
//! regenerated with [`QuarantineStore::rebuild_manifest`], so failing to
//! update it never fails the operation that triggered the update.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::OutputLayout;
use crate::domain::{Body, Meeting, QuarantineEntry, QuarantineManifest};
use crate::utils::fs;
use crate::{Error, Result};

const METADATA_FILE: &str = "metadata.json";
const MANIFEST_FILE: &str = "manifest.json";
const TRANSCRIPT_FILE: &str = "transcript.srt";
const OUTPUT_FILE: &str = "output.md";

/// Artifacts produced before a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Salvage {
    pub transcript_path: Option<PathBuf>,
    pub partial_output: Option<String>,
}

pub struct QuarantineStore {
    output_dir: PathBuf,
    /// Serializes manifest read-modify-write cycles.
    manifest_lock: Mutex<()>,
}

impl QuarantineStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            manifest_lock: Mutex::new(()),
        }
    }

    pub fn quarantine_dir(&self, body: &Body) -> PathBuf {
        OutputLayout::new(&self.output_dir, body).quarantine_dir()
    }

    fn entry_dir(&self, body: &Body, video_id: &str) -> PathBuf {
        self.quarantine_dir(body).join(video_id)
    }

    /// Record a failed meeting. Only the metadata write can fail this call.
    pub async fn quarantine(
        &self,
        body: &Body,
        meeting: &Meeting,
        error_message: &str,
        salvage: &Salvage,
    ) -> Result<QuarantineEntry> {
        let dir = self.entry_dir(body, &meeting.video_id);
        fs::ensure_dir_all_with_op("creating quarantine entry", &dir).await?;

        let mut entry = QuarantineEntry::new(meeting, error_message);
        entry.body_slug = body.slug.clone();
        fs::write_json("writing quarantine metadata", &dir.join(METADATA_FILE), &entry).await?;

        if let Some(transcript) = &salvage.transcript_path
            && let Err(e) = tokio::fs::copy(transcript, dir.join(TRANSCRIPT_FILE)).await
        {
            debug!(video_id = %meeting.video_id, error = %e, "Transcript not preserved");
        }
        if let Some(output) = salvage.partial_output.as_deref().filter(|o| !o.is_empty())
            && let Err(e) = tokio::fs::write(dir.join(OUTPUT_FILE), output).await
        {
            debug!(video_id = %meeting.video_id, error = %e, "Partial output not preserved");
        }

        if let Err(e) = self.update_manifest(body, |m| m.insert(&entry)).await {
            warn!(body = %body.slug, video_id = %meeting.video_id, error = %e, "Failed to update quarantine manifest");
        }

        info!(
            body = %body.slug,
            video_id = %meeting.video_id,
            error = error_message,
            "Meeting quarantined"
        );
        Ok(entry)
    }

    /// Entries found by scanning entry directories, sorted by date then id.
    ///
    /// Unreadable metadata is skipped. A missing quarantine directory is empty.
    pub async fn list_quarantined(&self, body: &Body) -> Result<Vec<QuarantineEntry>> {
        let root = self.quarantine_dir(body);
        let mut dir = match tokio::fs::read_dir(&root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(fs::io_error("reading quarantine dir", &root, e)),
        };

        let mut entries = Vec::new();
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| fs::io_error("reading quarantine dir", &root, e))?
        {
            let is_dir = item.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            match fs::read_json::<QuarantineEntry>("reading quarantine metadata", &item.path().join(METADATA_FILE)).await {
                Ok(entry) => entries.push(entry),
                Err(e) => debug!(path = %item.path().display(), error = %e, "Skipping unreadable quarantine entry"),
            }
        }

        entries.sort_by(|a, b| {
            (a.meeting_date.as_str(), a.video_id.as_str())
                .cmp(&(b.meeting_date.as_str(), b.video_id.as_str()))
        });
        Ok(entries)
    }

    pub async fn get(&self, body: &Body, video_id: &str) -> Result<QuarantineEntry> {
        let path = self.entry_dir(body, video_id).join(METADATA_FILE);
        if !fs::exists(&path).await {
            return Err(Error::not_found("quarantine entry", video_id));
        }
        fs::read_json("reading quarantine metadata", &path).await
    }

    /// Bump the retry count, recording `last_error` when given.
    pub async fn increment_retry(
        &self,
        body: &Body,
        video_id: &str,
        last_error: Option<&str>,
    ) -> Result<QuarantineEntry> {
        let mut entry = self.get(body, video_id).await?;
        entry.retry_count += 1;
        if let Some(err) = last_error {
            entry.last_error = err.to_string();
        }
        let path = self.entry_dir(body, video_id).join(METADATA_FILE);
        fs::write_json("writing quarantine metadata", &path, &entry).await?;
        Ok(entry)
    }

    /// Delete an entry. Returns whether it existed.
    pub async fn remove(&self, body: &Body, video_id: &str) -> Result<bool> {
        let dir = self.entry_dir(body, video_id);
        let existed = match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(fs::io_error("removing quarantine entry", &dir, e)),
        };

        if let Err(e) = self
            .update_manifest(body, |m| {
                m.items.remove(video_id);
            })
            .await
        {
            warn!(body = %body.slug, video_id, error = %e, "Failed to update quarantine manifest");
        }

        if existed {
            info!(body = %body.slug, video_id, "Removed from quarantine");
        }
        Ok(existed)
    }

    pub async fn load_manifest(&self, body: &Body) -> Result<QuarantineManifest> {
        let path = self.quarantine_dir(body).join(MANIFEST_FILE);
        if !fs::exists(&path).await {
            return Ok(QuarantineManifest::default());
        }
        fs::read_json("reading quarantine manifest", &path).await
    }

    /// Regenerate the manifest from entry directories.
    pub async fn rebuild_manifest(&self, body: &Body) -> Result<QuarantineManifest> {
        let _guard = self.manifest_lock.lock().await;
        let manifest = self.scan_manifest(body).await?;
        self.save_manifest(body, &manifest).await?;
        Ok(manifest)
    }

    async fn scan_manifest(&self, body: &Body) -> Result<QuarantineManifest> {
        let mut manifest = QuarantineManifest::default();
        for entry in self.list_quarantined(body).await? {
            manifest.insert(&entry);
        }
        Ok(manifest)
    }

    async fn save_manifest(&self, body: &Body, manifest: &QuarantineManifest) -> Result<()> {
        let path = self.quarantine_dir(body).join(MANIFEST_FILE);
        fs::write_json("writing quarantine manifest", &path, manifest).await
    }

    async fn update_manifest<F>(&self, body: &Body, apply: F) -> Result<()>
    where
        F: FnOnce(&mut QuarantineManifest),
    {
        let _guard = self.manifest_lock.lock().await;
        let mut manifest = match self.load_manifest(body).await {
            Ok(m) => m,
            Err(e) => {
                warn!(body = %body.slug, error = %e, "Quarantine manifest unreadable, rebuilding");
                self.scan_manifest(body).await?
            }
        };
        apply(&mut manifest);
        self.save_manifest(body, &manifest).await
    }
}

/// Path of an entry's preserved transcript, if one was saved.
pub async fn preserved_transcript(entry_dir: &Path) -> Option<PathBuf> {
    let path = entry_dir.join(TRANSCRIPT_FILE);
    fs::exists(&path).await.then_some(path)
}
