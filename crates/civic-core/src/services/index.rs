use std::fmt::Write as _;

use tracing::info;

use crate::config::OutputLayout;
use crate::domain::Body;
use crate::utils::fs;
use crate::{Error, Result};

/// Regenerate `<finalized>/index.md`. Returns the number of summaries listed.
///
/// A missing finalized directory is a no-op.
pub async fn update_index(layout: &OutputLayout, body: &Body) -> Result<usize> {
    let finalized = layout.finalized_dir();
    let mut dir = match tokio::fs::read_dir(&finalized).await {
        Ok(dir) => dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(fs::io_error("reading finalized dir", &finalized, e)),
    };

    let mut folders = Vec::new();
    while let Some(entry) = dir
        .next_entry()
        .await
        .map_err(|e| fs::io_error("reading finalized dir", &finalized, e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        if is_dir && name.len() == 8 && name.bytes().all(|b| b.is_ascii_digit()) {
            folders.push(name);
        }
    }
    folders.sort_unstable_by(|a, b| b.cmp(a));

    let mut lines = Vec::new();
    for folder in &folders {
        let iso = format!("{}-{}-{}", &folder[..4], &folder[4..6], &folder[6..]);
        let mut stems = summary_stems(&finalized.join(folder)).await?;
        stems.sort();
        lines.extend(stems.into_iter().map(|stem| (stem, iso.clone())));
    }

    let mut out = String::new();
    let _ = writeln!(out, "# {} - Meeting Index\n", body.name);
    let _ = writeln!(out, "*{} meetings processed*\n", lines.len());
    for (stem, iso) in &lines {
        let _ = writeln!(out, "- [[{stem}|{iso}]]");
    }

    let path = layout.index_path();
    fs::write_with_op("writing index", &path, out.as_bytes()).await?;
    info!(body = %body.slug, meetings = lines.len(), path = %path.display(), "Index updated");
    Ok(lines.len())
}

async fn summary_stems(folder: &std::path::Path) -> Result<Vec<String>> {
    let mut dir = tokio::fs::read_dir(folder)
        .await
        .map_err(|e| Error::io_path("reading date folder", folder, e))?;
    let mut stems = Vec::new();
    while let Some(entry) = dir
        .next_entry()
        .await
        .map_err(|e| Error::io_path("reading date folder", folder, e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(stem) = name.strip_suffix(".md") {
            stems.push(stem.to_string());
        }
    }
    Ok(stems)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn body() -> Body {
        Body {
            slug: "hagerstown".to_string(),
            name: "Hagerstown City Council".to_string(),
            output_subdir: "Hagerstown".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_finalized_dir_is_noop() {
        let temp = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp.path(), &body());
        assert_eq!(update_index(&layout, &body()).await.unwrap(), 0);
        assert!(!layout.index_path().exists());
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let temp = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp.path(), &body());
        let finalized = layout.finalized_dir();
        for (folder, file) in [
            ("20250107", "C-2025-01-07.md"),
            ("20250204", "C-2025-02-04-2.md"),
            ("20250204", "C-2025-02-04-1.md"),
            ("20250204", "C-2025-02-04.srt"),
        ] {
            let dir = finalized.join(folder);
            tokio::fs::create_dir_all(&dir).await.unwrap();
            tokio::fs::write(dir.join(file), "x").await.unwrap();
        }
        tokio::fs::create_dir_all(finalized.join("notes")).await.unwrap();

        assert_eq!(update_index(&layout, &body()).await.unwrap(), 3);
        let index = tokio::fs::read_to_string(layout.index_path()).await.unwrap();
        assert_eq!(
            index,
            "# Hagerstown City Council - Meeting Index\n\n*3 meetings processed*\n\n- [[C-2025-02-04-1|2025-02-04]]\n- [[C-2025-02-04-2|2025-02-04]]\n- [[C-2025-01-07|2025-01-07]]\n"
        );
    }
}
