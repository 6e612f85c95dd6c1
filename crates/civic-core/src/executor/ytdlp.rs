use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use process_utils::CommandRunner;
use tracing::debug;

use super::args;
use crate::Result;
use crate::domain::VideoEntry;
use crate::pipeline::VideoSource;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const AUTO_CAPTIONS_MARKER: &str = "Available automatic captions";

/// [`VideoSource`] backed by `yt-dlp`.
pub struct YtDlp {
    runner: Arc<dyn CommandRunner>,
    binary: String,
}

impl YtDlp {
    pub fn new(runner: Arc<dyn CommandRunner>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    fn watch_url(video_id: &str) -> String {
        format!("{WATCH_URL}{video_id}")
    }
}

#[async_trait]
impl VideoSource for YtDlp {
    async fn list_recent(
        &self,
        source_url: &str,
        year_filter: Option<i32>,
    ) -> Result<Vec<VideoEntry>> {
        let mut cmd = args(["--flat-playlist", "--print", "%(id)s|%(title)s"]);
        if let Some(year) = year_filter {
            cmd.push("--match-filter".to_string());
            cmd.push(format!("title ~= '{year}'"));
        }
        cmd.push(source_url.to_string());

        let output = self.runner.run(&self.binary, &cmd, None).await?;
        Ok(parse_listing(&output.stdout))
    }

    async fn fetch_captions(&self, video_id: &str, dir: &Path) -> Result<Option<PathBuf>> {
        let url = Self::watch_url(video_id);
        let listing = self
            .runner
            .run(&self.binary, &args(["--list-subs", url.as_str()]), None)
            .await?;

        if !listing.stdout.contains(AUTO_CAPTIONS_MARKER)
            && !listing.stderr.contains(AUTO_CAPTIONS_MARKER)
        {
            debug!(video_id, "No automatic captions");
            return Ok(None);
        }

        let template = dir.join(video_id);
        let template = template.to_string_lossy();
        self.runner
            .run(
                &self.binary,
                &args([
                    "--write-auto-subs",
                    "--sub-lang",
                    "en",
                    "--sub-format",
                    "srt",
                    "--skip-download",
                    "--output",
                    &*template,
                    url.as_str(),
                ]),
                None,
            )
            .await?;

        Ok(Some(dir.join(format!("{video_id}.en.srt"))))
    }

    async fn fetch_audio(&self, video_id: &str, output: &Path) -> Result<()> {
        let url = Self::watch_url(video_id);
        let output = output.to_string_lossy();
        self.runner
            .run(
                &self.binary,
                &args([
                    "--extract-audio",
                    "--audio-format",
                    "mp3",
                    "--output",
                    &*output,
                    url.as_str(),
                ]),
                None,
            )
            .await?;
        Ok(())
    }
}

/// Parse `id|title` lines; blank and malformed lines are ignored.
pub fn parse_listing(stdout: &str) -> Vec<VideoEntry> {
    stdout
        .lines()
        .filter_map(|line| {
            let (id, title) = line.trim().split_once('|')?;
            let id = id.trim();
            (!id.is_empty()).then(|| VideoEntry {
                id: id.to_string(),
                title: title.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use process_utils::ScriptedRunner;

    use super::*;

    #[test]
    fn parses_listing_lines() {
        let out = "abc|February 4, 2025 Regular Session\n\nnot-a-line\n  def | Work Session | Part 2 \n";
        let entries = parse_listing(out);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "abc");
        assert_eq!(entries[1].title, "Work Session | Part 2");
    }

    #[tokio::test]
    async fn list_recent_passes_year_filter() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("yt-dlp", "abc|Meeting 2025\n");
        let ytdlp = YtDlp::new(runner.clone(), "yt-dlp");

        let entries = ytdlp
            .list_recent("https://www.youtube.com/playlist?list=PL1", Some(2025))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            runner.calls(),
            vec![
                "yt-dlp --flat-playlist --print %(id)s|%(title)s --match-filter title ~= '2025' https://www.youtube.com/playlist?list=PL1"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn captions_absent_is_none() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on(
            "yt-dlp --list-subs https://www.youtube.com/watch?v=abc",
            "abc has no subtitles",
        );
        let ytdlp = YtDlp::new(runner.clone(), "yt-dlp");

        let path = ytdlp
            .fetch_captions("abc", Path::new("/tmp/out"))
            .await
            .unwrap();
        assert!(path.is_none());
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn captions_present_are_downloaded() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on(
            "yt-dlp --list-subs https://www.youtube.com/watch?v=abc",
            "[info] Available automatic captions for abc:\nen vtt, srt",
        );
        let ytdlp = YtDlp::new(runner.clone(), "yt-dlp");

        let path = ytdlp
            .fetch_captions("abc", Path::new("/tmp/out"))
            .await
            .unwrap();
        assert_eq!(path, Some(PathBuf::from("/tmp/out/abc.en.srt")));
        assert!(runner.calls()[1].starts_with("yt-dlp --write-auto-subs"));
    }

    #[tokio::test]
    async fn listing_failure_propagates() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.fail("yt-dlp", 1, "ERROR: playlist does not exist");
        let ytdlp = YtDlp::new(runner, "yt-dlp");

        let err = ytdlp.list_recent("url", None).await.unwrap_err();
        assert!(err.to_string().contains("playlist does not exist"));
    }
}
