//! Application configuration.
//!
//! Configuration is a TOML file with one `[bodies.<slug>]` table per
//! government body. Lookup order when no explicit path is given:
//!
//! 1. `$CIVIC_SUMMARY_CONFIG`
//! 2. `~/.civic-summary/config.toml`
//! 3. `./config.toml`
//!
//! `CIVIC_SUMMARY_*` environment variables override file values.

mod layout;

pub use layout::OutputLayout;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Body;
use crate::retry::RetryPolicy;
use crate::{Error, Result};

pub const CONFIG_ENV: &str = "CIVIC_SUMMARY_CONFIG";
const CONFIG_DIR_NAME: &str = ".civic-summary";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root of the vault all body folders live under.
    #[serde(default)]
    pub output_dir: PathBuf,

    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u32,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff schedule in seconds.
    #[serde(default = "default_backoff_delays")]
    pub backoff_delays: Vec<u64>,

    #[serde(default)]
    pub template_dir: Option<PathBuf>,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub bodies: BTreeMap<String, Body>,
}

/// External tool locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_ytdlp")]
    pub ytdlp: String,
    #[serde(default)]
    pub whisper: Option<String>,
    #[serde(default)]
    pub whisper_model: Option<String>,
    #[serde(default = "default_claude")]
    pub claude: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp: default_ytdlp(),
            whisper: None,
            whisper_model: None,
            claude: default_claude(),
        }
    }
}

fn default_log_retention_days() -> u32 {
    90
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_delays() -> Vec<u64> {
    vec![5, 20, 60]
}

fn default_ytdlp() -> String {
    "yt-dlp".to_string()
}

fn default_claude() -> String {
    "claude".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::new(),
            log_retention_days: default_log_retention_days(),
            max_retries: default_max_retries(),
            backoff_delays: default_backoff_delays(),
            template_dir: None,
            tools: ToolsConfig::default(),
            bodies: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Parse configuration from TOML text. Slugs are injected from table keys.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(content)
            .map_err(|e| Error::config(format!("invalid configuration: {e}")))?;
        for (slug, body) in config.bodies.iter_mut() {
            body.slug = slug.clone();
        }
        config.output_dir = expand_home(&config.output_dir);
        config.template_dir = config.template_dir.as_deref().map(expand_home);
        Ok(config)
    }

    /// Load, apply environment overrides and validate.
    ///
    /// An explicit `path` must exist. Without one, the first file found in the
    /// lookup order is used, and defaults apply when none exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let source = match path {
            Some(p) => Some(p.to_path_buf()),
            None => config_search_paths().into_iter().find(|p| p.is_file()),
        };

        let mut config = match &source {
            Some(p) => {
                debug!(path = %p.display(), "Loading configuration");
                let content =
                    std::fs::read_to_string(p).map_err(|e| Error::io_path("reading config", p, e))?;
                Self::from_toml_str(&content)?
            }
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `CIVIC_SUMMARY_*` overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty("CIVIC_SUMMARY_OUTPUT_DIR") {
            self.output_dir = expand_home(Path::new(&dir));
        }
        if let Some(days) = non_empty("CIVIC_SUMMARY_LOG_RETENTION_DAYS")
            && let Ok(parsed) = days.trim().parse::<u32>()
        {
            self.log_retention_days = parsed;
        }
        if let Some(retries) = non_empty("CIVIC_SUMMARY_MAX_RETRIES")
            && let Ok(parsed) = retries.trim().parse::<u32>()
        {
            self.max_retries = parsed;
        }
        if let Some(ytdlp) = non_empty("CIVIC_SUMMARY_YTDLP") {
            self.tools.ytdlp = ytdlp;
        }
        if let Some(whisper) = non_empty("CIVIC_SUMMARY_WHISPER") {
            self.tools.whisper = Some(whisper);
        }
        if let Some(model) = non_empty("CIVIC_SUMMARY_WHISPER_MODEL") {
            self.tools.whisper_model = Some(model);
        }
        if let Some(claude) = non_empty("CIVIC_SUMMARY_CLAUDE") {
            self.tools.claude = claude;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::config("output_dir is required"));
        }
        if self.bodies.is_empty() {
            return Err(Error::config("at least one body must be configured"));
        }

        for (slug, body) in &self.bodies {
            let missing = |field: &str| Error::config(format!("body {slug}: {field} is required"));

            if body.playlist_id.is_empty() && body.video_source_url.is_empty() {
                return Err(Error::config(format!(
                    "body {slug}: playlist_id or video_source_url is required"
                )));
            }
            if body.output_subdir.is_empty() {
                return Err(missing("output_subdir"));
            }
            if body.filename_pattern.is_empty() {
                return Err(missing("filename_pattern"));
            }
            if body.title_date_regex.is_empty() {
                return Err(missing("title_date_regex"));
            }
            if body.prompt_template.is_empty() {
                return Err(missing("prompt_template"));
            }
            if body.tags.is_empty() {
                return Err(Error::config(format!(
                    "body {slug}: at least one tag is required"
                )));
            }
        }

        Ok(())
    }

    pub fn get_body(&self, slug: &str) -> Result<&Body> {
        self.bodies
            .get(slug)
            .ok_or_else(|| Error::not_found("body", slug))
    }

    /// Bodies sorted by slug.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delays: self
                .backoff_delays
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
        }
    }

    /// Directory holding prompt templates.
    pub fn template_dir(&self) -> PathBuf {
        if let Some(dir) = &self.template_dir {
            return dir.clone();
        }
        if let Some(home) = dirs::home_dir() {
            let dir = home.join(CONFIG_DIR_NAME).join("templates");
            if dir.is_dir() {
                return dir;
            }
        }
        PathBuf::from("templates")
    }

    pub fn layout(&self, body: &Body) -> OutputLayout {
        OutputLayout::new(&self.output_dir, body)
    }

    /// Global log directory (`<output_dir>/Automation/logs`).
    pub fn log_dir(&self) -> PathBuf {
        self.output_dir.join("Automation").join("logs")
    }
}

/// Candidate configuration files, in lookup order.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(p) = std::env::var(CONFIG_ENV)
        && !p.trim().is_empty()
    {
        paths.push(expand_home(Path::new(&p)));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from(CONFIG_FILE_NAME));
    paths
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
