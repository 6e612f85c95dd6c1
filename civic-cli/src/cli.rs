//! Command-line interface definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Process government meeting videos into citizen-friendly summaries.
///
/// Recordings are discovered from each body's playlist, transcribed,
/// summarized, cross-referenced against earlier summaries and validated
/// before being written into the vault.
#[derive(Parser, Debug)]
#[command(name = "civic-summary")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.civic-summary/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List playlist videos that have no finalized summary yet
    Discover {
        /// Body slug
        #[arg(long)]
        body: String,
    },

    /// Fetch captions or run whisper to produce a transcript
    Transcribe {
        video_id: String,

        #[arg(long)]
        body: String,

        /// Meeting date (YYYY-MM-DD); selects the date folder
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Output directory (default: the body's finalized folder)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Generate a summary from an existing transcript
    Analyze {
        video_id: String,

        #[arg(long)]
        body: String,

        /// Meeting date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Transcript file (default: <finalized>/<YYYYMMDD>/<video-id>.srt)
        #[arg(long, value_name = "PATH")]
        transcript: Option<PathBuf>,

        /// Write the summary here instead of stdout
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Add wikilinks to earlier summaries mentioned in a file
    Crossref {
        file: PathBuf,

        #[arg(long)]
        body: String,

        /// Meeting date of the document (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Modify the file in place
        #[arg(short, long)]
        in_place: bool,
    },

    /// Check summary files against the quality rules
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long)]
        body: String,
    },

    /// Run the full pipeline for one or all bodies
    Process {
        /// Body slug to process
        #[arg(long, conflicts_with = "all")]
        body: Option<String>,

        /// Process every configured body
        #[arg(long)]
        all: bool,

        /// Show what would be processed without doing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage meetings that failed processing
    Quarantine {
        #[command(subcommand)]
        action: QuarantineAction,
    },

    /// Show finalized and quarantined counts
    Status {
        /// Body slug (default: all)
        #[arg(long)]
        body: Option<String>,
    },

    /// View configured government bodies
    Bodies {
        #[command(subcommand)]
        action: BodiesAction,
    },

    /// Print version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum QuarantineAction {
    /// List quarantined meetings
    List {
        #[arg(long)]
        body: String,
    },

    /// Retry every quarantined meeting, or one by video id
    Retry {
        video_id: Option<String>,

        #[arg(long)]
        body: String,
    },

    /// Drop a meeting from quarantine
    Remove {
        video_id: String,

        #[arg(long)]
        body: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum BodiesAction {
    /// List all configured bodies
    List,

    /// Show the configuration of one body
    Show { slug: String },
}

impl Command {
    /// Whether the command runs without a configuration file.
    pub fn needs_config(&self) -> bool {
        !matches!(self, Command::Version)
    }
}
