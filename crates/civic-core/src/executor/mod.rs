//! Adapters over the external command-line tools.

mod claude;
mod whisper;
mod ytdlp;

pub use claude::Claude;
pub use whisper::Whisper;
pub use ytdlp::{YtDlp, parse_listing};

/// Build an owned argument list.
fn args<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
