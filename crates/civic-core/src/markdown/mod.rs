//! Markdown helpers for summaries: frontmatter, output cleanup and wikilinks.

mod frontmatter;
mod sanitize;
mod wikilinks;

pub use frontmatter::{
    Frontmatter, FrontmatterError, FrontmatterValue, REQUIRED_KEYS, has_frontmatter,
    parse_frontmatter,
};
pub use sanitize::{has_meta_commentary, sanitize};
pub use wikilinks::{add_wikilinks, referenced_dates};
