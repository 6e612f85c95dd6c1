//! Date parsing for video titles.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static ORDINAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})(?:st|nd|rd|th)\b").expect("valid ordinal regex")
});

const FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%B %d %Y"];

/// Parse the date text captured from a title.
///
/// Accepts `2025-02-04`, `February 4, 2025`, `February 04 2025` and
/// ordinal forms such as `February 4th, 2025`.
pub fn parse_flexible_date(text: &str) -> Option<NaiveDate> {
    let cleaned = ORDINAL_RE.replace_all(text.trim(), "$1");
    let cleaned = cleaned.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
}
