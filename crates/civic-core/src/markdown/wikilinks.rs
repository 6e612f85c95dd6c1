use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};

use crate::discovery::parse_flexible_date;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z][a-z]+ \d{1,2}(?:st|nd|rd|th)?,? \d{4})")
        .expect("valid date reference regex")
});

/// Distinct dates mentioned in `content`, excluding `self_date`.
pub fn referenced_dates(content: &str, self_date: NaiveDate) -> BTreeSet<NaiveDate> {
    DATE_RE
        .find_iter(content)
        .filter_map(|m| parse_flexible_date(m.as_str()))
        .filter(|d| *d != self_date)
        .collect()
}

/// Replace date mentions with `[[target|original]]` where `resolve` finds a target.
pub fn add_wikilinks<F>(content: &str, self_date: NaiveDate, resolve: F) -> String
where
    F: Fn(NaiveDate) -> Option<String>,
{
    DATE_RE
        .replace_all(content, |caps: &Captures<'_>| {
            let text = &caps[0];
            parse_flexible_date(text)
                .filter(|d| *d != self_date)
                .and_then(&resolve)
                .map(|target| format!("[[{target}|{text}]]"))
                .unwrap_or_else(|| text.to_string())
        })
        .into_owned()
}
