//! Line-based frontmatter parsing.
//!
//! Summaries only use flat `key: value` scalars and `- item` lists, so a full
//! YAML parser is not needed.

use std::collections::BTreeMap;

use thiserror::Error;

const DELIMITER: &str = "---";

/// Keys every summary must carry.
pub const REQUIRED_KEYS: &[&str] = &["date", "author", "tags", "source", "meeting_date"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontmatterError {
    #[error("unclosed frontmatter: no closing '---' found")]
    Unclosed,
    #[error("invalid frontmatter line {line}: {text}")]
    InvalidLine { line: usize, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontmatterValue {
    Scalar(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    pub values: BTreeMap<String, FrontmatterValue>,
}

impl Frontmatter {
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            FrontmatterValue::Scalar(s) => Some(s),
            FrontmatterValue::List(_) => None,
        }
    }

    /// List items for `key`; a scalar is returned as a one-item list.
    pub fn list(&self, key: &str) -> Vec<&str> {
        match self.values.get(key) {
            Some(FrontmatterValue::List(items)) => items.iter().map(String::as_str).collect(),
            Some(FrontmatterValue::Scalar(s)) if !s.is_empty() => vec![s.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|k| !self.contains_key(k))
            .collect()
    }
}

pub fn has_frontmatter(content: &str) -> bool {
    content.trim_start().starts_with(DELIMITER)
}

/// Split a document into frontmatter and body.
///
/// Returns `Ok(None)` when the document has no frontmatter.
pub fn parse_frontmatter(content: &str) -> Result<Option<(Frontmatter, &str)>, FrontmatterError> {
    let content = content.trim();
    let Some(rest) = content.strip_prefix(DELIMITER) else {
        return Ok(None);
    };

    let close = rest.find("\n---").ok_or(FrontmatterError::Unclosed)?;

    let raw = &rest[..close];
    let body = rest[close + "\n---".len()..].trim();
    Ok(Some((parse_block(raw)?, body)))
}

fn parse_block(raw: &str) -> Result<Frontmatter, FrontmatterError> {
    let mut fm = Frontmatter::default();
    let mut current_list: Option<String> = None;

    for (idx, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(item) = trimmed.strip_prefix("- ").or_else(|| (trimmed == "-").then_some("")) {
            let Some(key) = &current_list else {
                return Err(FrontmatterError::InvalidLine {
                    line: idx + 1,
                    text: trimmed.to_string(),
                });
            };
            if let Some(FrontmatterValue::List(items)) = fm.values.get_mut(key) {
                items.push(unquote(item));
            }
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            return Err(FrontmatterError::InvalidLine {
                line: idx + 1,
                text: trimmed.to_string(),
            });
        };
        let key = key.trim().to_string();
        let value = value.trim();

        if value.is_empty() {
            fm.values.insert(key.clone(), FrontmatterValue::List(Vec::new()));
            current_list = Some(key);
        } else if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
            let items = inner
                .split(',')
                .map(unquote)
                .filter(|s| !s.is_empty())
                .collect();
            fm.values.insert(key, FrontmatterValue::List(items));
            current_list = None;
        } else {
            fm.values.insert(key, FrontmatterValue::Scalar(unquote(value)));
            current_list = None;
        }
    }

    Ok(fm)
}

fn unquote(value: &str) -> String {
    value
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "---\ndate: 2025-02-05\nauthor: \"Citizen Observer\"\ntags:\n  - hagerstown\n  - Regular-Session\nsource: https://www.youtube.com/watch?v=abc\nmeeting_date: 2025-02-04\n---\n\n# Title\n\nBody text";

    #[test]
    fn parses_scalars_and_lists() {
        let (fm, body) = parse_frontmatter(DOC).unwrap().unwrap();
        assert_eq!(fm.scalar("author"), Some("Citizen Observer"));
        assert_eq!(fm.list("tags"), vec!["hagerstown", "Regular-Session"]);
        assert_eq!(
            fm.scalar("source"),
            Some("https://www.youtube.com/watch?v=abc")
        );
        assert!(fm.missing_required().is_empty());
        assert!(body.starts_with("# Title"));
    }

    #[test]
    fn inline_lists() {
        let (fm, _) = parse_frontmatter("---\ntags: [a, \"b c\"]\n---\nx")
            .unwrap()
            .unwrap();
        assert_eq!(fm.list("tags"), vec!["a", "b c"]);
    }

    #[test]
    fn no_frontmatter_is_none() {
        assert_eq!(parse_frontmatter("# Just a title"), Ok(None));
        assert!(!has_frontmatter("Here's the summary"));
    }

    #[test]
    fn unclosed_is_an_error() {
        assert_eq!(
            parse_frontmatter("---\ndate: 2025-01-01\n# Title"),
            Err(FrontmatterError::Unclosed)
        );
    }

    #[test]
    fn reports_missing_keys() {
        let (fm, _) = parse_frontmatter("---\ndate: x\n---\n").unwrap().unwrap();
        assert_eq!(
            fm.missing_required(),
            vec!["author", "tags", "source", "meeting_date"]
        );
    }
}
