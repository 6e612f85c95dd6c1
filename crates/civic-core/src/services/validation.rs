use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{Body, ValidationResult, word_count};
use crate::markdown::{has_frontmatter, has_meta_commentary, parse_frontmatter};
use crate::pipeline::Validator;

const MIN_SUMMARY_WORDS: usize = 500;
const RECOMMENDED_SUMMARY_WORDS: usize = 1000;
const REQUIRED_SECTIONS: &[&str] = &["## 1.", "## 2.", "## 3.", "## 4.", "## 5."];
const DEFAULT_FOOTER: &str = "citizen summary was created";
const BODY_META_PREFIXES: &[&str] = &["Based on", "I'll ", "I will ", "Let me ", "Here's ", "Here is "];

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\d{1,2}:\d{2}:\d{2}").expect("valid timestamp regex")
});

/// Structural and content checks on a generated summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryValidator;

impl SummaryValidator {
    pub fn new() -> Self {
        Self
    }

    fn check_frontmatter(content: &str, result: &mut ValidationResult) {
        if !has_frontmatter(content) {
            result.error("missing frontmatter: document must start with '---'");
            return;
        }

        let fm = match parse_frontmatter(content) {
            Ok(Some((fm, _))) => fm,
            Ok(None) => return,
            Err(e) => {
                result.error(format!("invalid frontmatter: {e}"));
                return;
            }
        };

        for key in fm.missing_required() {
            result.error(format!("missing required frontmatter key: {key}"));
        }
        for tag in fm.list("tags") {
            if tag.contains(' ') {
                result.error(format!("tag contains spaces (use hyphens): {tag:?}"));
            }
        }
    }

    fn check_structure(content: &str, body: &Body, result: &mut ValidationResult) {
        for section in REQUIRED_SECTIONS {
            if !content.contains(section) {
                result.error(format!("missing required section: {section}"));
            }
        }

        if !content.lines().any(|l| l.trim_start().starts_with("# ")) {
            result.error("missing main title (# heading)");
        }

        if !content.contains("## Conclusion") {
            result.warning("missing Conclusion section");
        }

        let footer = if body.footer_text.is_empty() {
            DEFAULT_FOOTER
        } else {
            body.footer_text.as_str()
        };
        if !content.to_lowercase().contains(&footer.to_lowercase()) {
            result.warning("missing attribution footer text");
        }
    }

    fn check_content(content: &str, result: &mut ValidationResult) {
        let words = word_count(content);
        if words < MIN_SUMMARY_WORDS {
            result.error(format!(
                "summary too short ({words} words, minimum {MIN_SUMMARY_WORDS})"
            ));
        } else if words < RECOMMENDED_SUMMARY_WORDS {
            result.warning(format!(
                "summary is short ({words} words, recommend {RECOMMENDED_SUMMARY_WORDS}+)"
            ));
        }

        if !TIMESTAMP_RE.is_match(content) {
            result.warning("no timestamps found (expected [HH:MM:SS] format)");
        }
    }

    fn check_meta_commentary(content: &str, result: &mut ValidationResult) {
        if !has_frontmatter(content) && has_meta_commentary(content) {
            result.error("contains meta-commentary (output must start with frontmatter)");
        }

        if let Ok(Some((_, body))) = parse_frontmatter(content) {
            let first = body.lines().next().unwrap_or_default().trim();
            if BODY_META_PREFIXES.iter().any(|p| first.starts_with(p)) {
                let preview: String = first.chars().take(50).collect();
                result.error(format!("body starts with meta-commentary: \"{preview}...\""));
            }
        }
    }
}

impl Validator for SummaryValidator {
    fn validate(&self, content: &str, body: &Body) -> ValidationResult {
        let mut result = ValidationResult::default();
        Self::check_frontmatter(content, &mut result);
        Self::check_structure(content, body, &mut result);
        Self::check_content(content, &mut result);
        Self::check_meta_commentary(content, &mut result);
        result
    }
}
