use std::sync::LazyLock;

use regex::Regex;

static META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(based on the|i'll |i will |let me |here's |here is |below is |the following |this document |i've analyzed |i have analyzed |after reviewing )",
    )
    .expect("valid meta-commentary regex")
});

/// Drop any preamble before the frontmatter.
pub fn sanitize(content: &str) -> String {
    let content = content.trim();
    if content.starts_with("---") {
        return content.to_string();
    }
    match content.find("\n---") {
        Some(idx) => content[idx + 1..].trim().to_string(),
        None => content.to_string(),
    }
}

/// Whether any line reads like the model talking about the document.
pub fn has_meta_commentary(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .any(|l| META_RE.is_match(l))
}
