use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static SPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());
static BLANK_LINES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n+").unwrap());

/// Collapse runs of spaces and blank lines, keeping paragraph breaks.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.trim();
    let spaced = SPACE_REGEX.replace_all(text, " ");
    BLANK_LINES_REGEX.replace_all(&spaced, "\n\n").to_string()
}

/// Resolve an attribute value against the page url, dropping non-http results.
pub fn resolve_link(base_url: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") || raw.starts_with("javascript:") {
        return None;
    }
    let resolved = base_url.join(raw).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// `scheme://host[:port]` of the page.
pub fn site_root(url: &Url) -> String {
    url.origin().ascii_serialization()
}
