//! Extraction of custom-field tags and hyperlinks from campaign HTML.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Field placeholder, e.g. `[[[FIRST_NAME]]]`.
static FIELD_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[\[\s*([A-Za-z0-9_\-\.]+)\s*\]\]\]").unwrap());

/// `href` attribute value in single or double quotes.
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

/// Field names referenced by placeholders, in document order, duplicates included.
pub fn extract_field_names(html: &str) -> Vec<String> {
    FIELD_TAG_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Distinct absolute http(s) links found in `href` attributes.
pub fn extract_hyperlinks(html: &str) -> BTreeSet<String> {
    HREF_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim())
        .filter(|href| is_tracked_link(href))
        .map(str::to_string)
        .collect()
}

fn is_tracked_link(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    let host_and_path = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"));
    matches!(host_and_path, Some(rest) if !rest.is_empty())
}
