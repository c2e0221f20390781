//! Branch names derived from a PR description.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{EngineError, EngineResult};

const MAX_SLUG_LEN: usize = 50;
const FALLBACK_SLUG: &str = "pr";

static NON_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Slugify `description` and prepend `prefix`.
///
/// Lowercases, collapses runs of other characters into `-`, trims dashes and
/// caps the slug at 50 characters. Never returns an empty slug.
pub fn derive(prefix: &str, description: &str) -> String {
    let lowered = description.to_lowercase();
    let dashed = NON_SLUG_RE.replace_all(&lowered, "-");
    let mut slug: String = dashed.trim_matches('-').chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str(FALLBACK_SLUG);
    }
    format!("{prefix}{slug}")
}

/// Reject names `git check-ref-format --branch` would refuse.
pub fn validate(name: &str) -> EngineResult<()> {
    let reject = |reason: &str| {
        Err(EngineError::InvalidBranchName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };
    if name.is_empty() {
        return reject("must not be empty");
    }
    if name.starts_with('-') {
        return reject("must not start with '-'");
    }
    if name == "@" || name.contains("@{") {
        return reject("must not contain '@{'");
    }
    if name.contains("..") || name.contains("//") {
        return reject("must not contain '..' or '//'");
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c))
    {
        return reject("contains a character git does not allow in ref names");
    }
    if name.ends_with('/') || name.ends_with('.') || name.ends_with(".lock") {
        return reject("must not end with '/', '.' or '.lock'");
    }
    if name.starts_with('/') || name.split('/').any(|part| part.starts_with('.')) {
        return reject("path components must not start with '.'");
    }
    Ok(())
}
