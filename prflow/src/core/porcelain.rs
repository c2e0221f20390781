//! Parsing of `git status --porcelain=v1 -z` output.
//!
//! Each record carries a two-column `XY` prefix: `X` is the index column and
//! `Y` the worktree column. Untracked files are reported as `??`.

use crate::core::types::WorkingTreeStatus;

/// Parsed porcelain entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub index: char,
    pub worktree: char,
    /// Path for the changed file (the new path for renames).
    pub path: String,
}

impl StatusEntry {
    pub fn is_untracked(&self) -> bool {
        self.index == '?'
    }

    /// Anything other than space or `?` in the index column.
    pub fn is_staged(&self) -> bool {
        !matches!(self.index, ' ' | '?' | '!')
    }

    /// Any worktree-column change, or an untracked file.
    pub fn is_unstaged(&self) -> bool {
        self.is_untracked() || !matches!(self.worktree, ' ' | '!')
    }
}

/// Staged/unstaged split of a porcelain listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PorcelainSummary {
    pub staged: Vec<String>,
    /// Modified and untracked paths, first-seen order, no duplicates.
    pub unstaged: Vec<String>,
}

impl PorcelainSummary {
    pub fn working_tree_status(&self) -> WorkingTreeStatus {
        WorkingTreeStatus::from_flags(!self.staged.is_empty(), !self.unstaged.is_empty())
    }
}

/// Parse one NUL-terminated record (`XY <path>`). Returns `None` for blank
/// or malformed records.
pub fn parse_record(record: &str) -> Option<StatusEntry> {
    let mut chars = record.chars();
    let index = chars.next()?;
    let worktree = chars.next()?;
    let path = chars.as_str().strip_prefix(' ')?;
    if path.is_empty() {
        return None;
    }
    Some(StatusEntry {
        index,
        worktree,
        path: path.to_string(),
    })
}

/// Parse `git status --porcelain=v1 -z` output.
///
/// Paths are verbatim (no quoting). A rename or copy record is followed by
/// a separate record holding its source path, which is skipped.
pub fn parse(output: &str) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    let mut records = output.split('\0');
    while let Some(record) = records.next() {
        let Some(entry) = parse_record(record) else {
            continue;
        };
        if matches!(entry.index, 'R' | 'C') || matches!(entry.worktree, 'R' | 'C') {
            records.next();
        }
        entries.push(entry);
    }
    entries
}

/// Split entries into staged and unstaged path lists.
pub fn summarize(entries: &[StatusEntry]) -> PorcelainSummary {
    let mut summary = PorcelainSummary::default();
    for entry in entries {
        if entry.is_staged() {
            summary.staged.push(entry.path.clone());
        }
        if entry.is_unstaged() && !summary.unstaged.contains(&entry.path) {
            summary.unstaged.push(entry.path.clone());
        }
    }
    summary
}
