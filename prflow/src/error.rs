//! Engine error type.
//!
//! A closed set of failure kinds so callers can match exhaustively. Benign
//! conditions (nothing to stash, nothing staged) are not errors; they come
//! back as [`ActionResult`](crate::core::types::ActionResult) values.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::ScenarioId;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The working directory is not inside a git working tree.
    #[error("not a git repository: {}", path.display())]
    NotAGitRepository { path: PathBuf },

    /// A ref did not resolve to a commit.
    #[error("ref not found: {reference}")]
    RefUnresolvable { reference: String },

    /// Git exited non-zero.
    #[error("git command failed: {command}\nstderr: {stderr}")]
    GitCommandFailure { command: String, stderr: String },

    /// Git did not finish within the configured timeout and was killed.
    #[error("git command timed out after {timeout_secs}s: {command}")]
    GitTimeout { command: String, timeout_secs: u64 },

    /// The git binary could not be started.
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The requested action key is not offered for the scenario.
    #[error("action '{key}' is not available for scenario {scenario}")]
    UnknownAction { key: String, scenario: ScenarioId },

    #[error("invalid branch name '{name}': {reason}")]
    InvalidBranchName { name: String, reason: String },
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn git_failure(args: &[&str], stderr: impl AsRef<str>) -> Self {
        EngineError::GitCommandFailure {
            command: format!("git {}", args.join(" ")),
            stderr: stderr.as_ref().trim().to_string(),
        }
    }
}
