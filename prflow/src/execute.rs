//! Execution of a chosen [`StateAction`] against the git index.
//!
//! The executor never switches branches itself. It leaves the index in the
//! state the following `git checkout -b <branch> <branch point>` needs:
//! staging happens here, on the current index, before any checkout.
//!
//! Genuine git failures propagate as [`EngineError`]; expected benign
//! conditions come back as an [`ActionResult`] with a message.

use tracing::{debug, info, instrument};

use crate::core::types::{ActionKind, ActionResult, BranchFrom, StateAction};
use crate::error::EngineResult;
use crate::io::git::{GitOps, StashOptions, StashOutcome};

pub use crate::core::branch_point::get_branch_point;

/// What an execution did, including any stash the caller may restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub result: ActionResult,
    /// Stash commit created by the action, if any.
    pub stash: Option<String>,
}

impl Execution {
    fn done(result: ActionResult) -> Self {
        Self {
            result,
            stash: None,
        }
    }
}

/// Execute `action` and report only the [`ActionResult`].
pub fn execute_state_action<G: GitOps>(
    git: &G,
    action: &StateAction,
    description: &str,
    branch_name: &str,
) -> EngineResult<ActionResult> {
    execute(git, action, description, branch_name).map(|e| e.result)
}

/// Execute `action`, returning the result and any stash created.
#[instrument(skip_all, fields(action = ?action.action, branch_from = ?action.branch_from, branch_name = %branch_name))]
pub fn execute<G: GitOps>(
    git: &G,
    action: &StateAction,
    description: &str,
    branch_name: &str,
) -> EngineResult<Execution> {
    let execution = match action.action {
        ActionKind::Cancel => {
            Execution::done(ActionResult::ok("Cancelled; repository left untouched"))
        }
        ActionKind::CommitStaged => commit_staged(git, action, description, branch_name)?,
        ActionKind::CommitAll => commit_all(git)?,
        ActionKind::UseCommitsAndCommitAll => use_commits(git, action)?,
        ActionKind::StashAll => stash_all(git, description, branch_name)?,
        ActionKind::LeaveAndEmptyCommit => leave_for_empty_commit(git)?,
    };
    info!(
        success = execution.result.success,
        stashed = execution.stash.is_some(),
        message = %execution.result.message,
        "action executed"
    );
    Ok(execution)
}

// Staged content is already where it needs to be; optionally move the
// unstaged remainder aside with a keep-index stash.
fn commit_staged<G: GitOps>(
    git: &G,
    action: &StateAction,
    description: &str,
    branch_name: &str,
) -> EngineResult<Execution> {
    let staged = git.staged_files()?;
    let summary = format!("Committing {} staged file(s)", staged.len());
    if !action.stash_unstaged {
        return Ok(Execution::done(ActionResult::ok(summary)));
    }

    let options = StashOptions {
        keep_index: true,
        include_untracked: true,
        message: stash_message("unstaged changes", description, branch_name),
    };
    match git.stash(&options)? {
        StashOutcome::Saved { commit } => {
            debug!(commit = %commit, "unstaged changes stashed");
            Ok(Execution {
                result: ActionResult::ok(format!(
                    "{summary}; unstaged changes stashed ({commit})"
                )),
                stash: Some(commit),
            })
        }
        StashOutcome::NothingToStash => Ok(Execution::done(ActionResult::ok(format!(
            "{summary}; no unstaged changes to stash"
        )))),
    }
}

// `add .` must run before any branch switch: it operates on the current index.
fn commit_all<G: GitOps>(git: &G) -> EngineResult<Execution> {
    git.add(&["."])?;
    let staged = git.staged_files()?;
    if staged.is_empty() {
        return Ok(Execution::done(ActionResult::failed(
            "No changes to commit",
        )));
    }
    Ok(Execution::done(ActionResult::ok(format!(
        "Staged {} file(s) for the PR branch",
        staged.len()
    ))))
}

fn use_commits<G: GitOps>(git: &G, action: &StateAction) -> EngineResult<Execution> {
    if action.branch_from != BranchFrom::Head {
        return Ok(Execution::done(ActionResult::failed(
            "Carrying local commits requires branching from HEAD",
        )));
    }
    git.add(&["."])?;
    let staged = git.staged_files()?;
    let message = if staged.is_empty() {
        "Carrying local commits; no further changes to commit".to_string()
    } else {
        format!(
            "Carrying local commits; {} file(s) staged on top",
            staged.len()
        )
    };
    Ok(Execution::done(ActionResult::ok(message)))
}

fn stash_all<G: GitOps>(git: &G, description: &str, branch_name: &str) -> EngineResult<Execution> {
    let options = StashOptions {
        keep_index: false,
        include_untracked: true,
        message: stash_message("all changes", description, branch_name),
    };
    match git.stash(&options)? {
        StashOutcome::Saved { commit } => Ok(Execution {
            result: ActionResult::ok(format!("Stashed all changes ({commit})")),
            stash: Some(commit),
        }),
        StashOutcome::NothingToStash => Ok(Execution::done(ActionResult::ok(
            "Nothing to stash; working tree already clean",
        ))),
    }
}

// An empty commit must not sweep up staged content.
fn leave_for_empty_commit<G: GitOps>(git: &G) -> EngineResult<Execution> {
    let staged = git.staged_files()?;
    if !staged.is_empty() {
        return Ok(Execution::done(ActionResult::failed(format!(
            "{} staged file(s) would end up in the empty commit; commit or unstage them first",
            staged.len()
        ))));
    }
    Ok(Execution::done(ActionResult::ok(
        "Working tree left as is; the PR starts with an empty commit",
    )))
}

fn stash_message(what: &str, description: &str, branch_name: &str) -> String {
    format!("prflow: {what} for {branch_name}: {description}")
}
