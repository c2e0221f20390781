//! End-to-end creation of a PR branch from the current working tree.
//!
//! Analyze → classify → pick action → execute → `checkout -b` at the branch
//! point → commit → restore stash → push. There is no loop-back and no
//! rollback: once the executor starts mutating the index, a failure leaves
//! the repository in whatever state the last successful git command produced.

use std::path::Path;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::analyze::analyze_git_state;
use crate::core::branch_name;
use crate::core::branch_point::get_branch_point;
use crate::core::catalog;
use crate::core::classifier::{self, ScenarioReport};
use crate::core::types::{
    ActionKind, ActionResult, CommitRelationship, GitStateSnapshot, StateAction,
};
use crate::error::EngineResult;
use crate::execute::execute;
use crate::io::git::GitOps;

pub const DEFAULT_REMOTE: &str = "origin";

/// Inputs for [`create_pr_branch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    /// Used as the commit message and to derive the branch name.
    pub description: String,
    /// Explicit branch name; derived from the description when `None`.
    pub branch_name: Option<String>,
    /// Catalog key; the scenario's recommended action when `None`.
    pub action_key: Option<String>,
    pub base_branch: String,
    pub branch_prefix: String,
    pub restore_stash: bool,
    pub push: bool,
    pub dry_run: bool,
}

impl CreateRequest {
    pub fn new(description: impl Into<String>, base_branch: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            branch_name: None,
            action_key: None,
            base_branch: base_branch.into(),
            branch_prefix: String::new(),
            restore_stash: true,
            push: false,
            dry_run: false,
        }
    }
}

/// Everything decided before the repository is touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub snapshot: GitStateSnapshot,
    pub report: ScenarioReport,
    pub action_key: String,
    pub action: StateAction,
    pub branch_name: String,
    pub branch_point: String,
    pub warnings: Vec<String>,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedBranch {
    pub plan: Plan,
    pub result: ActionResult,
    /// False when local commits were carried over and nothing else was staged.
    pub committed: bool,
    /// `Some(false)` when the stashed unstaged changes could not be restored and the stash was kept.
    pub stash_restored: Option<bool>,
    pub pushed: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WorkflowOutcome {
    /// Dry run: nothing was mutated.
    Planned(Plan),
    /// `cancel` was chosen: nothing was mutated.
    Cancelled(Plan),
    /// The executor reported a benign failure before any checkout.
    Failed { plan: Plan, result: ActionResult },
    Created(CreatedBranch),
}

/// Decide scenario, action, branch name and branch point without mutating anything.
pub fn plan<G: GitOps>(git: &G, cwd: &Path, request: &CreateRequest) -> EngineResult<Plan> {
    let snapshot = analyze_git_state(git, &request.base_branch, cwd)?;
    let report = classifier::report(&snapshot);
    let action_key = request
        .action_key
        .clone()
        .unwrap_or_else(|| report.recommended.to_string());
    let action = catalog::resolve(report.scenario, &action_key)?;

    let branch_name = match &request.branch_name {
        Some(name) => name.clone(),
        None => branch_name::derive(&request.branch_prefix, &request.description),
    };
    branch_name::validate(&branch_name)?;
    let branch_point = get_branch_point(&action, &request.base_branch);

    let mut warnings = Vec::new();
    if report.scenario.branch_in_use() {
        warnings.push(format!(
            "scenario {}: the current branch is already checked out here, so it cannot get a second worktree",
            report.scenario
        ));
    }
    if snapshot.commit_relationship == CommitRelationship::Divergent
        && snapshot.is_on_base_branch()
        && snapshot.local_commits_ahead_count == 0
    {
        warnings.push(format!(
            "origin/{} could not be compared with HEAD; fetch and retry if this looks wrong",
            request.base_branch
        ));
    }

    Ok(Plan {
        snapshot,
        report,
        action_key,
        action,
        branch_name,
        branch_point,
        warnings,
    })
}

/// Run the whole create flow in the current checkout.
#[instrument(skip_all, fields(base_branch = %request.base_branch, dry_run = request.dry_run))]
pub fn create_pr_branch<G: GitOps>(
    git: &G,
    cwd: &Path,
    request: &CreateRequest,
) -> EngineResult<WorkflowOutcome> {
    let plan = plan(git, cwd, request)?;
    info!(
        scenario = %plan.report.scenario,
        action = %plan.action_key,
        branch = %plan.branch_name,
        branch_point = %plan.branch_point,
        "plan ready"
    );
    for warning in &plan.warnings {
        warn!("{warning}");
    }
    if request.dry_run {
        return Ok(WorkflowOutcome::Planned(plan));
    }
    if plan.action.is_cancel() {
        info!("cancelled before any mutation");
        return Ok(WorkflowOutcome::Cancelled(plan));
    }

    let execution = execute(git, &plan.action, &request.description, &plan.branch_name)?;
    if !execution.result.success {
        return Ok(WorkflowOutcome::Failed {
            plan,
            result: execution.result,
        });
    }

    git.checkout_new_branch(&plan.branch_name, &plan.branch_point)?;
    let committed = commit_on_new_branch(git, &plan.action, &request.description)?;

    let mut warnings = plan.warnings.clone();
    let stash_restored = match &execution.stash {
        Some(stash) if plan.action.stash_unstaged && request.restore_stash => {
            match git.restore_unstaged(stash) {
                Ok(()) => Some(true),
                Err(err) => {
                    warn!(stash = %stash, error = %err, "restoring unstaged changes failed; stash kept");
                    warnings.push(format!(
                        "unstaged changes are still stashed ({stash}) and the working tree was left as committed; inspect them with `git diff {stash}^2 {stash}`"
                    ));
                    Some(false)
                }
            }
        }
        _ => None,
    };

    let pushed = if request.push {
        git.push(DEFAULT_REMOTE, &plan.branch_name)?;
        true
    } else {
        false
    };

    info!(branch = %plan.branch_name, committed, pushed, "PR branch created");
    Ok(WorkflowOutcome::Created(CreatedBranch {
        result: execution.result,
        plan,
        committed,
        stash_restored,
        pushed,
        warnings,
    }))
}

// Empty commits for actions that stage nothing; carried commits need no new
// commit when nothing else was staged.
fn commit_on_new_branch<G: GitOps>(
    git: &G,
    action: &StateAction,
    message: &str,
) -> EngineResult<bool> {
    let staged = git.staged_files()?;
    let allow_empty = match action.action {
        ActionKind::LeaveAndEmptyCommit | ActionKind::StashAll => true,
        ActionKind::CommitStaged => staged.is_empty(),
        ActionKind::UseCommitsAndCommitAll if staged.is_empty() => return Ok(false),
        ActionKind::UseCommitsAndCommitAll | ActionKind::CommitAll | ActionKind::Cancel => false,
    };
    git.commit(message, allow_empty)?;
    Ok(true)
}
