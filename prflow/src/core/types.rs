//! Shared deterministic types for the working-tree state engine.
//!
//! These types define stable contracts between the analyzer, classifier,
//! catalog and executor. They never depend on external state or I/O; a
//! snapshot is produced once per invocation and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Relationship of `HEAD` to `origin/<base>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitRelationship {
    Same,
    Ahead,
    Behind,
    Divergent,
    /// HEAD is fully contained in origin's history (locally behind, no unique commits).
    Ancestor,
}

/// Summary of `git status --porcelain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkingTreeStatus {
    Clean,
    StagedOnly,
    UnstagedOnly,
    Both,
}

impl WorkingTreeStatus {
    pub fn from_flags(has_staged: bool, has_unstaged: bool) -> Self {
        match (has_staged, has_unstaged) {
            (false, false) => Self::Clean,
            (true, false) => Self::StagedOnly,
            (false, true) => Self::UnstagedOnly,
            (true, true) => Self::Both,
        }
    }

    pub fn is_clean(self) -> bool {
        self == Self::Clean
    }
}

/// Immutable picture of the repository gathered by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStateSnapshot {
    /// `None` when HEAD is detached.
    pub current_branch: Option<String>,
    pub base_branch: String,
    pub commit_relationship: CommitRelationship,
    pub working_tree_status: WorkingTreeStatus,
    /// In `git diff --cached --name-only` order.
    pub staged_files: Vec<String>,
    /// Modified and untracked paths, deduplicated.
    pub unstaged_files: Vec<String>,
    pub local_commits_ahead_count: u32,
    pub is_detached_head: bool,
    /// True when the checkout is a linked worktree rather than the main one.
    pub is_inside_pr_worktree: bool,
}

impl GitStateSnapshot {
    pub fn is_on_base_branch(&self) -> bool {
        self.current_branch.as_deref() == Some(self.base_branch.as_str())
    }

    pub fn has_changes(&self) -> bool {
        !self.working_tree_status.is_clean()
    }
}

/// Closed set of named repository situations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    MainCleanSame,
    MainStagedSame,
    MainUnstagedSame,
    MainBothSame,
    MainCleanAhead,
    MainChangesAhead,
    BranchSameAsMain,
    BranchDivergent,
    BranchWithChanges,
    BranchAncestor,
    DetachedHead,
    PrWorktree,
}

impl ScenarioId {
    pub const ALL: [ScenarioId; 12] = [
        ScenarioId::MainCleanSame,
        ScenarioId::MainStagedSame,
        ScenarioId::MainUnstagedSame,
        ScenarioId::MainBothSame,
        ScenarioId::MainCleanAhead,
        ScenarioId::MainChangesAhead,
        ScenarioId::BranchSameAsMain,
        ScenarioId::BranchDivergent,
        ScenarioId::BranchWithChanges,
        ScenarioId::BranchAncestor,
        ScenarioId::DetachedHead,
        ScenarioId::PrWorktree,
    ];

    /// Stable snake_case identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioId::MainCleanSame => "main_clean_same",
            ScenarioId::MainStagedSame => "main_staged_same",
            ScenarioId::MainUnstagedSame => "main_unstaged_same",
            ScenarioId::MainBothSame => "main_both_same",
            ScenarioId::MainCleanAhead => "main_clean_ahead",
            ScenarioId::MainChangesAhead => "main_changes_ahead",
            ScenarioId::BranchSameAsMain => "branch_same_as_main",
            ScenarioId::BranchDivergent => "branch_divergent",
            ScenarioId::BranchWithChanges => "branch_with_changes",
            ScenarioId::BranchAncestor => "branch_ancestor",
            ScenarioId::DetachedHead => "detached_head",
            ScenarioId::PrWorktree => "pr_worktree",
        }
    }

    /// The current branch is already checked out elsewhere, so a second
    /// worktree for it cannot be created.
    pub fn branch_in_use(self) -> bool {
        matches!(
            self,
            ScenarioId::PrWorktree | ScenarioId::BranchWithChanges | ScenarioId::BranchDivergent
        )
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display metadata for one menu entry. Carries no execution semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailableAction {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

/// Ordered actions for a scenario plus the recommended key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionMenu {
    pub actions: Vec<AvailableAction>,
    pub recommended: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CommitStaged,
    CommitAll,
    UseCommitsAndCommitAll,
    StashAll,
    LeaveAndEmptyCommit,
    Cancel,
}

/// Ref the new branch is created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchFrom {
    OriginMain,
    Head,
    LocalBase,
}

/// Executable intent chosen for a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateAction {
    pub action: ActionKind,
    pub branch_from: BranchFrom,
    pub stash_unstaged: bool,
}

impl StateAction {
    pub const fn new(action: ActionKind, branch_from: BranchFrom) -> Self {
        Self {
            action,
            branch_from,
            stash_unstaged: false,
        }
    }

    pub const fn cancel() -> Self {
        Self::new(ActionKind::Cancel, BranchFrom::OriginMain)
    }

    pub fn is_cancel(&self) -> bool {
        self.action == ActionKind::Cancel
    }
}

/// Outcome of executing a [`StateAction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_tree_status_from_flags_covers_all_combinations() {
        assert_eq!(
            WorkingTreeStatus::from_flags(false, false),
            WorkingTreeStatus::Clean
        );
        assert_eq!(
            WorkingTreeStatus::from_flags(true, false),
            WorkingTreeStatus::StagedOnly
        );
        assert_eq!(
            WorkingTreeStatus::from_flags(false, true),
            WorkingTreeStatus::UnstagedOnly
        );
        assert_eq!(
            WorkingTreeStatus::from_flags(true, true),
            WorkingTreeStatus::Both
        );
    }

    #[test]
    fn scenario_ids_serialize_as_snake_case() {
        for scenario in ScenarioId::ALL {
            let json = serde_json::to_string(&scenario).expect("serialize");
            assert_eq!(json, format!("\"{}\"", scenario.as_str()));
        }
    }

    #[test]
    fn state_action_deserializes_from_wire_names() {
        let action: StateAction = serde_json::from_str(
            r#"{"action":"commit_staged","branch_from":"origin_main","stash_unstaged":true}"#,
        )
        .expect("parse");
        assert_eq!(action.action, ActionKind::CommitStaged);
        assert_eq!(action.branch_from, BranchFrom::OriginMain);
        assert!(action.stash_unstaged);
    }
}
