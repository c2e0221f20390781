//! Deterministic classification of a [`GitStateSnapshot`] into a [`ScenarioId`].
//!
//! The classifier is total: every reachable snapshot maps to exactly one
//! scenario, and it performs no I/O.

use serde::Serialize;

use crate::core::catalog::actions_for;
use crate::core::types::{
    AvailableAction, CommitRelationship, GitStateSnapshot, ScenarioId, WorkingTreeStatus,
};

/// Classify a snapshot. Priority order, first match wins:
///
/// 1. linked worktree ⇒ `pr_worktree`
/// 2. detached HEAD ⇒ `detached_head`
/// 3. on the base branch ⇒ `main_*` by relationship and tree status
/// 4. on another branch ⇒ `branch_*`
pub fn classify(snapshot: &GitStateSnapshot) -> ScenarioId {
    if snapshot.is_inside_pr_worktree {
        return ScenarioId::PrWorktree;
    }
    if snapshot.is_detached_head || snapshot.current_branch.is_none() {
        return ScenarioId::DetachedHead;
    }
    if snapshot.is_on_base_branch() {
        classify_on_base(snapshot)
    } else {
        classify_on_feature(snapshot)
    }
}

fn classify_on_base(snapshot: &GitStateSnapshot) -> ScenarioId {
    // `ancestor` and `behind` leave nothing local to preserve, so they share
    // the `same` menus. `divergent` only counts as ahead when local commits exist.
    let has_local_commits = match snapshot.commit_relationship {
        CommitRelationship::Same | CommitRelationship::Ancestor | CommitRelationship::Behind => {
            false
        }
        CommitRelationship::Ahead => true,
        CommitRelationship::Divergent => snapshot.local_commits_ahead_count > 0,
    };

    match (has_local_commits, snapshot.working_tree_status) {
        (false, WorkingTreeStatus::Clean) => ScenarioId::MainCleanSame,
        (false, WorkingTreeStatus::StagedOnly) => ScenarioId::MainStagedSame,
        (false, WorkingTreeStatus::UnstagedOnly) => ScenarioId::MainUnstagedSame,
        (false, WorkingTreeStatus::Both) => ScenarioId::MainBothSame,
        (true, WorkingTreeStatus::Clean) => ScenarioId::MainCleanAhead,
        (true, _) => ScenarioId::MainChangesAhead,
    }
}

fn classify_on_feature(snapshot: &GitStateSnapshot) -> ScenarioId {
    match snapshot.commit_relationship {
        CommitRelationship::Same if snapshot.local_commits_ahead_count == 0 => {
            ScenarioId::BranchSameAsMain
        }
        CommitRelationship::Ancestor | CommitRelationship::Behind => ScenarioId::BranchAncestor,
        _ if snapshot.has_changes() => ScenarioId::BranchWithChanges,
        _ => ScenarioId::BranchDivergent,
    }
}

/// One-line human description of a scenario.
pub fn describe(scenario: ScenarioId) -> &'static str {
    match scenario {
        ScenarioId::MainCleanSame => "On the base branch, level with origin, nothing to commit",
        ScenarioId::MainStagedSame => "On the base branch, level with origin, staged changes only",
        ScenarioId::MainUnstagedSame => {
            "On the base branch, level with origin, unstaged changes only"
        }
        ScenarioId::MainBothSame => {
            "On the base branch, level with origin, staged and unstaged changes"
        }
        ScenarioId::MainCleanAhead => "On the base branch with local commits not on origin",
        ScenarioId::MainChangesAhead => {
            "On the base branch with local commits and uncommitted changes"
        }
        ScenarioId::BranchSameAsMain => "On a feature branch that matches origin's base branch",
        ScenarioId::BranchDivergent => "On a feature branch with its own commits",
        ScenarioId::BranchWithChanges => "On a feature branch with uncommitted changes",
        ScenarioId::BranchAncestor => "On a feature branch already contained in origin (merged)",
        ScenarioId::DetachedHead => "HEAD is detached",
        ScenarioId::PrWorktree => "Inside a linked PR worktree",
    }
}

/// Classifier output bundled with its catalog entry, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub scenario: ScenarioId,
    pub description: &'static str,
    pub actions: Vec<AvailableAction>,
    pub recommended: &'static str,
}

/// Classify and look up the scenario's menu in one step.
pub fn report(snapshot: &GitStateSnapshot) -> ScenarioReport {
    let scenario = classify(snapshot);
    let menu = actions_for(scenario);
    ScenarioReport {
        scenario,
        description: describe(scenario),
        actions: menu.actions,
        recommended: menu.recommended,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::snapshot;

    #[test]
    fn main_clean_same() {
        let s = snapshot(
            Some("main"),
            CommitRelationship::Same,
            WorkingTreeStatus::Clean,
        );
        assert_eq!(classify(&s), ScenarioId::MainCleanSame);
    }

    #[test]
    fn main_ancestor_with_unstaged_is_same_style() {
        // Locally behind with nothing unique must not read as ahead or divergent.
        let s = snapshot(
            Some("main"),
            CommitRelationship::Ancestor,
            WorkingTreeStatus::UnstagedOnly,
        );
        assert_eq!(classify(&s), ScenarioId::MainUnstagedSame);
    }

    #[test]
    fn main_same_sub_classifies_by_tree_status() {
        let cases = [
            (WorkingTreeStatus::StagedOnly, ScenarioId::MainStagedSame),
            (WorkingTreeStatus::UnstagedOnly, ScenarioId::MainUnstagedSame),
            (WorkingTreeStatus::Both, ScenarioId::MainBothSame),
        ];
        for (tree, expected) in cases {
            let s = snapshot(Some("main"), CommitRelationship::Same, tree);
            assert_eq!(classify(&s), expected, "tree {tree:?}");
        }
    }

    #[test]
    fn main_ahead_splits_on_changes() {
        let clean = snapshot(
            Some("main"),
            CommitRelationship::Ahead,
            WorkingTreeStatus::Clean,
        );
        assert_eq!(classify(&clean), ScenarioId::MainCleanAhead);
        let dirty = snapshot(
            Some("main"),
            CommitRelationship::Ahead,
            WorkingTreeStatus::Both,
        );
        assert_eq!(classify(&dirty), ScenarioId::MainChangesAhead);
    }

    #[test]
    fn main_divergent_without_local_commits_is_same_style() {
        let mut s = snapshot(
            Some("main"),
            CommitRelationship::Divergent,
            WorkingTreeStatus::StagedOnly,
        );
        s.local_commits_ahead_count = 0;
        assert_eq!(classify(&s), ScenarioId::MainStagedSame);
        s.local_commits_ahead_count = 2;
        assert_eq!(classify(&s), ScenarioId::MainChangesAhead);
    }

    #[test]
    fn detached_wins_regardless_of_other_fields() {
        for relationship in [
            CommitRelationship::Same,
            CommitRelationship::Ahead,
            CommitRelationship::Ancestor,
            CommitRelationship::Divergent,
        ] {
            let mut s = snapshot(Some("main"), relationship, WorkingTreeStatus::Both);
            s.is_detached_head = true;
            assert_eq!(classify(&s), ScenarioId::DetachedHead);
        }
    }

    #[test]
    fn pr_worktree_outranks_detached() {
        let mut s = snapshot(None, CommitRelationship::Same, WorkingTreeStatus::Clean);
        s.is_inside_pr_worktree = true;
        assert_eq!(classify(&s), ScenarioId::PrWorktree);
    }

    #[test]
    fn feature_branch_scenarios() {
        let same = snapshot(
            Some("feat"),
            CommitRelationship::Same,
            WorkingTreeStatus::UnstagedOnly,
        );
        assert_eq!(classify(&same), ScenarioId::BranchSameAsMain);

        let merged = snapshot(
            Some("feat"),
            CommitRelationship::Ancestor,
            WorkingTreeStatus::StagedOnly,
        );
        assert_eq!(classify(&merged), ScenarioId::BranchAncestor);

        let dirty = snapshot(
            Some("feat"),
            CommitRelationship::Ahead,
            WorkingTreeStatus::StagedOnly,
        );
        assert_eq!(classify(&dirty), ScenarioId::BranchWithChanges);

        let clean = snapshot(
            Some("feat"),
            CommitRelationship::Divergent,
            WorkingTreeStatus::Clean,
        );
        assert_eq!(classify(&clean), ScenarioId::BranchDivergent);
    }

    #[test]
    fn classification_is_deterministic() {
        let s = snapshot(
            Some("feat"),
            CommitRelationship::Ahead,
            WorkingTreeStatus::Clean,
        );
        let first = classify(&s);
        for _ in 0..10 {
            assert_eq!(classify(&s.clone()), first);
        }
    }

    #[test]
    fn report_carries_recommended_action_from_catalog() {
        let s = snapshot(
            Some("main"),
            CommitRelationship::Same,
            WorkingTreeStatus::Both,
        );
        let report = report(&s);
        assert_eq!(report.scenario, ScenarioId::MainBothSame);
        assert!(report.actions.iter().any(|a| a.key == report.recommended));
        assert_eq!(report.description, describe(ScenarioId::MainBothSame));
    }
}
