//! Static table of the actions each scenario offers.
//!
//! Keys are stable and safe to script against. Every list ends with
//! `cancel`, and the recommended key is always one of the listed entries.

use crate::core::types::{
    ActionKind, ActionMenu, AvailableAction, BranchFrom, ScenarioId, StateAction,
};
use crate::error::{EngineError, EngineResult};

/// Catalog entry: display metadata paired with the intent it resolves to.
#[derive(Debug, Clone, Copy)]
struct Entry {
    meta: AvailableAction,
    intent: StateAction,
}

const fn entry(
    key: &'static str,
    label: &'static str,
    description: &'static str,
    intent: StateAction,
) -> Entry {
    Entry {
        meta: AvailableAction {
            key,
            label,
            description,
        },
        intent,
    }
}

const COMMIT_STAGED: Entry = entry(
    "commit_staged",
    "Commit staged changes",
    "Branch from origin and commit only what is already staged",
    StateAction::new(ActionKind::CommitStaged, BranchFrom::OriginMain),
);

const COMMIT_ALL: Entry = entry(
    "commit_all",
    "Commit all changes",
    "Stage every change, branch from origin and commit",
    StateAction::new(ActionKind::CommitAll, BranchFrom::OriginMain),
);

const COMMIT_STAGED_STASH_UNSTAGED: Entry = entry(
    "commit_staged_stash_unstaged",
    "Commit staged, stash unstaged",
    "Commit staged changes to the PR branch and move unstaged changes aside in a stash",
    StateAction {
        action: ActionKind::CommitStaged,
        branch_from: BranchFrom::OriginMain,
        stash_unstaged: true,
    },
);

const USE_COMMITS: Entry = entry(
    "use_commits",
    "Carry local commits",
    "Branch from HEAD so local commits come along, then commit any remaining changes",
    StateAction::new(ActionKind::UseCommitsAndCommitAll, BranchFrom::Head),
);

const COMMIT_ALL_FROM_LOCAL_BASE: Entry = entry(
    "commit_all_from_local_base",
    "Commit all from local base",
    "Stage every change and branch from the local base branch instead of origin",
    StateAction::new(ActionKind::CommitAll, BranchFrom::LocalBase),
);

const STASH_ALL: Entry = entry(
    "stash_all",
    "Stash everything",
    "Stash all changes including untracked files and start the PR with an empty commit",
    StateAction::new(ActionKind::StashAll, BranchFrom::OriginMain),
);

const EMPTY_COMMIT: Entry = entry(
    "empty_commit",
    "Start with an empty commit",
    "Leave the working tree untouched and start the PR with an empty commit",
    StateAction::new(ActionKind::LeaveAndEmptyCommit, BranchFrom::OriginMain),
);

const CANCEL: Entry = entry(
    "cancel",
    "Cancel",
    "Abort without touching the repository",
    StateAction::cancel(),
);

fn entries(scenario: ScenarioId) -> &'static [Entry] {
    match scenario {
        ScenarioId::MainCleanSame => &[EMPTY_COMMIT, CANCEL],
        ScenarioId::MainStagedSame => &[COMMIT_STAGED, COMMIT_ALL, STASH_ALL, CANCEL],
        ScenarioId::MainUnstagedSame => &[COMMIT_ALL, STASH_ALL, CANCEL],
        ScenarioId::MainBothSame => &[
            COMMIT_ALL,
            COMMIT_STAGED_STASH_UNSTAGED,
            STASH_ALL,
            CANCEL,
        ],
        ScenarioId::MainCleanAhead => &[USE_COMMITS, EMPTY_COMMIT, CANCEL],
        ScenarioId::MainChangesAhead => &[USE_COMMITS, COMMIT_ALL, STASH_ALL, CANCEL],
        ScenarioId::BranchSameAsMain => &[COMMIT_ALL, EMPTY_COMMIT, STASH_ALL, CANCEL],
        ScenarioId::BranchAncestor => &[
            COMMIT_ALL,
            COMMIT_ALL_FROM_LOCAL_BASE,
            EMPTY_COMMIT,
            CANCEL,
        ],
        // The current branch is checked out here already; keep the menu narrow.
        ScenarioId::BranchWithChanges => &[USE_COMMITS, COMMIT_ALL, CANCEL],
        ScenarioId::BranchDivergent => &[USE_COMMITS, CANCEL],
        ScenarioId::DetachedHead => &[USE_COMMITS, COMMIT_ALL, CANCEL],
        ScenarioId::PrWorktree => &[USE_COMMITS, CANCEL],
    }
}

fn recommended(scenario: ScenarioId) -> &'static str {
    match scenario {
        ScenarioId::MainCleanSame => EMPTY_COMMIT.meta.key,
        ScenarioId::MainStagedSame => COMMIT_STAGED.meta.key,
        ScenarioId::MainUnstagedSame
        | ScenarioId::MainBothSame
        | ScenarioId::BranchSameAsMain
        | ScenarioId::BranchAncestor => COMMIT_ALL.meta.key,
        ScenarioId::MainCleanAhead
        | ScenarioId::MainChangesAhead
        | ScenarioId::BranchWithChanges
        | ScenarioId::BranchDivergent
        | ScenarioId::DetachedHead
        | ScenarioId::PrWorktree => USE_COMMITS.meta.key,
    }
}

/// Ordered actions and the recommended key for a scenario.
pub fn actions_for(scenario: ScenarioId) -> ActionMenu {
    ActionMenu {
        actions: entries(scenario).iter().map(|e| e.meta).collect(),
        recommended: recommended(scenario),
    }
}

/// Resolve a menu key offered by `scenario` to its executable intent.
pub fn resolve(scenario: ScenarioId, key: &str) -> EngineResult<StateAction> {
    entries(scenario)
        .iter()
        .find(|e| e.meta.key == key)
        .map(|e| e.intent)
        .ok_or_else(|| EngineError::UnknownAction {
            key: key.to_string(),
            scenario,
        })
}

/// Intent behind the recommended entry, used when nobody is asked.
pub fn default_action(scenario: ScenarioId) -> StateAction {
    let key = recommended(scenario);
    entries(scenario)
        .iter()
        .find(|e| e.meta.key == key)
        .map_or_else(StateAction::cancel, |e| e.intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_menu_ends_with_cancel() {
        for scenario in ScenarioId::ALL {
            let menu = actions_for(scenario);
            let last = menu.actions.last().expect("non-empty menu");
            assert_eq!(last.key, "cancel", "scenario {scenario}");
        }
    }

    #[test]
    fn recommended_key_is_listed() {
        for scenario in ScenarioId::ALL {
            let menu = actions_for(scenario);
            assert!(
                menu.actions.iter().any(|a| a.key == menu.recommended),
                "scenario {scenario} recommends unlisted {}",
                menu.recommended
            );
        }
    }

    #[test]
    fn keys_are_unique_within_a_menu() {
        for scenario in ScenarioId::ALL {
            let menu = actions_for(scenario);
            let mut keys: Vec<&str> = menu.actions.iter().map(|a| a.key).collect();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), menu.actions.len(), "scenario {scenario}");
        }
    }

    #[test]
    fn stash_unstaged_is_only_offered_with_both_changes() {
        let key = "commit_staged_stash_unstaged";
        for scenario in ScenarioId::ALL {
            let offered = actions_for(scenario).actions.iter().any(|a| a.key == key);
            assert_eq!(offered, scenario == ScenarioId::MainBothSame, "{scenario}");
        }
        let intent = resolve(ScenarioId::MainBothSame, key).expect("resolve");
        assert_eq!(intent.action, ActionKind::CommitStaged);
        assert!(intent.stash_unstaged);
    }

    #[test]
    fn use_commits_always_branches_from_head() {
        for scenario in ScenarioId::ALL {
            if let Ok(intent) = resolve(scenario, "use_commits") {
                assert_eq!(intent.action, ActionKind::UseCommitsAndCommitAll);
                assert_eq!(intent.branch_from, BranchFrom::Head);
            }
        }
    }

    #[test]
    fn branch_in_use_scenarios_have_restricted_menus() {
        for scenario in ScenarioId::ALL.into_iter().filter(|s| s.branch_in_use()) {
            let menu = actions_for(scenario);
            assert!(menu.actions.len() <= 3, "{scenario}");
            assert!(menu.actions.iter().all(|a| a.key != "stash_all"));
        }
    }

    #[test]
    fn resolve_rejects_keys_not_in_menu() {
        let err = resolve(ScenarioId::MainCleanSame, "commit_all").expect_err("unknown");
        assert!(matches!(
            err,
            EngineError::UnknownAction {
                scenario: ScenarioId::MainCleanSame,
                ..
            }
        ));
    }

    #[test]
    fn cancel_resolves_everywhere() {
        for scenario in ScenarioId::ALL {
            assert!(resolve(scenario, "cancel").expect("cancel").is_cancel());
        }
    }

    #[test]
    fn default_action_matches_recommended_entry() {
        assert_eq!(
            default_action(ScenarioId::MainStagedSame).action,
            ActionKind::CommitStaged
        );
        assert_eq!(
            default_action(ScenarioId::MainCleanSame).action,
            ActionKind::LeaveAndEmptyCommit
        );
        assert_eq!(
            default_action(ScenarioId::MainCleanAhead).branch_from,
            BranchFrom::Head
        );
    }
}
