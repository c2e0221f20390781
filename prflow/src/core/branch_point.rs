//! Ref computation for the new branch's start point.

use crate::core::types::{BranchFrom, StateAction};

/// Ref string passed to `git checkout -b <branch> <ref>`.
///
/// - `origin_main` ⇒ `origin/<base>`
/// - `head` ⇒ `HEAD`
/// - `local_base` ⇒ `<base>`
pub fn get_branch_point(action: &StateAction, base_branch: &str) -> String {
    match action.branch_from {
        BranchFrom::OriginMain => format!("origin/{base_branch}"),
        BranchFrom::Head => "HEAD".to_string(),
        BranchFrom::LocalBase => base_branch.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ActionKind;

    #[test]
    fn origin_main_is_remote_qualified() {
        let action = StateAction::new(ActionKind::CommitAll, BranchFrom::OriginMain);
        assert_eq!(get_branch_point(&action, "main"), "origin/main");
    }

    #[test]
    fn head_ignores_base() {
        let action = StateAction::new(ActionKind::UseCommitsAndCommitAll, BranchFrom::Head);
        assert_eq!(get_branch_point(&action, "main"), "HEAD");
        assert_eq!(get_branch_point(&action, "develop"), "HEAD");
    }

    #[test]
    fn local_base_is_unqualified() {
        let action = StateAction::new(ActionKind::CommitAll, BranchFrom::LocalBase);
        assert_eq!(get_branch_point(&action, "develop"), "develop");
    }
}
