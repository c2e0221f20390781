//! Gathering a [`GitStateSnapshot`] from a repository.
//!
//! The analyzer is the only engine step that reads repository state. It
//! degrades gracefully when `origin/<base>` is missing (the relationship
//! becomes `divergent`) and fails only when the directory is not a git
//! working tree or a git command breaks.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::core::porcelain;
use crate::core::relationship::{self, RefFacts};
use crate::core::types::GitStateSnapshot;
use crate::error::{EngineError, EngineResult};
use crate::io::git::{Git, GitOps};

/// Open the repository containing `cwd` and analyze it.
pub fn analyze_in(cwd: &Path, base_branch: &str) -> EngineResult<GitStateSnapshot> {
    let git = Git::open(cwd)?;
    analyze_git_state(&git, base_branch, cwd)
}

/// Build a snapshot of `HEAD` versus `origin/<base_branch>` and the working tree.
///
/// `cwd` is only used to report `NotAGitRepository`.
#[instrument(skip_all, fields(base_branch = %base_branch))]
pub fn analyze_git_state<G: GitOps>(
    git: &G,
    base_branch: &str,
    cwd: &Path,
) -> EngineResult<GitStateSnapshot> {
    if !git.is_inside_work_tree()? {
        return Err(EngineError::NotAGitRepository {
            path: cwd.to_path_buf(),
        });
    }

    let current_branch = git.current_branch()?;
    let origin_ref = format!("origin/{base_branch}");
    let facts = gather_ref_facts(git, &origin_ref)?;
    let commit_relationship = relationship::derive(&facts);
    let local_commits_ahead_count = if facts.origin.is_some() {
        git.commits_ahead(&origin_ref)?
    } else {
        0
    };

    let entries = porcelain::parse(&git.status_porcelain()?);
    let summary = porcelain::summarize(&entries);
    let working_tree_status = summary.working_tree_status();
    let staged_files = git.staged_files()?;
    let is_inside_pr_worktree = git.is_linked_worktree()?;

    let snapshot = GitStateSnapshot {
        is_detached_head: current_branch.is_none(),
        current_branch,
        base_branch: base_branch.to_string(),
        commit_relationship,
        working_tree_status,
        staged_files,
        unstaged_files: summary.unstaged,
        local_commits_ahead_count,
        is_inside_pr_worktree,
    };
    info!(
        branch = snapshot.current_branch.as_deref().unwrap_or("(detached)"),
        relationship = ?snapshot.commit_relationship,
        tree = ?snapshot.working_tree_status,
        ahead = snapshot.local_commits_ahead_count,
        linked_worktree = snapshot.is_inside_pr_worktree,
        "analyzed git state"
    );
    Ok(snapshot)
}

fn gather_ref_facts<G: GitOps>(git: &G, origin_ref: &str) -> EngineResult<RefFacts> {
    let head = match resolve_optional(git, "HEAD")? {
        Some(sha) => sha,
        None => {
            warn!("HEAD does not resolve (unborn branch?)");
            return Ok(RefFacts {
                head: String::new(),
                origin: None,
                head_is_ancestor: false,
                origin_is_ancestor: false,
                merge_base: None,
            });
        }
    };
    let origin = resolve_optional(git, origin_ref)?;
    let Some(origin_sha) = origin.as_deref() else {
        warn!(origin_ref, "origin ref not found; treating as divergent");
        return Ok(RefFacts {
            head,
            origin: None,
            head_is_ancestor: false,
            origin_is_ancestor: false,
            merge_base: None,
        });
    };
    if head == origin_sha {
        return Ok(RefFacts {
            head,
            origin,
            head_is_ancestor: true,
            origin_is_ancestor: true,
            merge_base: None,
        });
    }

    let head_is_ancestor = git.merge_base_is_ancestor("HEAD", origin_ref)?;
    let origin_is_ancestor = git.merge_base_is_ancestor(origin_ref, "HEAD")?;
    let merge_base = git.merge_base("HEAD", origin_ref)?;
    debug!(
        head_is_ancestor,
        origin_is_ancestor,
        merge_base = merge_base.as_deref().unwrap_or("-"),
        "ref facts"
    );
    Ok(RefFacts {
        head,
        origin,
        head_is_ancestor,
        origin_is_ancestor,
        merge_base,
    })
}

fn resolve_optional<G: GitOps>(git: &G, reference: &str) -> EngineResult<Option<String>> {
    match git.ref_commit(reference) {
        Ok(sha) => Ok(Some(sha)),
        Err(EngineError::RefUnresolvable { .. }) => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{CommitRelationship, WorkingTreeStatus};
    use crate::test_support::{FakeGit, TestRepo};

    fn analyze(git: &FakeGit) -> GitStateSnapshot {
        analyze_git_state(git, "main", Path::new(".")).expect("analyze")
    }

    #[test]
    fn level_clean_main() {
        let s = analyze(&FakeGit::on_branch("main"));
        assert_eq!(s.current_branch.as_deref(), Some("main"));
        assert_eq!(s.commit_relationship, CommitRelationship::Same);
        assert_eq!(s.working_tree_status, WorkingTreeStatus::Clean);
        assert!(!s.is_detached_head);
        assert_eq!(s.local_commits_ahead_count, 0);
    }

    #[test]
    fn staged_and_unstaged_files_are_split() {
        let git = FakeGit::on_branch("main")
            .with_staged(&["a.rs", "b.rs"])
            .with_unstaged(&["b.rs", "c.rs"])
            .with_untracked(&["notes.md"]);
        let s = analyze(&git);
        assert_eq!(s.working_tree_status, WorkingTreeStatus::Both);
        assert_eq!(s.staged_files, vec!["a.rs", "b.rs"]);
        assert_eq!(s.unstaged_files, vec!["b.rs", "c.rs", "notes.md"]);
    }

    #[test]
    fn untracked_only_counts_as_unstaged() {
        let s = analyze(&FakeGit::on_branch("main").with_untracked(&["docs/PLAN.md"]));
        assert_eq!(s.working_tree_status, WorkingTreeStatus::UnstagedOnly);
    }

    #[test]
    fn ahead_counts_local_commits() {
        let s = analyze(&FakeGit::on_branch("main").ahead_of_origin(2));
        assert_eq!(s.commit_relationship, CommitRelationship::Ahead);
        assert_eq!(s.local_commits_ahead_count, 2);
    }

    #[test]
    fn behind_origin_is_ancestor() {
        let s = analyze(&FakeGit::on_branch("main").behind_origin());
        assert_eq!(s.commit_relationship, CommitRelationship::Ancestor);
    }

    #[test]
    fn diverged_histories() {
        let s = analyze(&FakeGit::on_branch("main").diverged(1));
        assert_eq!(s.commit_relationship, CommitRelationship::Divergent);
        assert_eq!(s.local_commits_ahead_count, 1);
    }

    #[test]
    fn missing_origin_degrades_to_divergent() {
        let s = analyze(&FakeGit::on_branch("main").without_origin());
        assert_eq!(s.commit_relationship, CommitRelationship::Divergent);
        assert_eq!(s.local_commits_ahead_count, 0);
    }

    #[test]
    fn detached_and_linked_flags() {
        let s = analyze(&FakeGit::on_branch("main").detached().linked_worktree());
        assert!(s.is_detached_head);
        assert_eq!(s.current_branch, None);
        assert!(s.is_inside_pr_worktree);
    }

    #[test]
    fn outside_repository_is_fatal() {
        let git = FakeGit::on_branch("main").outside_repository();
        let err = analyze_git_state(&git, "main", Path::new("/tmp/x")).expect_err("not a repo");
        assert!(matches!(err, EngineError::NotAGitRepository { .. }));
    }

    #[test]
    fn analyze_in_real_repository_behind_origin() {
        let repo = TestRepo::new().expect("repo");
        repo.advance_origin("upstream.txt", "u\n", "upstream change")
            .expect("advance origin");
        repo.write("scratch.txt", "s\n").expect("write");

        let s = analyze_in(repo.path(), "main").expect("analyze");
        assert_eq!(s.commit_relationship, CommitRelationship::Ancestor);
        assert_eq!(s.working_tree_status, WorkingTreeStatus::UnstagedOnly);
        assert_eq!(s.unstaged_files, vec!["scratch.txt"]);
        assert!(!s.is_inside_pr_worktree);
    }

    #[test]
    fn unborn_branch_degrades_to_divergent() {
        let repo = TestRepo::unborn().expect("repo");
        repo.write("first.txt", "1\n").expect("write");

        let s = analyze_in(repo.path(), "main").expect("analyze");
        assert_eq!(s.current_branch.as_deref(), Some("main"));
        assert!(!s.is_detached_head);
        assert_eq!(s.commit_relationship, CommitRelationship::Divergent);
        assert_eq!(s.local_commits_ahead_count, 0);
        assert_eq!(s.working_tree_status, WorkingTreeStatus::UnstagedOnly);
        assert_eq!(s.unstaged_files, vec!["first.txt"]);
    }

    #[test]
    fn non_ascii_paths_match_across_staged_and_unstaged() {
        let repo = TestRepo::new().expect("repo");
        repo.write("docs/caf\u{e9}.md", "x\n").expect("write");
        repo.write("na\u{ef}ve plan.md", "y\n").expect("write");
        repo.run_git(&["add", "na\u{ef}ve plan.md"]).expect("add");

        let s = analyze_in(repo.path(), "main").expect("analyze");
        assert_eq!(s.unstaged_files, vec!["docs/caf\u{e9}.md"]);
        assert_eq!(s.staged_files, vec!["na\u{ef}ve plan.md"]);
        assert!(repo.exists(&s.unstaged_files[0]));
    }

    #[test]
    fn analyze_in_plain_directory_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = analyze_in(temp.path(), "main").expect_err("not a repo");
        assert!(matches!(err, EngineError::NotAGitRepository { .. }));
    }
}
