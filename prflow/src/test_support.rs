//! Test-only helpers: a real temporary repository and an in-memory [`GitOps`] fake.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::core::types::{CommitRelationship, GitStateSnapshot, WorkingTreeStatus};
use crate::error::{EngineError, EngineResult};
use crate::io::git::{Git, GitOps, StashOptions, StashOutcome};

/// Temporary repository with a bare `origin` and `main` pushed to it.
///
/// Layout inside the temp dir: `work/` (the checkout) and `origin.git/`.
pub struct TestRepo {
    temp: TempDir,
    root: PathBuf,
}

impl TestRepo {
    /// Create the repository with a single `README.md` commit on `main`.
    pub fn new() -> Result<Self> {
        let repo = Self::unborn()?;
        let origin = repo.temp.path().join("origin.git");
        let origin_str = origin.to_string_lossy().to_string();
        run_git_in(repo.temp.path(), &["init", "--bare", "-b", "main", &origin_str])?;
        repo.run_git(&["remote", "add", "origin", &origin_str])?;
        repo.commit_file("README.md", "# test repo\n", "initial commit")?;
        repo.run_git(&["push", "-u", "origin", "main"])?;
        Ok(repo)
    }

    /// `git init` on `main` with no commits and no remote.
    pub fn unborn() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let root = temp.path().join("work");
        fs::create_dir_all(&root).context("create work dir")?;
        run_git_in(&root, &["init", "-b", "main"])?;
        run_git_in(&root, &["config", "user.email", "prflow@example.com"])?;
        run_git_in(&root, &["config", "user.name", "prflow tests"])?;
        run_git_in(&root, &["config", "commit.gpgsign", "false"])?;
        Ok(Self { temp, root })
    }

    /// The working checkout.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// A path inside the temp dir but outside the checkout.
    pub fn scratch_path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    pub fn git(&self) -> Git {
        Git::new(&self.root)
    }

    /// Run git in the checkout, returning trimmed stdout.
    pub fn run_git(&self, args: &[&str]) -> Result<String> {
        run_git_in(&self.root, args)
    }

    /// Run git and return the raw output even when it fails.
    pub fn try_git(&self, args: &[&str]) -> Result<std::process::Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .env("LC_ALL", "C")
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }

    pub fn write(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    pub fn read(&self, rel: &str) -> Result<String> {
        let path = self.root.join(rel);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.root.join(rel).exists()
    }

    /// Write, stage and commit one file on the current branch.
    pub fn commit_file(&self, rel: &str, contents: &str, message: &str) -> Result<()> {
        self.write(rel, contents)?;
        self.run_git(&["add", rel])?;
        self.run_git(&["commit", "-m", message])?;
        Ok(())
    }

    /// Put a new commit on `origin/main` and leave local `main` behind it.
    pub fn advance_origin(&self, rel: &str, contents: &str, message: &str) -> Result<()> {
        let current = self.run_git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        if current != "main" {
            return Err(anyhow!("advance_origin expects main checked out, got {current}"));
        }
        self.commit_file(rel, contents, message)?;
        self.run_git(&["push", "origin", "main"])?;
        self.run_git(&["reset", "--hard", "HEAD~1"])?;
        Ok(())
    }

    /// Files in a commit, one per line, as `git show --name-only` reports them.
    pub fn files_in(&self, rev: &str) -> Result<Vec<String>> {
        let out = self.run_git(&["show", "--pretty=format:", "--name-only", rev])?;
        Ok(out
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}

fn run_git_in(dir: &Path, args: &[&str]) -> Result<String> {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("LC_ALL", "C")
        .output()
        .with_context(|| format!("spawn git {}", args.join(" ")))?;
    if !out.status.success() {
        return Err(anyhow!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&out.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

/// Build a snapshot with deterministic defaults for classifier tests.
///
/// `ahead` and `divergent` snapshots carry one local commit.
pub fn snapshot(
    branch: Option<&str>,
    relationship: CommitRelationship,
    tree: WorkingTreeStatus,
) -> GitStateSnapshot {
    GitStateSnapshot {
        current_branch: branch.map(str::to_string),
        base_branch: "main".to_string(),
        commit_relationship: relationship,
        working_tree_status: tree,
        staged_files: Vec::new(),
        unstaged_files: Vec::new(),
        local_commits_ahead_count: match relationship {
            CommitRelationship::Ahead | CommitRelationship::Divergent => 1,
            CommitRelationship::Same | CommitRelationship::Behind | CommitRelationship::Ancestor => 0,
        },
        is_detached_head: branch.is_none(),
        is_inside_pr_worktree: false,
    }
}

/// A commit recorded by [`FakeGit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeCommit {
    pub sha: String,
    pub branch: Option<String>,
    pub message: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FakeStash {
    commit: String,
    worktree: Vec<String>,
    untracked: Vec<String>,
}

/// Mutable state behind [`FakeGit`]. Public so tests can inspect it.
#[derive(Debug, Clone, Default)]
pub struct FakeState {
    pub inside_work_tree: bool,
    pub linked_worktree: bool,
    pub branch: Option<String>,
    pub head: String,
    /// Named refs (`origin/main`, `main`) to SHAs.
    pub refs: BTreeMap<String, String>,
    /// `(ancestor, descendant)` SHA pairs.
    pub ancestry: BTreeSet<(String, String)>,
    pub commits_ahead: u32,
    /// Staged paths in index order.
    pub index: Vec<String>,
    /// Modified tracked paths not staged.
    pub worktree: Vec<String>,
    pub untracked: Vec<String>,
    stashes: Vec<FakeStash>,
    pub commits: Vec<FakeCommit>,
    /// Mutating calls in the order they happened.
    pub calls: Vec<String>,
    /// Operation name that fails with a `GitCommandFailure`.
    pub fail_on: Option<&'static str>,
}

/// In-memory index/working-tree model implementing [`GitOps`].
#[derive(Debug)]
pub struct FakeGit {
    state: RefCell<FakeState>,
}

impl FakeGit {
    /// Repository on `branch`, level with `origin/main` at `c0`, clean tree.
    pub fn on_branch(branch: &str) -> Self {
        let mut refs = BTreeMap::new();
        refs.insert("origin/main".to_string(), "c0".to_string());
        refs.insert("main".to_string(), "c0".to_string());
        Self {
            state: RefCell::new(FakeState {
                inside_work_tree: true,
                branch: Some(branch.to_string()),
                head: "c0".to_string(),
                refs,
                ..FakeState::default()
            }),
        }
    }

    pub fn with_staged(self, paths: &[&str]) -> Self {
        self.state
            .borrow_mut()
            .index
            .extend(paths.iter().map(|p| p.to_string()));
        self
    }

    pub fn with_unstaged(self, paths: &[&str]) -> Self {
        self.state
            .borrow_mut()
            .worktree
            .extend(paths.iter().map(|p| p.to_string()));
        self
    }

    pub fn with_untracked(self, paths: &[&str]) -> Self {
        self.state
            .borrow_mut()
            .untracked
            .extend(paths.iter().map(|p| p.to_string()));
        self
    }

    /// HEAD gains `count` commits on top of `origin/main`.
    pub fn ahead_of_origin(self, count: u32) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.head = "c1".to_string();
            state.ancestry.insert(("c0".to_string(), "c1".to_string()));
            state.commits_ahead = count;
        }
        self
    }

    /// `origin/main` moves ahead of HEAD; HEAD has nothing unique.
    pub fn behind_origin(self) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state
                .refs
                .insert("origin/main".to_string(), "c2".to_string());
            state.ancestry.insert(("c0".to_string(), "c2".to_string()));
        }
        self
    }

    /// HEAD and `origin/main` each have commits the other lacks.
    pub fn diverged(self, local_commits: u32) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.head = "c1".to_string();
            state
                .refs
                .insert("origin/main".to_string(), "c2".to_string());
            state.commits_ahead = local_commits;
        }
        self
    }

    pub fn detached(self) -> Self {
        self.state.borrow_mut().branch = None;
        self
    }

    pub fn linked_worktree(self) -> Self {
        self.state.borrow_mut().linked_worktree = true;
        self
    }

    pub fn without_origin(self) -> Self {
        self.state.borrow_mut().refs.remove("origin/main");
        self
    }

    pub fn outside_repository(self) -> Self {
        self.state.borrow_mut().inside_work_tree = false;
        self
    }

    /// Make the named operation (`add`, `stash`, `commit`, ...) fail.
    pub fn failing(self, op: &'static str) -> Self {
        self.state.borrow_mut().fail_on = Some(op);
        self
    }

    /// Snapshot of the internal state.
    pub fn state(&self) -> FakeState {
        self.state.borrow().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn stash_count(&self) -> usize {
        self.state.borrow().stashes.len()
    }

    fn check_failure(&self, op: &str) -> EngineResult<()> {
        if self.state.borrow().fail_on == Some(op) {
            return Err(EngineError::GitCommandFailure {
                command: format!("git {op}"),
                stderr: format!("fatal: simulated {op} failure"),
            });
        }
        Ok(())
    }

    fn resolve(&self, reference: &str) -> Option<String> {
        let state = self.state.borrow();
        if reference == "HEAD" {
            return Some(state.head.clone());
        }
        state.refs.get(reference).cloned()
    }
}

fn push_unique(list: &mut Vec<String>, path: &str) {
    if !list.iter().any(|p| p == path) {
        list.push(path.to_string());
    }
}

impl GitOps for FakeGit {
    fn is_inside_work_tree(&self) -> EngineResult<bool> {
        Ok(self.state.borrow().inside_work_tree)
    }

    fn current_branch(&self) -> EngineResult<Option<String>> {
        Ok(self.state.borrow().branch.clone())
    }

    fn status_porcelain(&self) -> EngineResult<String> {
        let state = self.state.borrow();
        let mut out = String::new();
        for path in &state.index {
            let y = if state.worktree.contains(path) {
                'M'
            } else {
                ' '
            };
            out.push_str(&format!("M{y} {path}\0"));
        }
        for path in state.worktree.iter().filter(|p| !state.index.contains(p)) {
            out.push_str(&format!(" M {path}\0"));
        }
        for path in &state.untracked {
            out.push_str(&format!("?? {path}\0"));
        }
        Ok(out)
    }

    fn ref_commit(&self, reference: &str) -> EngineResult<String> {
        self.resolve(reference)
            .ok_or_else(|| EngineError::RefUnresolvable {
                reference: reference.to_string(),
            })
    }

    fn merge_base_is_ancestor(&self, ancestor: &str, descendant: &str) -> EngineResult<bool> {
        let a = self.ref_commit(ancestor)?;
        let d = self.ref_commit(descendant)?;
        Ok(a == d || self.state.borrow().ancestry.contains(&(a, d)))
    }

    fn merge_base(&self, a: &str, b: &str) -> EngineResult<Option<String>> {
        if self.merge_base_is_ancestor(a, b)? {
            return self.ref_commit(a).map(Some);
        }
        if self.merge_base_is_ancestor(b, a)? {
            return self.ref_commit(b).map(Some);
        }
        Ok(None)
    }

    fn commits_ahead(&self, base_ref: &str) -> EngineResult<u32> {
        self.ref_commit(base_ref)?;
        Ok(self.state.borrow().commits_ahead)
    }

    fn is_linked_worktree(&self) -> EngineResult<bool> {
        Ok(self.state.borrow().linked_worktree)
    }

    fn staged_files(&self) -> EngineResult<Vec<String>> {
        Ok(self.state.borrow().index.clone())
    }

    fn add(&self, paths: &[&str]) -> EngineResult<()> {
        self.check_failure("add")?;
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("add {}", paths.join(" ")));
        let everything = paths.iter().any(|p| *p == "." || *p == "-A");
        let FakeState {
            index,
            worktree,
            untracked,
            ..
        } = &mut *state;
        let selected: Vec<String> = worktree
            .iter()
            .chain(untracked.iter())
            .filter(|p| everything || paths.contains(&p.as_str()))
            .cloned()
            .collect();
        for path in &selected {
            push_unique(index, path);
        }
        worktree.retain(|p| !selected.contains(p));
        untracked.retain(|p| !selected.contains(p));
        Ok(())
    }

    fn stash(&self, options: &StashOptions) -> EngineResult<StashOutcome> {
        self.check_failure("stash")?;
        let mut state = self.state.borrow_mut();
        let mut flags = Vec::new();
        if options.keep_index {
            flags.push("--keep-index");
        }
        if options.include_untracked {
            flags.push("--include-untracked");
        }
        state.calls.push(format!("stash {}", flags.join(" ")).trim_end().to_string());

        let untracked = if options.include_untracked {
            state.untracked.clone()
        } else {
            Vec::new()
        };
        if state.index.is_empty() && state.worktree.is_empty() && untracked.is_empty() {
            return Ok(StashOutcome::NothingToStash);
        }
        let commit = format!("stash{}", state.stashes.len() + 1);
        let mut worktree = state.worktree.clone();
        if !options.keep_index {
            let staged = state.index.clone();
            for path in &staged {
                push_unique(&mut worktree, path);
            }
            state.index.clear();
        }
        state.stashes.push(FakeStash {
            commit: commit.clone(),
            worktree,
            untracked,
        });
        state.worktree.clear();
        if options.include_untracked {
            state.untracked.clear();
        }
        Ok(StashOutcome::Saved { commit })
    }

    // Only the working-tree half comes back; staged paths were committed.
    fn restore_unstaged(&self, stash: &str) -> EngineResult<()> {
        self.check_failure("restore_unstaged")?;
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("restore unstaged {stash}"));
        let position = state
            .stashes
            .iter()
            .position(|entry| entry.commit == stash)
            .ok_or_else(|| EngineError::RefUnresolvable {
                reference: stash.to_string(),
            })?;
        let entry = state.stashes.remove(position);
        for path in &entry.worktree {
            push_unique(&mut state.worktree, path);
        }
        for path in &entry.untracked {
            push_unique(&mut state.untracked, path);
        }
        Ok(())
    }

    fn commit(&self, message: &str, allow_empty: bool) -> EngineResult<()> {
        self.check_failure("commit")?;
        let mut state = self.state.borrow_mut();
        state.calls.push(if allow_empty {
            "commit --allow-empty".to_string()
        } else {
            "commit".to_string()
        });
        if state.index.is_empty() && !allow_empty {
            return Err(EngineError::GitCommandFailure {
                command: format!("git commit -m {message}"),
                stderr: "nothing to commit, working tree clean".to_string(),
            });
        }
        let sha = format!("n{}", state.commits.len() + 1);
        let files = std::mem::take(&mut state.index);
        let branch = state.branch.clone();
        state.commits.push(FakeCommit {
            sha: sha.clone(),
            branch,
            message: message.to_string(),
            files,
        });
        state.head = sha;
        Ok(())
    }

    fn checkout_new_branch(&self, name: &str, start_point: &str) -> EngineResult<()> {
        self.check_failure("checkout")?;
        let target = self.ref_commit(start_point)?;
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("checkout -b {name} {start_point}"));
        state.branch = Some(name.to_string());
        state.head = target;
        state.linked_worktree = false;
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> EngineResult<()> {
        self.check_failure("push")?;
        self.state
            .borrow_mut()
            .calls
            .push(format!("push {remote} {branch}"));
        Ok(())
    }
}
