//! Git adapter for the state engine.
//!
//! [`GitOps`] is the fixed capability set the analyzer and executor depend
//! on. [`Git`] implements it by shelling out to `git` from the repository
//! top level; tests use the in-memory fake in `test_support`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::error::{EngineError, EngineResult};
use crate::io::process::{CommandOutput, run_command_with_input};

pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 10 * 1024 * 1024;

const NOTHING_TO_STASH: &str = "No local changes to save";

/// Flags for `git stash push`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashOptions {
    pub keep_index: bool,
    pub include_untracked: bool,
    pub message: String,
}

/// Result of `git stash push`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StashOutcome {
    /// A stash entry was created; `commit` is the stash commit SHA.
    Saved { commit: String },
    NothingToStash,
}

/// Primitive, side-effecting git operations used by the engine.
pub trait GitOps {
    /// `git rev-parse --is-inside-work-tree`.
    fn is_inside_work_tree(&self) -> EngineResult<bool>;

    /// Current branch name, or `None` when HEAD is detached.
    fn current_branch(&self) -> EngineResult<Option<String>>;

    /// Raw `git status --porcelain=v1 -z` output (NUL-terminated records).
    fn status_porcelain(&self) -> EngineResult<String>;

    /// `git rev-parse <ref>`; `RefUnresolvable` when the ref does not exist.
    fn ref_commit(&self, reference: &str) -> EngineResult<String>;

    /// `git merge-base --is-ancestor <ancestor> <descendant>`.
    fn merge_base_is_ancestor(&self, ancestor: &str, descendant: &str) -> EngineResult<bool>;

    /// `git merge-base <a> <b>`, `None` for unrelated histories.
    fn merge_base(&self, a: &str, b: &str) -> EngineResult<Option<String>>;

    /// Number of commits reachable from HEAD but not from `base_ref`.
    fn commits_ahead(&self, base_ref: &str) -> EngineResult<u32>;

    /// True when the checkout is a linked worktree, not the main one.
    fn is_linked_worktree(&self) -> EngineResult<bool>;

    /// `git diff --cached --name-only`, in git's order.
    fn staged_files(&self) -> EngineResult<Vec<String>>;

    fn add(&self, paths: &[&str]) -> EngineResult<()>;

    fn stash(&self, options: &StashOptions) -> EngineResult<StashOutcome>;

    /// Reapply the working-tree half of the keep-index stash `stash` and drop it.
    ///
    /// Only the changes between the stash's index and working tree are
    /// applied, plus its untracked files. Tracked changes apply atomically:
    /// on failure the tree is untouched and the stash is kept.
    fn restore_unstaged(&self, stash: &str) -> EngineResult<()>;

    fn commit(&self, message: &str, allow_empty: bool) -> EngineResult<()>;

    /// `git checkout -b <name> <start_point>`.
    fn checkout_new_branch(&self, name: &str, start_point: &str) -> EngineResult<()>;

    /// `git push -u <remote> <branch>`.
    fn push(&self, remote: &str, branch: &str) -> EngineResult<()>;
}

/// Wrapper for executing git commands in a repository.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            timeout: DEFAULT_GIT_TIMEOUT,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }

    /// Resolve the repository top level from `cwd`.
    ///
    /// Fails with `NotAGitRepository` when `cwd` is not inside a working tree.
    #[instrument(skip_all, fields(cwd = %cwd.display()))]
    pub fn open(cwd: &Path) -> EngineResult<Self> {
        let probe = Self::new(cwd);
        let not_a_repo = || EngineError::NotAGitRepository {
            path: cwd.to_path_buf(),
        };
        if !cwd.is_dir() {
            return Err(not_a_repo());
        }
        let output = probe.run(&["rev-parse", "--show-toplevel"])?;
        if !output.success() {
            debug!(stderr = %output.stderr_lossy().trim(), "rev-parse --show-toplevel failed");
            return Err(not_a_repo());
        }
        let toplevel = output.stdout_lossy().trim().to_string();
        if toplevel.is_empty() {
            return Err(not_a_repo());
        }
        debug!(toplevel = %toplevel, "opened repository");
        Ok(Self::new(toplevel))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_output_limit(mut self, output_limit_bytes: usize) -> Self {
        self.output_limit_bytes = output_limit_bytes;
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn run_capture(&self, args: &[&str]) -> EngineResult<String> {
        let output = self.run_checked(args)?;
        Ok(output.stdout_lossy())
    }

    fn run_checked(&self, args: &[&str]) -> EngineResult<CommandOutput> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(EngineError::git_failure(args, output.stderr_lossy()));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> EngineResult<CommandOutput> {
        self.exec(args, None)
    }

    fn exec(&self, args: &[&str], input: Option<Vec<u8>>) -> EngineResult<CommandOutput> {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(&self.workdir)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0");
        let output =
            run_command_with_input(cmd, input, self.timeout, self.output_limit_bytes).map_err(
                |source| EngineError::Spawn {
                    command: format!("git {}", args.join(" ")),
                    source,
                },
            )?;
        if output.timed_out {
            return Err(EngineError::GitTimeout {
                command: format!("git {}", args.join(" ")),
                timeout_secs: self.timeout.as_secs(),
            });
        }
        Ok(output)
    }

    // Exit 0 => true, exit 1 => false, anything else is a failure.
    fn run_predicate(&self, args: &[&str]) -> EngineResult<bool> {
        let output = self.run(args)?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(EngineError::git_failure(args, output.stderr_lossy())),
        }
    }

    /// Paths in the tree of `treeish`, NUL-separated by git.
    fn tree_paths(&self, treeish: &str) -> EngineResult<Vec<String>> {
        let out = self.run_capture(&["ls-tree", "-r", "--name-only", "-z", treeish])?;
        Ok(split_nul(&out))
    }

    fn resolve_git_path(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw.trim());
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workdir.join(path)
        };
        fs::canonicalize(&joined).unwrap_or(joined)
    }
}

impl GitOps for Git {
    fn is_inside_work_tree(&self) -> EngineResult<bool> {
        let output = self.run(&["rev-parse", "--is-inside-work-tree"])?;
        Ok(output.success() && output.stdout_lossy().trim() == "true")
    }

    // `symbolic-ref` also names an unborn branch; exit 1 means detached.
    #[instrument(skip_all)]
    fn current_branch(&self) -> EngineResult<Option<String>> {
        let args = ["symbolic-ref", "--quiet", "--short", "HEAD"];
        let output = self.run(&args)?;
        match output.status.code() {
            Some(0) => {
                let name = output.stdout_lossy().trim().to_string();
                debug!(branch = %name, "current branch");
                Ok(Some(name))
            }
            Some(1) => {
                debug!("detached HEAD detected");
                Ok(None)
            }
            _ => Err(EngineError::git_failure(&args, output.stderr_lossy())),
        }
    }

    fn status_porcelain(&self) -> EngineResult<String> {
        self.run_capture(&["status", "--porcelain=v1", "-z", "-uall"])
    }

    fn ref_commit(&self, reference: &str) -> EngineResult<String> {
        let spec = format!("{reference}^{{commit}}");
        let output = self.run(&["rev-parse", "--verify", "--quiet", &spec])?;
        let sha = output.stdout_lossy().trim().to_string();
        if !output.status.success() || sha.is_empty() {
            return Err(EngineError::RefUnresolvable {
                reference: reference.to_string(),
            });
        }
        Ok(sha)
    }

    fn merge_base_is_ancestor(&self, ancestor: &str, descendant: &str) -> EngineResult<bool> {
        self.run_predicate(&["merge-base", "--is-ancestor", ancestor, descendant])
    }

    fn merge_base(&self, a: &str, b: &str) -> EngineResult<Option<String>> {
        let args = ["merge-base", a, b];
        let output = self.run(&args)?;
        match output.status.code() {
            Some(0) => Ok(Some(output.stdout_lossy().trim().to_string())),
            Some(1) => Ok(None),
            _ => Err(EngineError::git_failure(&args, output.stderr_lossy())),
        }
    }

    fn commits_ahead(&self, base_ref: &str) -> EngineResult<u32> {
        let range = format!("{base_ref}..HEAD");
        let out = self.run_capture(&["rev-list", "--count", &range])?;
        out.trim()
            .parse()
            .map_err(|_| EngineError::git_failure(&["rev-list", "--count", &range], out.trim()))
    }

    #[instrument(skip_all)]
    fn is_linked_worktree(&self) -> EngineResult<bool> {
        let out = self.run_capture(&["rev-parse", "--git-dir", "--git-common-dir"])?;
        let mut lines = out.lines();
        let (Some(git_dir), Some(common_dir)) = (lines.next(), lines.next()) else {
            warn!(output = %out.trim(), "unexpected rev-parse output");
            return Ok(false);
        };
        let linked = self.resolve_git_path(git_dir) != self.resolve_git_path(common_dir);
        debug!(linked, "worktree check");
        Ok(linked)
    }

    fn staged_files(&self) -> EngineResult<Vec<String>> {
        let out = self.run_capture(&["diff", "--cached", "--name-only", "-z"])?;
        Ok(split_nul(&out))
    }

    #[instrument(skip_all, fields(paths = ?paths))]
    fn add(&self, paths: &[&str]) -> EngineResult<()> {
        let mut args = vec!["add", "--"];
        args.extend_from_slice(paths);
        self.run_checked(&args)?;
        Ok(())
    }

    #[instrument(skip_all, fields(keep_index = options.keep_index, include_untracked = options.include_untracked))]
    fn stash(&self, options: &StashOptions) -> EngineResult<StashOutcome> {
        let mut args = vec!["stash", "push"];
        if options.keep_index {
            args.push("--keep-index");
        }
        if options.include_untracked {
            args.push("--include-untracked");
        }
        args.push("-m");
        args.push(options.message.as_str());
        let output = self.run_checked(&args)?;
        if output.stdout_lossy().contains(NOTHING_TO_STASH)
            || output.stderr_lossy().contains(NOTHING_TO_STASH)
        {
            debug!("nothing to stash");
            return Ok(StashOutcome::NothingToStash);
        }
        let commit = self.ref_commit("refs/stash")?;
        debug!(commit = %commit, "stash saved");
        Ok(StashOutcome::Saved { commit })
    }

    // Staged hunks are already committed on the new branch; only the
    // index-to-worktree diff and the untracked files come back.
    #[instrument(skip_all, fields(stash = %stash))]
    fn restore_unstaged(&self, stash: &str) -> EngineResult<()> {
        let index_tree = format!("{stash}^2");
        let untracked_commit = format!("{stash}^3");
        let untracked = match self.ref_commit(&untracked_commit) {
            Ok(_) => self.tree_paths(&untracked_commit)?,
            Err(EngineError::RefUnresolvable { .. }) => Vec::new(),
            Err(err) => return Err(err),
        };
        let restore_args = ["restore", "--source", untracked_commit.as_str(), "--worktree"];
        if let Some(existing) = untracked.iter().find(|p| self.workdir.join(p).exists()) {
            return Err(EngineError::git_failure(
                &restore_args,
                format!("{existing} already exists, no checkout"),
            ));
        }

        let diff_args = [
            "diff",
            "--binary",
            "--no-color",
            "--no-ext-diff",
            "--src-prefix=a/",
            "--dst-prefix=b/",
            index_tree.as_str(),
            stash,
        ];
        let patch = self.run_checked(&diff_args)?;
        if patch.stdout_truncated > 0 {
            return Err(EngineError::git_failure(
                &diff_args,
                "patch exceeds the output limit",
            ));
        }
        if !patch.stdout.is_empty() {
            let apply_args = ["apply", "--whitespace=nowarn", "-"];
            let output = self.exec(&apply_args, Some(patch.stdout))?;
            if !output.status.success() {
                return Err(EngineError::git_failure(&apply_args, output.stderr_lossy()));
            }
        }

        if !untracked.is_empty() {
            let mut args = restore_args.to_vec();
            args.push("--");
            args.extend(untracked.iter().map(String::as_str));
            self.run_checked(&args)?;
        }

        if self.ref_commit("stash@{0}")? == stash {
            self.run_checked(&["stash", "drop", "--quiet", "stash@{0}"])?;
        } else {
            warn!("stash is no longer on top; leaving it in place");
        }
        debug!(untracked = untracked.len(), "unstaged changes restored");
        Ok(())
    }

    #[instrument(skip_all, fields(allow_empty = allow_empty))]
    fn commit(&self, message: &str, allow_empty: bool) -> EngineResult<()> {
        let mut args = vec!["commit", "-m", message];
        if allow_empty {
            args.push("--allow-empty");
        }
        self.run_checked(&args)?;
        Ok(())
    }

    #[instrument(skip_all, fields(name = %name, start_point = %start_point))]
    fn checkout_new_branch(&self, name: &str, start_point: &str) -> EngineResult<()> {
        debug!("creating and checking out new branch");
        self.run_checked(&["checkout", "-b", name, start_point])?;
        Ok(())
    }

    #[instrument(skip_all, fields(remote = %remote, branch = %branch))]
    fn push(&self, remote: &str, branch: &str) -> EngineResult<()> {
        self.run_checked(&["push", "-u", remote, branch])?;
        Ok(())
    }
}

fn split_nul(out: &str) -> Vec<String> {
    out.split('\0')
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}
