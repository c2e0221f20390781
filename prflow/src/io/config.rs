//! prflow configuration stored in `.prflow.toml` at the repository top level.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = ".prflow.toml";

/// prflow configuration (TOML).
///
/// Missing fields default to the values below; CLI flags override them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PrflowConfig {
    /// Branch PRs target, without any `refs/` or remote prefix.
    pub base_branch: String,

    /// Prepended to branch names derived from the description.
    pub branch_prefix: String,

    /// Per-command wall-clock limit for git subprocesses.
    pub git_timeout_secs: u64,

    /// Truncate captured git stdout/stderr beyond this many bytes.
    pub git_output_limit_bytes: usize,

    /// Pop the keep-index stash onto the new branch after committing.
    pub restore_stash: bool,

    /// Push the new branch to `origin` with upstream tracking.
    pub push: bool,
}

impl Default for PrflowConfig {
    fn default() -> Self {
        Self {
            base_branch: "main".to_string(),
            branch_prefix: String::new(),
            git_timeout_secs: 120,
            git_output_limit_bytes: 10 * 1024 * 1024,
            restore_stash: true,
            push: false,
        }
    }
}

impl PrflowConfig {
    pub fn validate(&self) -> Result<()> {
        validate_base_branch(&self.base_branch)?;
        if self.git_timeout_secs == 0 {
            return Err(anyhow!("git_timeout_secs must be > 0"));
        }
        if self.git_output_limit_bytes == 0 {
            return Err(anyhow!("git_output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }
}

/// Base branch must be a plain branch name.
pub fn validate_base_branch(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(anyhow!("base_branch must not be empty"));
    }
    if name.starts_with("refs/") || name.starts_with("origin/") {
        return Err(anyhow!(
            "base_branch must be a branch name without a ref prefix (got '{name}')"
        ));
    }
    Ok(())
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PrflowConfig::default()`.
pub fn load_config(path: &Path) -> Result<PrflowConfig> {
    if !path.exists() {
        let cfg = PrflowConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PrflowConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid {}", path.display()))?;
    Ok(cfg)
}

/// Load `.prflow.toml` from a repository top level.
pub fn load_repo_config(repo_root: &Path) -> Result<PrflowConfig> {
    load_config(&repo_root.join(CONFIG_FILE_NAME))
}
