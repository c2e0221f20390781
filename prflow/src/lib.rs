//! Turn uncommitted work into a reviewable pull-request branch.
//!
//! The crate is a git working-tree state engine. It inspects the current
//! branch relationship and working-tree status, classifies the situation
//! into a named scenario, offers that scenario's safe actions, and executes
//! the chosen one so staged and unstaged work lands on a new branch intact.
//!
//! - **[`core`]**: Pure, deterministic logic (classification, action catalog,
//!   branch points, porcelain parsing). No I/O.
//! - **[`io`]**: Side effects behind the [`io::git::GitOps`] trait, the
//!   subprocess runner and configuration.
//!
//! Orchestration modules ([`analyze`], [`execute`], [`workflow`]) coordinate
//! core logic with I/O to implement CLI commands.

pub mod analyze;
pub mod core;
pub mod error;
pub mod execute;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod workflow;

pub use analyze::{analyze_git_state, analyze_in};
pub use crate::core::branch_point::get_branch_point;
pub use crate::core::catalog::actions_for as get_available_actions;
pub use crate::core::classifier::classify as detect_scenario;
pub use error::{EngineError, EngineResult};
pub use execute::execute_state_action;
