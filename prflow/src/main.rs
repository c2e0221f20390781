//! `prflow`: move uncommitted work onto a fresh pull-request branch.
//!
//! `prflow status` shows how the working tree is classified and which actions
//! are safe; `prflow create` runs the chosen (or recommended) action.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use prflow::analyze::analyze_git_state;
use prflow::core::classifier::{self, ScenarioReport};
use prflow::core::types::GitStateSnapshot;
use prflow::exit_codes;
use prflow::io::config::{PrflowConfig, load_repo_config, validate_base_branch};
use prflow::io::git::Git;
use prflow::logging::{self, LogOptions};
use prflow::workflow::{CreateRequest, CreatedBranch, Plan, WorkflowOutcome, create_pr_branch};

#[derive(Parser)]
#[command(
    name = "prflow",
    version,
    about = "Turn uncommitted work into a pull-request branch"
)]
struct Cli {
    /// More diagnostics on stderr (repeatable).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify the working tree and list the actions it allows.
    Status {
        /// Base branch to compare against (overrides `.prflow.toml`).
        #[arg(long)]
        base: Option<String>,

        #[arg(long)]
        json: bool,
    },
    /// Create a PR branch from the current changes.
    Create {
        /// Commit message; also used to derive the branch name.
        description: String,

        /// Branch name to create instead of the derived one.
        #[arg(long)]
        branch: Option<String>,

        /// Catalog key to run instead of the recommended action.
        #[arg(long)]
        action: Option<String>,

        #[arg(long)]
        base: Option<String>,

        /// Push the new branch to origin with upstream tracking.
        #[arg(long)]
        push: bool,

        /// Leave stashed unstaged changes in the stash.
        #[arg(long)]
        no_restore_stash: bool,

        /// Print the plan without touching the repository.
        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(&LogOptions::from_verbosity(cli.verbose, cli.quiet));
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FAILED);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let cwd = std::env::current_dir().context("resolve current directory")?;
    match cli.command {
        Command::Status { base, json } => cmd_status(&cwd, base, json),
        Command::Create {
            description,
            branch,
            action,
            base,
            push,
            no_restore_stash,
            dry_run,
            json,
        } => {
            let (git, config) = open_repo(&cwd, base)?;
            let request = CreateRequest {
                description,
                branch_name: branch,
                action_key: action,
                base_branch: config.base_branch,
                branch_prefix: config.branch_prefix,
                restore_stash: config.restore_stash && !no_restore_stash,
                push: config.push || push,
                dry_run,
            };
            cmd_create(&git, &cwd, &request, json)
        }
    }
}

/// Open the repository around `cwd`, load its config and apply CLI overrides.
fn open_repo(cwd: &Path, base: Option<String>) -> Result<(Git, PrflowConfig)> {
    let git = Git::open(cwd)?;
    let mut config = load_repo_config(git.workdir())?;
    if let Some(base) = base {
        validate_base_branch(&base)?;
        config.base_branch = base;
    }
    let git = git
        .with_timeout(config.git_timeout())
        .with_output_limit(config.git_output_limit_bytes);
    Ok((git, config))
}

#[derive(Serialize)]
struct StatusView<'a> {
    snapshot: &'a GitStateSnapshot,
    #[serde(flatten)]
    report: &'a ScenarioReport,
}

fn cmd_status(cwd: &Path, base: Option<String>, json: bool) -> Result<i32> {
    let (git, config) = open_repo(cwd, base)?;
    let snapshot = analyze_git_state(&git, &config.base_branch, cwd)?;
    let report = classifier::report(&snapshot);
    if json {
        print_json(&StatusView {
            snapshot: &snapshot,
            report: &report,
        })?;
    } else {
        print_snapshot(&snapshot);
        print_report(&report);
    }
    Ok(exit_codes::OK)
}

fn cmd_create(git: &Git, cwd: &Path, request: &CreateRequest, json: bool) -> Result<i32> {
    let outcome = create_pr_branch(git, cwd, request)?;
    let code = outcome_code(&outcome);
    if json {
        print_json(&outcome)?;
        return Ok(code);
    }
    match &outcome {
        WorkflowOutcome::Planned(plan) => print_plan(plan),
        WorkflowOutcome::Cancelled(plan) => {
            println!("scenario: {}", plan.report.scenario);
            println!("cancelled; repository left untouched");
        }
        WorkflowOutcome::Failed { plan, result } => {
            println!("scenario: {}", plan.report.scenario);
            eprintln!("{}: {}", plan.action_key, result.message);
        }
        WorkflowOutcome::Created(created) => print_created(created),
    }
    Ok(code)
}

fn outcome_code(outcome: &WorkflowOutcome) -> i32 {
    match outcome {
        WorkflowOutcome::Planned(_) | WorkflowOutcome::Created(_) => exit_codes::OK,
        WorkflowOutcome::Cancelled(_) => exit_codes::CANCELLED,
        WorkflowOutcome::Failed { .. } => exit_codes::FAILED,
    }
}

fn print_snapshot(snapshot: &GitStateSnapshot) {
    println!(
        "branch: {}",
        snapshot
            .current_branch
            .as_deref()
            .unwrap_or("(detached HEAD)")
    );
    println!("base: origin/{}", snapshot.base_branch);
    println!(
        "relationship: {} ({} local commit(s) ahead)",
        label(&snapshot.commit_relationship),
        snapshot.local_commits_ahead_count
    );
    println!("working tree: {}", label(&snapshot.working_tree_status));
    if !snapshot.staged_files.is_empty() {
        println!("staged: {}", snapshot.staged_files.join(", "));
    }
    if !snapshot.unstaged_files.is_empty() {
        println!("unstaged: {}", snapshot.unstaged_files.join(", "));
    }
    if snapshot.is_inside_pr_worktree {
        println!("linked worktree: yes");
    }
}

fn print_report(report: &ScenarioReport) {
    println!("scenario: {} ({})", report.scenario, report.description);
    println!("actions:");
    for action in &report.actions {
        let marker = if action.key == report.recommended {
            "*"
        } else {
            " "
        };
        println!("  {marker} {:<30} {}", action.key, action.description);
    }
}

fn print_plan(plan: &Plan) {
    print_report(&plan.report);
    println!(
        "would run {} and create {} from {}",
        plan.action_key, plan.branch_name, plan.branch_point
    );
    print_warnings(&plan.warnings);
}

fn print_created(created: &CreatedBranch) {
    println!("scenario: {}", created.plan.report.scenario);
    println!("{}", created.result.message);
    println!(
        "created {} from {}{}",
        created.plan.branch_name,
        created.plan.branch_point,
        if created.committed { "" } else { " (no new commit)" }
    );
    if created.pushed {
        println!("pushed to origin/{}", created.plan.branch_name);
    }
    print_warnings(&created.warnings);
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}

/// Serialized snake_case name of a unit enum value.
fn label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::from("?"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}
