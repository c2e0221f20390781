//! CLI tests for `prflow status` and `prflow create`.
//!
//! Spawns the prflow binary inside temporary repositories and checks exit
//! codes and output.

use std::process::{Command, Output};

use prflow::exit_codes;
use prflow::test_support::TestRepo;
use serde_json::Value;

fn prflow(repo: &TestRepo, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_prflow"))
        .current_dir(repo.path())
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("run prflow")
}

#[test]
fn status_json_reports_scenario_and_menu() {
    let repo = TestRepo::new().expect("repo");
    repo.write("docs/PLAN.md", "# Plan\n").expect("write");

    let out = prflow(&repo, &["status", "--json"]);
    assert_eq!(out.status.code(), Some(exit_codes::OK));
    let json: Value = serde_json::from_slice(&out.stdout).expect("status json");
    assert_eq!(json["scenario"], "main_unstaged_same");
    assert_eq!(json["recommended"], "commit_all");
    assert_eq!(json["snapshot"]["working_tree_status"], "unstaged_only");
    assert_eq!(json["snapshot"]["unstaged_files"][0], "docs/PLAN.md");
    let keys: Vec<&str> = json["actions"]
        .as_array()
        .expect("actions array")
        .iter()
        .filter_map(|a| a["key"].as_str())
        .collect();
    assert_eq!(keys, vec!["commit_all", "stash_all", "cancel"]);
}

#[test]
fn status_text_marks_recommended_action() {
    let repo = TestRepo::new().expect("repo");
    let out = prflow(&repo, &["status"]);
    assert_eq!(out.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("scenario: main_clean_same"), "{stdout}");
    assert!(stdout.contains("* empty_commit"), "{stdout}");
}

#[test]
fn status_outside_repository_fails() {
    let temp = tempfile::tempdir().expect("tempdir");
    let out = Command::new(env!("CARGO_BIN_EXE_prflow"))
        .current_dir(temp.path())
        .arg("status")
        .output()
        .expect("run prflow");
    assert_eq!(out.status.code(), Some(exit_codes::FAILED));
    assert!(String::from_utf8_lossy(&out.stderr).contains("not a git repository"));
}

#[test]
fn create_cancel_exits_with_cancelled_code() {
    let repo = TestRepo::new().expect("repo");
    repo.write("a.txt", "a\n").expect("write");

    let out = prflow(&repo, &["create", "Anything", "--action", "cancel"]);
    assert_eq!(out.status.code(), Some(exit_codes::CANCELLED));
    assert_eq!(
        repo.run_git(&["status", "--porcelain"]).expect("status"),
        "?? a.txt"
    );
}

#[test]
fn create_with_unavailable_action_fails() {
    let repo = TestRepo::new().expect("repo");
    let out = prflow(&repo, &["create", "Anything", "--action", "commit_all"]);
    assert_eq!(out.status.code(), Some(exit_codes::FAILED));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("commit_all"), "{stderr}");
    assert!(stderr.contains("main_clean_same"), "{stderr}");
}

#[test]
fn create_with_nothing_to_commit_reports_failure() {
    let repo = TestRepo::new().expect("repo");
    repo.run_git(&["checkout", "-b", "feature"]).expect("branch");

    let out = prflow(&repo, &["create", "Nothing"]);
    assert_eq!(out.status.code(), Some(exit_codes::FAILED));
    assert!(String::from_utf8_lossy(&out.stderr).contains("No changes to commit"));
}

#[test]
fn create_dry_run_json_leaves_repository_untouched() {
    let repo = TestRepo::new().expect("repo");
    repo.write("a.txt", "a\n").expect("write");

    let out = prflow(&repo, &["create", "Add A", "--dry-run", "--json"]);
    assert_eq!(out.status.code(), Some(exit_codes::OK));
    let json: Value = serde_json::from_slice(&out.stdout).expect("outcome json");
    assert_eq!(json["outcome"], "planned");
    assert_eq!(json["branch_name"], "add-a");
    assert_eq!(json["branch_point"], "origin/main");
    assert_eq!(
        repo.run_git(&["rev-parse", "--abbrev-ref", "HEAD"]).expect("head"),
        "main"
    );
}

#[test]
fn create_uses_repository_config() {
    let repo = TestRepo::new().expect("repo");
    repo.commit_file(".prflow.toml", "branch_prefix = \"pr/\"\n", "configure prflow")
        .expect("commit config");
    repo.run_git(&["push", "origin", "main"]).expect("push");
    repo.write("a.txt", "a\n").expect("write");

    let out = prflow(&repo, &["create", "Add A"]);
    assert_eq!(
        out.status.code(),
        Some(exit_codes::OK),
        "{}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert_eq!(
        repo.run_git(&["rev-parse", "--abbrev-ref", "HEAD"]).expect("head"),
        "pr/add-a"
    );
    assert_eq!(repo.files_in("HEAD").expect("files"), vec!["a.txt"]);
}

#[test]
fn create_push_sets_upstream() {
    let repo = TestRepo::new().expect("repo");
    repo.write("a.txt", "a\n").expect("write");

    let out = prflow(&repo, &["create", "Push A", "--push"]);
    assert_eq!(out.status.code(), Some(exit_codes::OK));
    assert_eq!(
        repo.run_git(&["rev-parse", "--abbrev-ref", "push-a@{upstream}"])
            .expect("upstream"),
        "origin/push-a"
    );
}
