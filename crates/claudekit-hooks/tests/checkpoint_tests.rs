//! `create-checkpoint` against real git repositories.
//!
//! These tests shell out to the git binary the same way the hook does;
//! they skip silently when git is unavailable.

use assert_cmd::Command;
use std::path::Path;
use std::process::Command as StdCommand;

fn git_available() -> bool {
    StdCommand::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn git(repo: &Path, args: &[&str]) -> String {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .unwrap_or_else(|err| panic!("git {args:?} failed to start: {err}"));
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn init_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path();
    git(repo, &["init", "--quiet"]);
    git(repo, &["config", "user.email", "hooks@example.com"]);
    git(repo, &["config", "user.name", "Hooks Test"]);
    std::fs::write(repo.join("file.txt"), "original\n").unwrap();
    git(repo, &["add", "."]);
    git(repo, &["commit", "--quiet", "-m", "initial"]);
    dir
}

fn prefixed_stashes(repo: &Path, prefix: &str) -> Vec<String> {
    let list = git(repo, &["stash", "list", "--format=%gs"]);
    list.lines()
        .filter(|line| line.starts_with(prefix))
        .map(str::to_string)
        .collect()
}

fn run_checkpoint(repo: &Path, home: &Path) -> std::process::Output {
    let payload = serde_json::json!({
        "hook_event_name": "Stop",
        "cwd": repo,
    });
    Command::cargo_bin("claudekit-hooks")
        .unwrap()
        .args(["run", "create-checkpoint"])
        .env("HOME", home)
        .env("NO_COLOR", "1")
        .write_stdin(payload.to_string())
        .output()
        .unwrap()
}

#[test]
fn clean_tree_records_nothing() {
    if !git_available() {
        eprintln!("git unavailable; skipping");
        return;
    }
    let repo = init_repo();
    let home = tempfile::tempdir().unwrap();

    let output = run_checkpoint(repo.path(), home.path());
    assert_eq!(output.status.code(), Some(0));
    assert!(prefixed_stashes(repo.path(), "claude:").is_empty());
}

#[test]
fn dirty_tree_gets_a_checkpoint_without_mutation() {
    if !git_available() {
        eprintln!("git unavailable; skipping");
        return;
    }
    let repo = init_repo();
    let home = tempfile::tempdir().unwrap();
    std::fs::write(repo.path().join("file.txt"), "edited but uncommitted\n").unwrap();

    let status_before = git(repo.path(), &["status", "--porcelain"]);
    let output = run_checkpoint(repo.path(), home.path());
    assert_eq!(output.status.code(), Some(0));

    // The worktree and index are exactly as they were
    let status_after = git(repo.path(), &["status", "--porcelain"]);
    assert_eq!(status_before, status_after);
    assert_eq!(
        std::fs::read_to_string(repo.path().join("file.txt")).unwrap(),
        "edited but uncommitted\n"
    );

    let stashes = prefixed_stashes(repo.path(), "claude:");
    assert_eq!(stashes.len(), 1, "one checkpoint entry: {stashes:?}");
}

#[test]
fn running_twice_appends_one_entry_each_time() {
    if !git_available() {
        eprintln!("git unavailable; skipping");
        return;
    }
    let repo = init_repo();
    let home = tempfile::tempdir().unwrap();
    std::fs::write(repo.path().join("file.txt"), "dirty\n").unwrap();

    assert_eq!(run_checkpoint(repo.path(), home.path()).status.code(), Some(0));
    std::fs::write(repo.path().join("file.txt"), "dirtier\n").unwrap();
    assert_eq!(run_checkpoint(repo.path(), home.path()).status.code(), Some(0));

    assert_eq!(prefixed_stashes(repo.path(), "claude:").len(), 2);
}

#[test]
fn max_checkpoints_prunes_oldest_entries() {
    if !git_available() {
        eprintln!("git unavailable; skipping");
        return;
    }
    let repo = init_repo();
    let home = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(repo.path().join(".claudekit")).unwrap();
    std::fs::write(
        repo.path().join(".claudekit/config.json"),
        r#"{"hooks": {"create-checkpoint": {"prefix": "claude", "maxCheckpoints": 2}}}"#,
    )
    .unwrap();

    // Three prior claude: stashes, oldest first
    for index in 0..3 {
        std::fs::write(
            repo.path().join("file.txt"),
            format!("prior state {index}\n"),
        )
        .unwrap();
        let commit = git(repo.path(), &["stash", "create"]);
        git(
            repo.path(),
            &[
                "stash",
                "store",
                "-m",
                &format!("claude: prior-{index}"),
                commit.trim(),
            ],
        );
    }
    std::fs::write(repo.path().join("file.txt"), "current dirty state\n").unwrap();

    let output = run_checkpoint(repo.path(), home.path());
    assert_eq!(output.status.code(), Some(0));

    let stashes = prefixed_stashes(repo.path(), "claude:");
    assert_eq!(stashes.len(), 2, "capped at maxCheckpoints: {stashes:?}");
    // The survivors are the two newest: the fresh checkpoint plus prior-2
    assert!(stashes[1].contains("prior-2"), "{stashes:?}");
    assert!(!stashes.iter().any(|s| s.contains("prior-0")));
    assert!(!stashes.iter().any(|s| s.contains("prior-1")));

    // Untracked config dir and the dirty file are untouched
    assert_eq!(
        std::fs::read_to_string(repo.path().join("file.txt")).unwrap(),
        "current dirty state\n"
    );
}

#[test]
fn non_repo_soft_skips() {
    if !git_available() {
        eprintln!("git unavailable; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("package.json"), "{}").unwrap();
    let home = tempfile::tempdir().unwrap();

    let output = run_checkpoint(dir.path(), home.path());
    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("not a git repository"));
}
