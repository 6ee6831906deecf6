//! Exit-code contract of the `run` subcommand: 0 allow, 2 block,
//! 1 internal error, 64 unknown hook.

use assert_cmd::Command;

fn scratch_home() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

#[test]
fn allow_is_zero() {
    let home = scratch_home();
    let input = serde_json::json!({
        "hook_event_name": "Stop",
        "session_id": "exit-code-test",
    });
    Command::cargo_bin("claudekit-hooks")
        .unwrap()
        .args(["run", "check-todos"])
        .env("HOME", home.path())
        .write_stdin(input.to_string())
        .assert()
        .code(0);
}

#[test]
fn block_is_two() {
    let home = scratch_home();
    let project = tempfile::tempdir().unwrap();
    std::fs::write(project.path().join("package.json"), "{}").unwrap();
    let file = project.path().join("bad.ts");
    std::fs::write(&file, "let x: any;\n").unwrap();

    let input = serde_json::json!({
        "hook_event_name": "PostToolUse",
        "tool_name": "Edit",
        "tool_input": {"file_path": file},
    });
    Command::cargo_bin("claudekit-hooks")
        .unwrap()
        .args(["run", "check-any-changed"])
        .env("HOME", home.path())
        .write_stdin(input.to_string())
        .assert()
        .code(2);
}

#[test]
fn internal_error_is_one() {
    // An explicitly named --config override that cannot be used is
    // fatal, unlike the discovered layers which degrade to defaults
    let home = scratch_home();
    Command::cargo_bin("claudekit-hooks")
        .unwrap()
        .args(["run", "check-todos", "--config", "/nowhere/claudekit.json"])
        .env("HOME", home.path())
        .write_stdin(r#"{"hook_event_name":"Stop"}"#)
        .assert()
        .code(1);

    let broken = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(broken.path(), "{not json").unwrap();
    Command::cargo_bin("claudekit-hooks")
        .unwrap()
        .args(["run", "check-todos", "--config"])
        .arg(broken.path())
        .env("HOME", home.path())
        .write_stdin(r#"{"hook_event_name":"Stop"}"#)
        .assert()
        .code(1);
}

#[test]
fn unknown_hook_is_sixty_four() {
    Command::cargo_bin("claudekit-hooks")
        .unwrap()
        .args(["run", "not-a-hook"])
        .write_stdin("{}")
        .assert()
        .code(64);
}

#[test]
fn soft_skip_paths_are_zero_not_two() {
    // Missing tool, missing payload path, missing transcript: all allow
    let home = scratch_home();
    let project = tempfile::tempdir().unwrap();
    std::fs::write(project.path().join("package.json"), "{}").unwrap();

    for (hook, input) in [
        (
            "lint-changed",
            serde_json::json!({
                "hook_event_name": "PostToolUse",
                "tool_input": {"file_path": project.path().join("a.js")},
            }),
        ),
        (
            "typecheck-changed",
            serde_json::json!({
                "hook_event_name": "PostToolUse",
                "tool_input": {"command": "ls"},
            }),
        ),
        (
            "check-todos",
            serde_json::json!({
                "hook_event_name": "Stop",
                "transcript_path": "/nowhere/t.jsonl",
            }),
        ),
        (
            "create-checkpoint",
            serde_json::json!({
                "hook_event_name": "Stop",
                "cwd": project.path(),
            }),
        ),
    ] {
        Command::cargo_bin("claudekit-hooks")
            .unwrap()
            .args(["run", hook])
            .env("HOME", home.path())
            .write_stdin(input.to_string())
            .assert()
            .code(0);
    }
}
