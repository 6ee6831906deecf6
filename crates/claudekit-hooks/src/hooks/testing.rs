//! Test-runner hooks
//!
//! `test-changed` maps a changed source file to its related tests by
//! convention and runs just those; `test-project` prefers the project's
//! own `test` script. Both drive the project's detected runner through
//! argv arrays.

use crate::hooks::{
    effective_tool, is_test_file, run_validator, soft_skip, stop_loop_guard, Hook, HookCategory,
    HookContext, HookDescriptor, HookOutcome,
};
use async_trait::async_trait;
use claudekit_core::constants::limits::TEST_TIMEOUT_MS;
use claudekit_core::error::Result;
use claudekit_core::path::display_relative;
use claudekit_core::project::{walk_files, ProjectContext, WalkOptions};
use claudekit_core::HookEvent;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub static TEST_CHANGED: HookDescriptor = HookDescriptor {
    id: "test-changed",
    display_name: "Tests (changed file)",
    description: "Run the tests related to a changed file",
    category: HookCategory::Testing,
    trigger_event: HookEvent::PostToolUse,
    dependencies: &["jest", "vitest", "mocha"],
    default_timeout_ms: TEST_TIMEOUT_MS,
    default_command: None,
};

pub static TEST_PROJECT: HookDescriptor = HookDescriptor {
    id: "test-project",
    display_name: "Tests (project)",
    description: "Run the project test suite on Stop",
    category: HookCategory::Testing,
    trigger_event: HookEvent::Stop,
    dependencies: &["jest", "vitest", "mocha"],
    default_timeout_ms: TEST_TIMEOUT_MS,
    default_command: None,
};

const FIX_STEPS: &[&str] = &[
    "Read the failing assertions above and fix the code or the test",
    "Re-run the test command locally to confirm",
];

const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mts", "cts", "mjs", "cjs"];

/// Find tests related to `source` by convention: sibling `.test`/`.spec`
/// files, `__tests__/` mirrors, and any test file elsewhere in the
/// project whose name contains the source module name.
pub fn related_tests(project: &ProjectContext, source: &Path) -> Vec<PathBuf> {
    if is_test_file(source) {
        // The changed file is a test: run it directly
        return vec![source.to_path_buf()];
    }

    let Some(stem) = source.file_stem().and_then(|s| s.to_str()) else {
        return Vec::new();
    };
    let mut found: BTreeSet<PathBuf> = BTreeSet::new();

    if let Some(dir) = source.parent() {
        for kind in ["test", "spec"] {
            for ext in SOURCE_EXTENSIONS {
                let sibling = dir.join(format!("{stem}.{kind}.{ext}"));
                if sibling.is_file() {
                    found.insert(sibling);
                }
                let mirrored = dir.join("__tests__").join(format!("{stem}.{kind}.{ext}"));
                if mirrored.is_file() {
                    found.insert(mirrored);
                }
            }
        }
    }

    // Project-wide: any test whose file name contains the module name
    for candidate in walk_files(&project.root, &WalkOptions::default()) {
        if !is_test_file(&candidate) {
            continue;
        }
        let name = candidate
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if name.contains(stem) {
            found.insert(candidate);
        }
    }

    found.into_iter().collect()
}

/// Run tests related to the changed file
pub struct TestChangedHook;

#[async_trait]
impl Hook for TestChangedHook {
    fn descriptor(&self) -> &'static HookDescriptor {
        &TEST_CHANGED
    }

    async fn execute(&self, ctx: &HookContext) -> Result<HookOutcome> {
        let Some(file) = ctx.payload.file_path() else {
            tracing::debug!("no file path in payload; nothing to test");
            return Ok(HookOutcome::allow());
        };
        if !crate::hooks::is_js_or_ts_source(&file) {
            return Ok(HookOutcome::allow());
        }
        let detected = ctx
            .project
            .tools
            .test_runner
            .as_ref()
            .map(|runner| &runner.command);
        let Some(tool) = effective_tool(&ctx.settings, detected) else {
            return Ok(soft_skip(ctx, "no test runner detected — skipping"));
        };

        let related = related_tests(&ctx.project, &file);
        if related.is_empty() {
            return Ok(soft_skip(
                ctx,
                &format!(
                    "no tests related to {} — skipping",
                    display_relative(&file, &ctx.project.root)
                ),
            ));
        }

        let mut args: Vec<String> = ctx
            .project
            .tools
            .test_runner
            .as_ref()
            .map(|runner| runner.kind.run_args().iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        args.extend(
            related
                .iter()
                .map(|path| display_relative(path, &ctx.project.root)),
        );
        args.extend(ctx.settings.extra_args.iter().cloned());

        ctx.reporter
            .progress(&format!("running {} related test file(s)", related.len()));
        run_validator(ctx, &tool, args, "Related tests failed", FIX_STEPS).await
    }
}

/// Run the project test suite
pub struct TestProjectHook;

#[async_trait]
impl Hook for TestProjectHook {
    fn descriptor(&self) -> &'static HookDescriptor {
        &TEST_PROJECT
    }

    async fn execute(&self, ctx: &HookContext) -> Result<HookOutcome> {
        if let Some(outcome) = stop_loop_guard(ctx) {
            return Ok(outcome);
        }

        // Prefer the project's own `test` script through the package manager
        if ctx.settings.command.is_none() && ctx.project.scripts.contains_key("test") {
            if let Some(argv) = ctx.project.package_manager.test_script_argv() {
                let tool = claudekit_core::project::ToolCommand {
                    program: argv[0].clone(),
                    args: argv[1..].to_vec(),
                };
                let args: Vec<String> = ctx.settings.extra_args.clone();
                return run_validator(ctx, &tool, args, "Project tests failed", FIX_STEPS).await;
            }
        }

        let detected = ctx
            .project
            .tools
            .test_runner
            .as_ref()
            .map(|runner| &runner.command);
        let Some(tool) = effective_tool(&ctx.settings, detected) else {
            return Ok(soft_skip(ctx, "no test runner or test script — skipping"));
        };
        let mut args: Vec<String> = ctx
            .project
            .tools
            .test_runner
            .as_ref()
            .map(|runner| runner.kind.run_args().iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        args.extend(ctx.settings.extra_args.iter().cloned());
        run_validator(ctx, &tool, args, "Project tests failed", FIX_STEPS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::test_support::context_for;
    use claudekit_core::ExitCode;
    use serde_json::json;
    use std::fs;

    fn scratch_project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        dir
    }

    #[test]
    fn finds_sibling_and_mirrored_tests() {
        let dir = scratch_project();
        let root = dir.path();
        fs::create_dir_all(root.join("src/__tests__")).unwrap();
        fs::write(root.join("src/math.ts"), "").unwrap();
        fs::write(root.join("src/math.test.ts"), "").unwrap();
        fs::write(root.join("src/__tests__/math.spec.ts"), "").unwrap();
        fs::write(root.join("src/other.test.ts"), "").unwrap();

        let project = ProjectContext::discover(root);
        let related = related_tests(&project, &root.join("src/math.ts"));
        assert_eq!(
            related,
            vec![
                root.join("src/__tests__/math.spec.ts"),
                root.join("src/math.test.ts"),
            ]
        );
    }

    #[test]
    fn finds_tests_by_module_name_anywhere() {
        let dir = scratch_project();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("tests")).unwrap();
        fs::write(root.join("src/parser.ts"), "").unwrap();
        fs::write(root.join("tests/parser.integration.test.ts"), "").unwrap();

        let project = ProjectContext::discover(root);
        let related = related_tests(&project, &root.join("src/parser.ts"));
        assert_eq!(related, vec![root.join("tests/parser.integration.test.ts")]);
    }

    #[test]
    fn changed_test_file_runs_itself() {
        let dir = scratch_project();
        let root = dir.path();
        fs::write(root.join("math.test.ts"), "").unwrap();

        let project = ProjectContext::discover(root);
        let related = related_tests(&project, &root.join("math.test.ts"));
        assert_eq!(related, vec![root.join("math.test.ts")]);
    }

    #[tokio::test]
    async fn no_runner_soft_skips() {
        let dir = scratch_project();
        fs::write(dir.path().join("a.ts"), "").unwrap();
        fs::write(dir.path().join("a.test.ts"), "").unwrap();
        let ctx = context_for(
            &TEST_CHANGED,
            dir.path(),
            json!({
                "hook_event_name": "PostToolUse",
                "tool_input": {"file_path": dir.path().join("a.ts")}
            }),
        );
        let outcome = TestChangedHook.execute(&ctx).await.unwrap();
        assert_eq!(outcome.exit_code, ExitCode::Success);
    }

    #[tokio::test]
    async fn no_related_tests_soft_skips_without_spawning() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"devDependencies": {"jest": "^29"}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("lonely.ts"), "").unwrap();
        let ctx = context_for(
            &TEST_CHANGED,
            dir.path(),
            json!({
                "hook_event_name": "PostToolUse",
                "tool_input": {"file_path": dir.path().join("lonely.ts")}
            }),
        );
        let outcome = TestChangedHook.execute(&ctx).await.unwrap();
        assert_eq!(outcome.exit_code, ExitCode::Success);
    }

    #[tokio::test]
    async fn failing_suite_blocks() {
        let dir = scratch_project();
        fs::write(dir.path().join("a.ts"), "").unwrap();
        fs::write(dir.path().join("a.test.ts"), "").unwrap();
        let mut ctx = context_for(
            &TEST_CHANGED,
            dir.path(),
            json!({
                "hook_event_name": "PostToolUse",
                "tool_input": {"file_path": dir.path().join("a.ts")}
            }),
        );
        ctx.settings.command = Some("false".to_string());
        let outcome = TestChangedHook.execute(&ctx).await.unwrap();
        assert_eq!(outcome.exit_code, ExitCode::Block);
    }

    #[tokio::test]
    async fn project_tests_honor_stop_loop_guard() {
        let dir = scratch_project();
        let ctx = context_for(
            &TEST_PROJECT,
            dir.path(),
            json!({"hook_event_name": "Stop", "stop_hook_active": true}),
        );
        let outcome = TestProjectHook.execute(&ctx).await.unwrap();
        assert_eq!(outcome.exit_code, ExitCode::Success);
    }

    #[tokio::test]
    async fn project_without_tests_soft_skips() {
        let dir = scratch_project();
        let ctx = context_for(
            &TEST_PROJECT,
            dir.path(),
            json!({"hook_event_name": "Stop"}),
        );
        let outcome = TestProjectHook.execute(&ctx).await.unwrap();
        assert_eq!(outcome.exit_code, ExitCode::Success);
    }
}
