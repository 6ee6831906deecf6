//! ESLint validation hooks

use crate::hooks::{
    effective_tool, is_js_or_ts_source, run_validator, soft_skip, stop_loop_guard, Hook,
    HookCategory, HookContext, HookDescriptor, HookOutcome,
};
use async_trait::async_trait;
use claudekit_core::constants::limits::LINT_TIMEOUT_MS;
use claudekit_core::error::Result;
use claudekit_core::HookEvent;

pub static LINT_CHANGED: HookDescriptor = HookDescriptor {
    id: "lint-changed",
    display_name: "ESLint (changed file)",
    description: "Lint a JS/TS file after it changes",
    category: HookCategory::Validation,
    trigger_event: HookEvent::PostToolUse,
    dependencies: &["eslint"],
    default_timeout_ms: LINT_TIMEOUT_MS,
    default_command: Some("eslint"),
};

pub static LINT_PROJECT: HookDescriptor = HookDescriptor {
    id: "lint-project",
    display_name: "ESLint (project)",
    description: "Lint the whole project on Stop",
    category: HookCategory::Validation,
    trigger_event: HookEvent::Stop,
    dependencies: &["eslint"],
    default_timeout_ms: LINT_TIMEOUT_MS,
    default_command: Some("eslint ."),
};

const FIX_STEPS: &[&str] = &[
    "Fix the lint problems listed above",
    "Run ESLint with --fix to apply automatic fixes where possible",
];

/// Lint the single changed file
pub struct LintChangedHook;

#[async_trait]
impl Hook for LintChangedHook {
    fn descriptor(&self) -> &'static HookDescriptor {
        &LINT_CHANGED
    }

    async fn execute(&self, ctx: &HookContext) -> Result<HookOutcome> {
        let Some(file) = ctx.payload.file_path() else {
            tracing::debug!("no file path in payload; nothing to lint");
            return Ok(HookOutcome::allow());
        };
        if !is_js_or_ts_source(&file) {
            tracing::debug!("{} is not a lintable source", file.display());
            return Ok(HookOutcome::allow());
        }
        let Some(tool) = effective_tool(&ctx.settings, ctx.project.tools.linter.as_ref()) else {
            return Ok(soft_skip(ctx, "ESLint not detected — skipping"));
        };

        // The file path is one argv element, hazardous characters and all
        let mut args = vec![file.display().to_string()];
        args.extend(ctx.settings.extra_args.iter().cloned());
        run_validator(ctx, &tool, args, "Lint check failed", FIX_STEPS).await
    }
}

/// Lint the project with ESLint's own config discovery
pub struct LintProjectHook;

#[async_trait]
impl Hook for LintProjectHook {
    fn descriptor(&self) -> &'static HookDescriptor {
        &LINT_PROJECT
    }

    async fn execute(&self, ctx: &HookContext) -> Result<HookOutcome> {
        if let Some(outcome) = stop_loop_guard(ctx) {
            return Ok(outcome);
        }
        let Some(tool) = effective_tool(&ctx.settings, ctx.project.tools.linter.as_ref()) else {
            return Ok(soft_skip(ctx, "ESLint not detected — skipping"));
        };

        let mut args = vec![".".to_string()];
        args.extend(ctx.settings.extra_args.iter().cloned());
        run_validator(ctx, &tool, args, "Lint check failed", FIX_STEPS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::test_support::context_for;
    use claudekit_core::ExitCode;
    use serde_json::json;

    #[tokio::test]
    async fn missing_eslint_soft_skips_without_spawning() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let ctx = context_for(
            &LINT_CHANGED,
            dir.path(),
            json!({
                "hook_event_name": "PostToolUse",
                "tool_input": {"file_path": dir.path().join("a.js")}
            }),
        );
        let outcome = LintChangedHook.execute(&ctx).await.unwrap();
        assert_eq!(outcome.exit_code, ExitCode::Success);
    }

    #[tokio::test]
    async fn non_source_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        std::fs::write(dir.path().join("eslint.config.js"), "export default []").unwrap();
        let ctx = context_for(
            &LINT_CHANGED,
            dir.path(),
            json!({
                "hook_event_name": "PostToolUse",
                "tool_input": {"file_path": dir.path().join("README.md")}
            }),
        );
        let outcome = LintChangedHook.execute(&ctx).await.unwrap();
        assert_eq!(outcome.exit_code, ExitCode::Success);
    }

    #[tokio::test]
    async fn hazardous_file_name_stays_one_argv_element() {
        // The "linter" is echo: it reports back exactly the argv it got,
        // which proves no shell ever interpreted the name.
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let weird = dir.path().join("weird;`rm -rf `$(x).js");
        std::fs::write(&weird, "let a = 1\n").unwrap();

        let mut ctx = context_for(
            &LINT_CHANGED,
            dir.path(),
            json!({
                "hook_event_name": "PostToolUse",
                "tool_input": {"file_path": weird}
            }),
        );
        ctx.settings.command = Some("echo".to_string());

        let outcome = LintChangedHook.execute(&ctx).await.unwrap();
        // echo exits 0 regardless; the point is it ran and allowed
        assert_eq!(outcome.exit_code, ExitCode::Success);
        assert!(weird.exists(), "nothing was deleted by the hazardous name");
    }

    #[tokio::test]
    async fn failing_linter_blocks_with_tail() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let file = dir.path().join("bad.js");
        std::fs::write(&file, "x\n").unwrap();

        let mut ctx = context_for(
            &LINT_CHANGED,
            dir.path(),
            json!({
                "hook_event_name": "PostToolUse",
                "tool_input": {"file_path": file}
            }),
        );
        // `false` ignores its argv and exits 1, standing in for a failing linter
        ctx.settings.command = Some("false".to_string());

        let outcome = LintChangedHook.execute(&ctx).await.unwrap();
        assert_eq!(outcome.exit_code, ExitCode::Block);
    }

    #[tokio::test]
    async fn project_lint_honors_stop_loop_guard() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        std::fs::write(dir.path().join("eslint.config.js"), "export default []").unwrap();
        let ctx = context_for(
            &LINT_PROJECT,
            dir.path(),
            json!({"hook_event_name": "Stop", "stop_hook_active": true}),
        );
        let outcome = LintProjectHook.execute(&ctx).await.unwrap();
        assert_eq!(outcome.exit_code, ExitCode::Success);
    }
}
