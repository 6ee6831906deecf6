//! TypeScript validation hooks
//!
//! Both hooks run the project type checker in no-emit mode over the whole
//! project. That is deliberate for `typecheck-changed` too: the compiler
//! cannot correctly check one file in isolation for cross-file errors, so
//! the changed file only *gates* the run, and the check itself is always
//! project-wide.

use crate::hooks::{
    effective_tool, is_typescript_source, run_validator, soft_skip, stop_loop_guard, Hook,
    HookCategory, HookContext, HookDescriptor, HookOutcome,
};
use async_trait::async_trait;
use claudekit_core::constants::limits::TYPECHECK_TIMEOUT_MS;
use claudekit_core::error::Result;
use claudekit_core::HookEvent;

pub static TYPECHECK_CHANGED: HookDescriptor = HookDescriptor {
    id: "typecheck-changed",
    display_name: "TypeScript (changed file)",
    description: "Type-check the project when a TypeScript file changes",
    category: HookCategory::Validation,
    trigger_event: HookEvent::PostToolUse,
    dependencies: &["typescript"],
    default_timeout_ms: TYPECHECK_TIMEOUT_MS,
    default_command: Some("tsc --noEmit"),
};

pub static TYPECHECK_PROJECT: HookDescriptor = HookDescriptor {
    id: "typecheck-project",
    display_name: "TypeScript (project)",
    description: "Type-check the whole project on Stop",
    category: HookCategory::Validation,
    trigger_event: HookEvent::Stop,
    dependencies: &["typescript"],
    default_timeout_ms: TYPECHECK_TIMEOUT_MS,
    default_command: Some("tsc --noEmit"),
};

const FIX_STEPS: &[&str] = &[
    "Fix the type errors listed above",
    "Run the type checker (tsc --noEmit) locally to verify",
];

async fn run_typecheck(ctx: &HookContext) -> Result<HookOutcome> {
    if !ctx.project.is_package() {
        return Ok(soft_skip(ctx, "no package.json here — skipping"));
    }
    let Some(tool) = effective_tool(&ctx.settings, ctx.project.tools.type_checker.as_ref()) else {
        return Ok(soft_skip(ctx, "TypeScript not detected — skipping"));
    };

    let mut args = vec!["--noEmit".to_string()];
    args.extend(ctx.settings.extra_args.iter().cloned());
    run_validator(ctx, &tool, args, "TypeScript validation failed", FIX_STEPS).await
}

/// Type-check after a TypeScript file edit
pub struct TypecheckChangedHook;

#[async_trait]
impl Hook for TypecheckChangedHook {
    fn descriptor(&self) -> &'static HookDescriptor {
        &TYPECHECK_CHANGED
    }

    async fn execute(&self, ctx: &HookContext) -> Result<HookOutcome> {
        let Some(file) = ctx.payload.file_path() else {
            tracing::debug!("no file path in payload; nothing to check");
            return Ok(HookOutcome::allow());
        };
        if !is_typescript_source(&file) {
            tracing::debug!("{} is not a TypeScript source", file.display());
            return Ok(HookOutcome::allow());
        }
        run_typecheck(ctx).await
    }
}

/// Type-check the project when the agent stops
pub struct TypecheckProjectHook;

#[async_trait]
impl Hook for TypecheckProjectHook {
    fn descriptor(&self) -> &'static HookDescriptor {
        &TYPECHECK_PROJECT
    }

    async fn execute(&self, ctx: &HookContext) -> Result<HookOutcome> {
        if let Some(outcome) = stop_loop_guard(ctx) {
            return Ok(outcome);
        }
        run_typecheck(ctx).await
    }
}
