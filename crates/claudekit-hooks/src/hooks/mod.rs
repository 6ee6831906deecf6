//! Hook base contract, shared helpers, and implementations
//!
//! Every hook is a [`Hook`] with a compile-time [`HookDescriptor`] and an
//! async `execute` over a value-snapshot [`HookContext`]. The registry in
//! [`registry`] is the single place a hook is wired up; dispatch, `list`,
//! and `test` all read from it.

pub mod registry;

mod check_any;
mod checkpoint;
mod codebase_map;
mod lint;
mod testing;
mod todos;
mod typecheck;

use async_trait::async_trait;
use claudekit_core::config::{Config, OnTimeout, ResolvedSettings};
use claudekit_core::error::Result;
use claudekit_core::output::{ErrorBlock, HookResponse, Reporter};
use claudekit_core::payload::HookPayload;
use claudekit_core::process::{ProcessRunner, RunOptions, RunOutput};
use claudekit_core::project::{ProjectContext, ToolCommand};
use claudekit_core::{ExitCode, HookEvent};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Hook category, for listings and setup menus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HookCategory {
    Validation,
    Git,
    Testing,
    Utility,
    Workflow,
}

/// Compile-time metadata for one hook id
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookDescriptor {
    pub id: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub category: HookCategory,
    pub trigger_event: HookEvent,
    /// Tools the hook needs from the project, by name
    pub dependencies: &'static [&'static str],
    pub default_timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_command: Option<&'static str>,
}

/// In-process result of a hook execution
///
/// `exit_code` is the process exit; `response` is the optional single
/// stdout JSON object; `stderr_tail` feeds the session log.
#[derive(Debug)]
pub struct HookOutcome {
    pub exit_code: ExitCode,
    pub response: Option<HookResponse>,
    pub stderr_tail: Option<String>,
}

impl HookOutcome {
    /// Silent allow
    pub fn allow() -> Self {
        Self {
            exit_code: ExitCode::Success,
            response: None,
            stderr_tail: None,
        }
    }

    /// Exit-2 block; the caller has already written the error block
    pub fn block(stderr_tail: impl Into<String>) -> Self {
        Self {
            exit_code: ExitCode::Block,
            response: None,
            stderr_tail: Some(stderr_tail.into()),
        }
    }

    /// Exit-0 with a stdout JSON decision (Stop-class block path)
    pub fn respond(response: HookResponse) -> Self {
        Self {
            exit_code: ExitCode::Success,
            response: Some(response),
            stderr_tail: None,
        }
    }
}

/// Value-snapshot context a hook executes against
///
/// No shared mutable state: each invocation composes one of these and a
/// handler is a straight-line computation over it.
pub struct HookContext {
    pub payload: HookPayload,
    pub project: Arc<ProjectContext>,
    pub config: Config,
    pub settings: ResolvedSettings,
    pub runner: ProcessRunner,
    pub reporter: Reporter,
}

impl HookContext {
    /// Standard run options for a child in this hook's project
    pub fn run_options(&self) -> RunOptions {
        RunOptions::new(self.project.root.clone(), self.settings.timeout)
    }
}

/// The contract every hook implements
#[async_trait]
pub trait Hook: Send + Sync {
    /// Static descriptor; the registry owns the authoritative copy
    fn descriptor(&self) -> &'static HookDescriptor;

    /// Execute against the composed context
    async fn execute(&self, ctx: &HookContext) -> Result<HookOutcome>;
}

// ===== Shared helpers used across hook implementations =====

/// Soft-skip: diagnostic on stderr, exit 0. Used whenever a prerequisite
/// (file, tool, project) is absent; a missing tool never blocks.
pub(crate) fn soft_skip(ctx: &HookContext, message: &str) -> HookOutcome {
    ctx.reporter.progress(message);
    HookOutcome::allow()
}

/// Stop-class loop guard: when the host says a stop hook already fired
/// this turn, do nothing so a block cannot loop forever.
pub(crate) fn stop_loop_guard(ctx: &HookContext) -> Option<HookOutcome> {
    if ctx.payload.stop_hook_active() {
        return Some(HookOutcome::allow());
    }
    None
}

/// The tool a hook should invoke: the config `command` override when set
/// (split on whitespace into discrete argv elements, never a shell), else
/// the probed recipe.
pub(crate) fn effective_tool(
    settings: &ResolvedSettings,
    detected: Option<&ToolCommand>,
) -> Option<ToolCommand> {
    if let Some(command) = settings.command.as_deref() {
        let mut parts = command.split_whitespace();
        let program = parts.next()?.to_string();
        return Some(ToolCommand {
            program,
            args: parts.map(str::to_string).collect(),
        });
    }
    detected.cloned()
}

/// Run a validator tool and translate its result into the hook contract:
/// spawn failure → soft-skip, timeout → block or skip per `onTimeout`,
/// non-zero → exit-2 block carrying the tool's diagnostic tail.
pub(crate) async fn run_validator(
    ctx: &HookContext,
    tool: &ToolCommand,
    extra: Vec<String>,
    title: &str,
    fix_steps: &[&str],
) -> Result<HookOutcome> {
    let (program, args) = tool.argv(extra);
    let output = match ctx.runner.run(&program, &args, &ctx.run_options()).await {
        Ok(output) => output,
        Err(err) => {
            ctx.reporter
                .progress(&format!("could not start {program} ({err}) — skipping"));
            return Ok(HookOutcome::allow());
        }
    };

    if output.timed_out {
        return Ok(validator_timeout(ctx, title));
    }
    if output.success() {
        return Ok(HookOutcome::allow());
    }

    let tail = output.diagnostic_tail(4_000);
    let mut block = ErrorBlock::new(title, tail.clone());
    for step in fix_steps {
        block = block.fix(*step);
    }
    ctx.reporter.error_block(&block);
    Ok(HookOutcome::block(tail))
}

fn validator_timeout(ctx: &HookContext, title: &str) -> HookOutcome {
    let timeout_ms = ctx.settings.timeout.as_millis();
    match ctx.settings.on_timeout {
        OnTimeout::Block => {
            let block = ErrorBlock::new(
                format!("{title} (timed out)"),
                format!("The tool did not finish within {timeout_ms}ms."),
            )
            .fix("Re-run the tool manually to see how long it takes")
            .fix(format!(
                "Raise the timeout for {} in .claudekit/config.json, or set \"onTimeout\": \"skip\"",
                ctx.reporter.hook_id()
            ));
            ctx.reporter.error_block(&block);
            HookOutcome::block(format!("timed out after {timeout_ms}ms"))
        }
        OnTimeout::Skip => soft_skip(
            ctx,
            &format!("timed out after {timeout_ms}ms — skipping (onTimeout: skip)"),
        ),
    }
}

/// Keep the returned output's diagnostics out of the happy path; used by
/// hooks that inspect the output themselves.
pub(crate) async fn run_quiet(
    ctx: &HookContext,
    program: &str,
    args: &[String],
) -> Option<RunOutput> {
    match ctx.runner.run(program, args, &ctx.run_options()).await {
        Ok(output) => Some(output),
        Err(err) => {
            tracing::debug!("{program} failed to start: {err}");
            None
        }
    }
}

// File-kind classification shared by the changed-file validators

pub(crate) fn extension(path: &Path) -> &str {
    path.extension().and_then(|ext| ext.to_str()).unwrap_or("")
}

/// Files the type checker and `any` scanner care about
pub(crate) fn is_typescript_source(path: &Path) -> bool {
    matches!(extension(path), "ts" | "tsx" | "mts" | "cts")
}

/// Files the linter cares about
pub(crate) fn is_js_or_ts_source(path: &Path) -> bool {
    matches!(
        extension(path),
        "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" | "mts" | "cts"
    )
}

/// Test files by naming convention
pub(crate) fn is_test_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    name.contains(".test.")
        || name.contains(".spec.")
        || path
            .components()
            .any(|component| component.as_os_str() == "__tests__")
}
