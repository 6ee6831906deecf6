//! Todo-completion gate
//!
//! Tail-scans the session transcript for the latest TodoWrite record and
//! blocks the stop while items remain unfinished, via the stdout JSON
//! decision protocol rather than exit 2.

use crate::hooks::{stop_loop_guard, Hook, HookCategory, HookContext, HookDescriptor, HookOutcome};
use async_trait::async_trait;
use claudekit_core::constants::limits::DEFAULT_HOOK_TIMEOUT_MS;
use claudekit_core::constants::sizes::TRANSCRIPT_WINDOW_BYTES;
use claudekit_core::error::Result;
use claudekit_core::output::HookResponse;
use claudekit_core::transcript::{latest_todos, TodoItem};
use claudekit_core::HookEvent;

pub static CHECK_TODOS: HookDescriptor = HookDescriptor {
    id: "check-todos",
    display_name: "Todo gate",
    description: "Keep the turn alive while todos are unfinished",
    category: HookCategory::Workflow,
    trigger_event: HookEvent::Stop,
    dependencies: &[],
    default_timeout_ms: DEFAULT_HOOK_TIMEOUT_MS,
    default_command: None,
};

/// Render the block reason, e.g. `1 unfinished todo: Write tests`.
pub fn unfinished_summary(todos: &[TodoItem]) -> Option<String> {
    let unfinished: Vec<&TodoItem> = todos.iter().filter(|t| t.is_unfinished()).collect();
    if unfinished.is_empty() {
        return None;
    }
    let noun = if unfinished.len() == 1 {
        "unfinished todo"
    } else {
        "unfinished todos"
    };
    let names: Vec<&str> = unfinished
        .iter()
        .take(5)
        .map(|t| t.content.as_str())
        .collect();
    let mut listing = names.join(", ");
    if unfinished.len() > names.len() {
        listing.push_str(", …");
    }
    Some(format!("{} {noun}: {listing}", unfinished.len()))
}

/// Gate the stop on todo completion
pub struct CheckTodosHook;

#[async_trait]
impl Hook for CheckTodosHook {
    fn descriptor(&self) -> &'static HookDescriptor {
        &CHECK_TODOS
    }

    async fn execute(&self, ctx: &HookContext) -> Result<HookOutcome> {
        if let Some(outcome) = stop_loop_guard(ctx) {
            return Ok(outcome);
        }
        let Some(transcript) = ctx.payload.transcript() else {
            tracing::debug!("no transcript in payload; nothing to gate on");
            return Ok(HookOutcome::allow());
        };

        let todos = match latest_todos(&transcript, TRANSCRIPT_WINDOW_BYTES) {
            Ok(Some(todos)) => todos,
            Ok(None) => {
                tracing::debug!("no TodoWrite record in transcript window");
                return Ok(HookOutcome::allow());
            }
            Err(err) => {
                tracing::debug!("transcript unreadable: {err}");
                return Ok(HookOutcome::allow());
            }
        };

        match unfinished_summary(&todos) {
            Some(reason) => {
                ctx.reporter.progress(&reason);
                Ok(HookOutcome::respond(HookResponse::block(reason)))
            }
            None => Ok(HookOutcome::allow()),
        }
    }
}
