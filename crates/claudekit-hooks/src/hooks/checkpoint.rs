//! Git checkpoint hook
//!
//! Snapshots a dirty working tree as a named stash entry without touching
//! the index or the worktree: `git stash create` produces the commit,
//! `git stash store` registers it. Entries beyond `maxCheckpoints` are
//! pruned oldest-first by re-scanning stash messages between drops, so a
//! concurrent invocation removing the same entry is harmless. `stash pop`
//! is never used.

use crate::hooks::{run_quiet, soft_skip, Hook, HookCategory, HookContext, HookDescriptor, HookOutcome};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use claudekit_core::constants::limits::{CHECKPOINT_TIMEOUT_MS, MAX_CHECKPOINT_PRUNE_PASSES};
use claudekit_core::error::Result;
use claudekit_core::process::RunOutput;
use claudekit_core::HookEvent;

pub static CREATE_CHECKPOINT: HookDescriptor = HookDescriptor {
    id: "create-checkpoint",
    display_name: "Checkpoint",
    description: "Snapshot a dirty working tree as a named stash entry",
    category: HookCategory::Git,
    trigger_event: HookEvent::Stop,
    dependencies: &["git"],
    default_timeout_ms: CHECKPOINT_TIMEOUT_MS,
    default_command: None,
};

/// Record a checkpoint stash on Stop/SubagentStop
pub struct CreateCheckpointHook;

impl CreateCheckpointHook {
    async fn git(&self, ctx: &HookContext, args: &[&str]) -> Option<RunOutput> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let output = run_quiet(ctx, "git", &args).await?;
        if output.timed_out {
            ctx.reporter.progress(&format!(
                "git {} timed out — skipping checkpoint",
                args.first().map(String::as_str).unwrap_or("")
            ));
            return None;
        }
        Some(output)
    }

    /// Drop prefixed entries beyond the cap, oldest first. The stash list
    /// is re-read between drops because refs renumber after every drop
    /// and another invocation may be pruning concurrently; a drop that
    /// fails because the entry is already gone is swallowed.
    async fn prune(&self, ctx: &HookContext) {
        let prefix = format!("{}:", ctx.settings.prefix);
        for _ in 0..MAX_CHECKPOINT_PRUNE_PASSES {
            let Some(list) = self
                .git(ctx, &["stash", "list", "--format=%gd%x09%gs"])
                .await
            else {
                return;
            };
            if !list.success() {
                return;
            }

            // Newest first, as git prints them
            let prefixed: Vec<(String, String)> = list
                .stdout
                .lines()
                .filter_map(|line| {
                    let (reference, message) = line.split_once('\t')?;
                    message
                        .starts_with(&prefix)
                        .then(|| (reference.to_string(), message.to_string()))
                })
                .collect();
            if prefixed.len() <= ctx.settings.max_checkpoints {
                return;
            }

            let (oldest_ref, oldest_message) = prefixed.last().expect("nonempty beyond cap");
            match self.git(ctx, &["stash", "drop", oldest_ref]).await {
                Some(drop) if drop.success() => {
                    tracing::debug!("dropped checkpoint {oldest_message}");
                }
                _ => {
                    // Already removed by a concurrent run, or git balked;
                    // the next pass re-reads the truth
                    tracing::debug!("drop of {oldest_ref} did not apply");
                }
            }
        }
    }
}

#[async_trait]
impl Hook for CreateCheckpointHook {
    fn descriptor(&self) -> &'static HookDescriptor {
        &CREATE_CHECKPOINT
    }

    async fn execute(&self, ctx: &HookContext) -> Result<HookOutcome> {
        if !ctx.project.tools.git {
            return Ok(soft_skip(ctx, "not a git repository — skipping"));
        }

        let Some(status) = self.git(ctx, &["status", "--porcelain"]).await else {
            return Ok(HookOutcome::allow());
        };
        if !status.success() {
            ctx.reporter
                .progress("git status failed — skipping checkpoint");
            return Ok(HookOutcome::allow());
        }
        if status.stdout.trim().is_empty() {
            tracing::debug!("working tree clean; no checkpoint needed");
            return Ok(HookOutcome::allow());
        }

        // `stash create` writes the snapshot commit without touching the
        // index or worktree
        let Some(create) = self.git(ctx, &["stash", "create"]).await else {
            return Ok(HookOutcome::allow());
        };
        let commit = create.stdout.trim().to_string();
        if !create.success() || commit.is_empty() {
            ctx.reporter
                .progress("nothing stashable — skipping checkpoint");
            return Ok(HookOutcome::allow());
        }

        let message = format!(
            "{}: {}",
            ctx.settings.prefix,
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        let Some(store) = self
            .git(ctx, &["stash", "store", "-m", &message, &commit])
            .await
        else {
            return Ok(HookOutcome::allow());
        };
        if !store.success() {
            ctx.reporter.progress(&format!(
                "could not store checkpoint: {}",
                store.diagnostic_tail(200)
            ));
            return Ok(HookOutcome::allow());
        }

        self.prune(ctx).await;
        ctx.reporter.progress(&format!("checkpoint recorded ({message})"));
        Ok(HookOutcome::allow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::test_support::context_for;
    use claudekit_core::ExitCode;
    use serde_json::json;

    #[tokio::test]
    async fn outside_git_soft_skips() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let ctx = context_for(
            &CREATE_CHECKPOINT,
            dir.path(),
            json!({"hook_event_name": "Stop"}),
        );
        let outcome = CreateCheckpointHook.execute(&ctx).await.unwrap();
        assert_eq!(outcome.exit_code, ExitCode::Success);
        assert!(outcome.response.is_none());
    }
}
