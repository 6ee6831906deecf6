//! Subcommand dispatch
//!
//! One invocation is a straight line: decode → locate → probe → config →
//! execute → format → exit. The dispatcher also converts anything a
//! handler throws into a formatted crash block with exit 2, so a broken
//! hook can never silently pass.

use crate::hooks::registry::{all_hooks, find_hook, render_hook_listing, Registration};
use crate::hooks::{HookContext, HookOutcome};
use crate::io::StdinProcessor;
use claudekit_core::config::{set_hook_enabled, Config, ConfigLoader};
use claudekit_core::constants::limits::DISPATCH_GRACE_MS;
use claudekit_core::output::{ErrorBlock, Reporter};
use claudekit_core::payload::HookPayload;
use claudekit_core::process::ProcessRunner;
use claudekit_core::session::{self, EventRecord, SessionStats, SessionStore};
use claudekit_core::{ClaudekitError, ExitCode, ProjectLocator};
use chrono::Utc;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// True when `CLAUDEKIT_SKIP_HOOKS` asks for a no-op `run`.
fn skip_hooks_requested() -> bool {
    std::env::var("CLAUDEKIT_SKIP_HOOKS")
        .map(|value| {
            let value = value.trim().to_ascii_lowercase();
            matches!(value.as_str(), "1" | "true" | "yes" | "on")
        })
        .unwrap_or(false)
}

/// Command dispatcher over the hook registry
pub struct Dispatcher {
    locator: ProjectLocator,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            locator: ProjectLocator::new(),
        }
    }

    /// `run <hook-id>`: the host entry point.
    pub async fn run(
        &self,
        hook_id: &str,
        config_path: Option<PathBuf>,
        timeout_ms: Option<u64>,
    ) -> i32 {
        if skip_hooks_requested() {
            tracing::debug!("CLAUDEKIT_SKIP_HOOKS set; doing nothing");
            return ExitCode::Success.as_i32();
        }
        let Some(registration) = find_hook(hook_id) else {
            return unknown_hook(hook_id);
        };

        let decoded = StdinProcessor::new().read_payload().await;
        self.execute(registration, decoded.payload, config_path, timeout_ms)
            .await
    }

    /// `test <hook-id>`: same pipeline over a synthesized payload.
    pub async fn test(&self, hook_id: &str, file: Option<PathBuf>) -> i32 {
        let Some(registration) = find_hook(hook_id) else {
            return unknown_hook(hook_id);
        };
        let payload = synthesize_payload(registration, file);
        let code = self.execute(registration, payload, None, None).await;
        eprintln!("[{hook_id}] test run finished with exit code {code}");
        code
    }

    /// The shared decode-to-exit pipeline.
    async fn execute(
        &self,
        registration: &'static Registration,
        payload: HookPayload,
        config_path: Option<PathBuf>,
        timeout_ms: Option<u64>,
    ) -> i32 {
        let hook_id = registration.descriptor.id;
        let started = Instant::now();

        let start_dir = payload
            .discovery_start()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let root = match self.locator.find_root(&start_dir) {
            Ok(root) => root,
            Err(err) => {
                // RootNotFound is a soft-skip, never a block
                tracing::warn!("cannot resolve a project for {hook_id}: {err}; allowing");
                return ExitCode::Success.as_i32();
            }
        };
        let project = self.locator.context(&root);

        let loader = match config_path {
            // An explicit override the operator named must be usable;
            // this is the one pre-handler failure that exits 1
            Some(path) => match ConfigLoader::with_required_project_file(path) {
                Ok(loader) => loader,
                Err(err) => {
                    let err = ClaudekitError::from(err);
                    eprintln!("{err}");
                    return ExitCode::from(&err).as_i32();
                }
            },
            None => ConfigLoader::new(&root),
        };
        let config: Config = loader.load().clone();
        let mut settings = config.settings(hook_id, registration.descriptor.default_timeout_ms);
        if let Some(ms) = timeout_ms {
            settings.timeout = Duration::from_millis(ms);
        }
        if !settings.enabled {
            tracing::debug!("{hook_id} disabled by configuration");
            return ExitCode::Success.as_i32();
        }

        let session_id = payload.session_id.clone();
        let event_name = if payload.hook_event_name.is_empty() {
            "(none)".to_string()
        } else {
            payload.hook_event_name.clone()
        };

        let reporter = Reporter::new(hook_id);
        let guard = settings.timeout + Duration::from_millis(DISPATCH_GRACE_MS);
        let ctx = HookContext {
            payload,
            project,
            config,
            settings,
            runner: ProcessRunner::new(),
            reporter: reporter.clone(),
        };

        let handler = registration.handler();
        let outcome = match tokio::time::timeout(guard, handler.execute(&ctx)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => crashed(&reporter, &err.to_string()),
            Err(_) => crashed(
                &reporter,
                &format!("handler hung beyond {}ms", guard.as_millis()),
            ),
        };

        if let Some(response) = &outcome.response {
            // The single stdout line of the invocation
            println!("{}", response.to_json_line());
        }

        if let Some(store) = SessionStore::for_session(session_id.as_deref()) {
            store.record(&EventRecord {
                ts: Utc::now(),
                hook_id: hook_id.to_string(),
                event: event_name,
                root: root.display().to_string(),
                duration_ms: started.elapsed().as_millis() as u64,
                exit_code: outcome.exit_code.as_i32(),
                stderr_tail: outcome.stderr_tail.clone().unwrap_or_default(),
            });
        }

        outcome.exit_code.as_i32()
    }

    /// `list [--json]`
    pub fn list(&self, json: bool) -> i32 {
        if json {
            let descriptors: Vec<_> = all_hooks()
                .iter()
                .map(|registration| registration.descriptor)
                .collect();
            match serde_json::to_string_pretty(&descriptors) {
                Ok(rendered) => println!("{rendered}"),
                Err(err) => {
                    eprintln!("cannot render descriptors: {err}");
                    return ExitCode::InternalError.as_i32();
                }
            }
        } else {
            for registration in all_hooks() {
                let descriptor = registration.descriptor;
                println!(
                    "{:<18} {:<11} {:<15} {}",
                    descriptor.id,
                    format!("{:?}", descriptor.category).to_lowercase(),
                    descriptor.trigger_event,
                    descriptor.description
                );
            }
        }
        ExitCode::Success.as_i32()
    }

    /// `stats [--session <id>]`
    pub fn stats(&self, session: Option<String>) -> i32 {
        let Some(logs_root) = session::logs_root() else {
            eprintln!("no home directory; nothing recorded");
            return ExitCode::InternalError.as_i32();
        };

        let mut aggregate = SessionStats::default();
        let mut sessions = 0usize;
        match session {
            Some(id) => {
                let dir = logs_root.join(session::sanitize_session_id(Some(&id)));
                match session::load_stats(&dir) {
                    Some(stats) => {
                        aggregate.merge(&stats);
                        sessions = 1;
                    }
                    None => {
                        eprintln!("no stats recorded for session {id}");
                        return ExitCode::Success.as_i32();
                    }
                }
            }
            None => {
                if let Ok(entries) = std::fs::read_dir(&logs_root) {
                    for entry in entries.flatten() {
                        if let Some(stats) = session::load_stats(&entry.path()) {
                            aggregate.merge(&stats);
                            sessions += 1;
                        }
                    }
                }
            }
        }

        println!(
            "{} session(s), {} invocation(s), {} blocked",
            sessions, aggregate.total_invocations, aggregate.blocked
        );
        let mut hooks: Vec<_> = aggregate.hooks.iter().collect();
        hooks.sort_by(|left, right| left.0.cmp(right.0));
        for (id, stats) in hooks {
            println!(
                "  {:<18} {:>6} runs  {:>4} blocked  {:>8.1}ms mean",
                id, stats.count, stats.blocked, stats.mean_duration_ms
            );
        }
        ExitCode::Success.as_i32()
    }

    /// `enable <hook-id>` / `disable <hook-id>`
    pub fn set_enabled(&self, hook_id: &str, enabled: bool) -> i32 {
        if find_hook(hook_id).is_none() {
            return unknown_hook(hook_id);
        }
        let start = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let root = match self.locator.find_root(&start) {
            Ok(root) => root,
            Err(err) => {
                eprintln!("cannot locate a project here: {err}");
                return ExitCode::InternalError.as_i32();
            }
        };
        match set_hook_enabled(&root, hook_id, enabled) {
            Ok(path) => {
                let verb = if enabled { "Enabled" } else { "Disabled" };
                println!("{verb} {hook_id} in {}", path.display());
                ExitCode::Success.as_i32()
            }
            Err(err) => {
                eprintln!("cannot update config: {err}");
                ExitCode::InternalError.as_i32()
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown_hook(hook_id: &str) -> i32 {
    eprintln!("Unknown hook: {hook_id}\n");
    eprint!("{}", render_hook_listing());
    ExitCode::UnknownHook.as_i32()
}

/// A crashing handler blocks with a formatted summary; the detail has
/// already gone to the trace log.
fn crashed(reporter: &Reporter, detail: &str) -> HookOutcome {
    tracing::error!("hook crashed: {detail}");
    let block = ErrorBlock::new("Hook crashed", detail.to_string())
        .fix("Re-run with CLAUDEKIT_DEBUG=1 to capture a verbose trace")
        .fix("Disable the hook (claudekit-hooks disable <id>) if the crash persists");
    reporter.error_block(&block);
    HookOutcome::block(format!("crashed: {detail}"))
}

/// Synthesized payloads for `test <hook-id>`.
fn synthesize_payload(registration: &Registration, file: Option<PathBuf>) -> HookPayload {
    use claudekit_core::hook_events::event_constants;
    use claudekit_core::HookEvent;

    let session_id = format!("test-{}", uuid::Uuid::new_v4());
    let cwd = std::env::current_dir().ok();
    match registration.descriptor.trigger_event {
        HookEvent::PreToolUse | HookEvent::PostToolUse => {
            let file = file.unwrap_or_else(|| PathBuf::from("src/index.ts"));
            serde_json::from_value(serde_json::json!({
                "hook_event_name": event_constants::POST_TOOL_USE,
                "session_id": session_id,
                "cwd": cwd,
                "tool_name": "Edit",
                "tool_input": {"file_path": file},
            }))
            .unwrap_or_default()
        }
        HookEvent::SessionStart => serde_json::from_value(serde_json::json!({
            "hook_event_name": event_constants::SESSION_START,
            "session_id": session_id,
            "cwd": cwd,
            "source": "startup",
        }))
        .unwrap_or_default(),
        _ => serde_json::from_value(serde_json::json!({
            "hook_event_name": event_constants::STOP,
            "session_id": session_id,
            "cwd": cwd,
            "stop_hook_active": false,
        }))
        .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::registry::find_hook;

    #[test]
    fn skip_hooks_parsing() {
        // Env-var driven; exercised indirectly through the helper's
        // truth table on raw strings
        for truthy in ["1", "true", "YES", " on "] {
            let value = truthy.trim().to_ascii_lowercase();
            assert!(matches!(value.as_str(), "1" | "true" | "yes" | "on"));
        }
        for falsy in ["0", "false", "", "off"] {
            let value = falsy.trim().to_ascii_lowercase();
            assert!(!matches!(value.as_str(), "1" | "true" | "yes" | "on"));
        }
    }

    #[test]
    fn synthesized_payload_matches_trigger() {
        let post = find_hook("lint-changed").unwrap();
        let payload = synthesize_payload(post, Some(PathBuf::from("/tmp/x.ts")));
        assert_eq!(payload.hook_event_name, "PostToolUse");
        assert!(payload.file_path().is_some());

        let stop = find_hook("check-todos").unwrap();
        let payload = synthesize_payload(stop, None);
        assert_eq!(payload.hook_event_name, "Stop");
        assert_eq!(payload.stop_hook_active, Some(false));

        let start = find_hook("codebase-map").unwrap();
        let payload = synthesize_payload(start, None);
        assert_eq!(payload.hook_event_name, "SessionStart");
    }

    #[tokio::test]
    async fn run_rejects_unknown_hook_with_64() {
        let dispatcher = Dispatcher::new();
        let code = dispatcher.test("no-such-hook", None).await;
        assert_eq!(code, 64);
    }
}
