//! Codebase map hook
//!
//! Renders a bounded index of the project for the host to inject as
//! session context, honoring the `codebaseMap` include/exclude globs and
//! format from configuration. Output goes through the
//! `hookSpecificOutput.additionalContext` JSON shape on stdout.

use crate::hooks::{soft_skip, Hook, HookCategory, HookContext, HookDescriptor, HookOutcome};
use async_trait::async_trait;
use claudekit_core::config::{CodebaseMapConfig, MapFormat};
use claudekit_core::constants::limits::{DEFAULT_HOOK_TIMEOUT_MS, MAX_CODEBASE_MAP_ENTRIES};
use claudekit_core::error::Result;
use claudekit_core::hook_events::event_constants;
use claudekit_core::output::HookResponse;
use claudekit_core::path::display_relative;
use claudekit_core::project::{walk_files, WalkOptions};
use claudekit_core::HookEvent;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use std::path::Path;

pub static CODEBASE_MAP: HookDescriptor = HookDescriptor {
    id: "codebase-map",
    display_name: "Codebase map",
    description: "Hand the host a compact index of the project as session context",
    category: HookCategory::Utility,
    trigger_event: HookEvent::SessionStart,
    dependencies: &[],
    default_timeout_ms: DEFAULT_HOOK_TIMEOUT_MS,
    default_command: None,
};

fn build_globset(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(err) => tracing::warn!("ignoring bad codebaseMap glob {pattern:?}: {err}"),
        }
    }
    builder.build().ok()
}

/// Collect the root-relative paths the map should list.
pub fn map_entries(root: &Path, config: &CodebaseMapConfig) -> (Vec<String>, bool) {
    let include = build_globset(&config.include);
    let exclude = build_globset(&config.exclude);

    let mut entries = Vec::new();
    let mut truncated = false;
    for file in walk_files(root, &WalkOptions::default()) {
        let relative = display_relative(&file, root);
        if let Some(include) = &include {
            if !include.is_match(&relative) {
                continue;
            }
        }
        if let Some(exclude) = &exclude {
            if exclude.is_match(&relative) {
                continue;
            }
        }
        if entries.len() >= MAX_CODEBASE_MAP_ENTRIES {
            truncated = true;
            break;
        }
        entries.push(relative);
    }
    (entries, truncated)
}

/// Render entries in the configured format.
pub fn render_map(entries: &[String], format: MapFormat) -> String {
    match format {
        MapFormat::Dsl => entries.join("\n"),
        MapFormat::Tree => render_tree(entries),
    }
}

#[derive(Default)]
struct TreeNode {
    dirs: BTreeMap<String, TreeNode>,
    files: Vec<String>,
}

fn render_tree(entries: &[String]) -> String {
    let mut root = TreeNode::default();
    for entry in entries {
        let mut node = &mut root;
        let components: Vec<&str> = entry.split('/').collect();
        let (file, dirs) = components.split_last().expect("paths are nonempty");
        for dir in dirs {
            node = node.dirs.entry(dir.to_string()).or_default();
        }
        node.files.push(file.to_string());
    }

    let mut out = String::new();
    render_node(&root, 0, &mut out);
    out.trim_end().to_string()
}

fn render_node(node: &TreeNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for (name, child) in &node.dirs {
        out.push_str(&format!("{indent}{name}/\n"));
        render_node(child, depth + 1, out);
    }
    for file in &node.files {
        out.push_str(&format!("{indent}{file}\n"));
    }
}

/// Produce the project map as additional host context
pub struct CodebaseMapHook;

#[async_trait]
impl Hook for CodebaseMapHook {
    fn descriptor(&self) -> &'static HookDescriptor {
        &CODEBASE_MAP
    }

    async fn execute(&self, ctx: &HookContext) -> Result<HookOutcome> {
        if !ctx.project.is_package() && !ctx.project.tools.git {
            return Ok(soft_skip(ctx, "no project here — skipping"));
        }

        let map_config = &ctx.config.codebase_map;
        let (entries, truncated) = map_entries(&ctx.project.root, map_config);
        if entries.is_empty() {
            tracing::debug!("nothing to map under {}", ctx.project.root.display());
            return Ok(HookOutcome::allow());
        }

        let mut context = format!(
            "Codebase map of {} ({} files):\n{}",
            ctx.project.root.display(),
            entries.len(),
            render_map(&entries, map_config.format)
        );
        if truncated {
            context.push_str("\n… (map truncated)");
        }

        // Attribute the context to the event that actually fired; default
        // to SessionStart when invoked ad hoc
        let event_name = match ctx.payload.event() {
            Some(HookEvent::UserPromptSubmit) => event_constants::USER_PROMPT_SUBMIT,
            _ => event_constants::SESSION_START,
        };
        ctx.reporter
            .progress(&format!("mapped {} files", entries.len()));
        Ok(HookOutcome::respond(HookResponse::additional_context(
            event_name, context,
        )))
    }
}
