//! Bounded project file walker
//!
//! Shared by related-test discovery and the codebase map. Depth and entry
//! counts are hard-capped so a pathological tree cannot stall a hook.

use crate::constants::limits::{MAX_WALK_DEPTH, MAX_WALK_ENTRIES};
use std::path::{Path, PathBuf};

/// Directories never descended into
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "out",
    "coverage",
    ".next",
    ".claudekit",
];

/// Walk bounds and filters
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub max_depth: usize,
    pub max_entries: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_WALK_DEPTH,
            max_entries: MAX_WALK_ENTRIES,
        }
    }
}

/// Collect files under `root`, depth-first in sorted order, skipping
/// dependency and build directories. The result is deterministic for a
/// given tree.
pub fn walk_files(root: &Path, options: &WalkOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut visited = 0usize;
    walk_dir(root, 0, options, &mut visited, &mut files);
    files
}

fn walk_dir(
    dir: &Path,
    depth: usize,
    options: &WalkOptions,
    visited: &mut usize,
    files: &mut Vec<PathBuf>,
) {
    if depth > options.max_depth || *visited >= options.max_entries {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    let mut children: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    children.sort();

    for path in children {
        if *visited >= options.max_entries {
            return;
        }
        *visited += 1;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if path.is_dir() {
            if name.starts_with('.') || SKIP_DIRS.contains(&name.as_str()) {
                continue;
            }
            walk_dir(&path, depth + 1, options, visited, files);
        } else if path.is_file() {
            files.push(path);
        }
    }
}
