//! Upward project-root location with per-process memoization

use crate::error::ProjectError;
use crate::project::probe::ProjectContext;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Locates project roots and caches both roots and probed contexts for
/// the life of the process.
///
/// One invocation handles one event, so the caches never need
/// invalidation; they exist because a single dispatch touches the same
/// root several times (locate, probe, config, hook).
#[derive(Default)]
pub struct ProjectLocator {
    roots: DashMap<PathBuf, PathBuf>,
    contexts: DashMap<PathBuf, Arc<ProjectContext>>,
}

impl ProjectLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the project root for `start`: the nearest ancestor containing
    /// a `package.json` file or a `.git` entry. Falls back to the process
    /// working directory when no marker is found.
    ///
    /// # Errors
    ///
    /// [`ProjectError::StartPathUnresolved`] only when `start` itself
    /// cannot be resolved to an existing directory; every resolvable
    /// start yields some root.
    pub fn find_root(&self, start: &Path) -> Result<PathBuf, ProjectError> {
        let dir = resolve_start_dir(start)?;

        if let Some(cached) = self.roots.get(&dir) {
            return Ok(cached.clone());
        }

        let root = dir
            .ancestors()
            .find(|candidate| is_project_root(candidate))
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| dir.clone());

        self.roots.insert(dir, root.clone());
        Ok(root)
    }

    /// Probe (or fetch the cached) project context for a root.
    pub fn context(&self, root: &Path) -> Arc<ProjectContext> {
        if let Some(cached) = self.contexts.get(root) {
            return cached.clone();
        }
        let context = Arc::new(ProjectContext::discover(root));
        self.contexts
            .insert(root.to_path_buf(), context.clone());
        context
    }
}

fn is_project_root(dir: &Path) -> bool {
    dir.join("package.json").is_file() || dir.join(".git").exists()
}

/// Resolve the starting point to an existing directory: the path itself
/// if it is a directory, else its nearest existing ancestor directory.
fn resolve_start_dir(start: &Path) -> Result<PathBuf, ProjectError> {
    let mut candidate = Some(start);
    while let Some(path) = candidate {
        if path.is_dir() {
            return path
                .canonicalize()
                .map(|p| dunce::simplified(&p).to_path_buf())
                .map_err(|_| ProjectError::StartPathUnresolved {
                    path: start.to_path_buf(),
                });
        }
        candidate = path.parent();
    }
    Err(ProjectError::StartPathUnresolved {
        path: start.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_root_by_package_json() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("package.json"), "{}").unwrap();
        std::fs::create_dir_all(root.join("src/deep")).unwrap();

        let locator = ProjectLocator::new();
        let found = locator.find_root(&root.join("src/deep")).unwrap();
        assert_eq!(found, root.canonicalize().unwrap());
    }

    #[test]
    fn finds_root_by_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::create_dir_all(root.join("lib")).unwrap();

        let locator = ProjectLocator::new();
        let found = locator.find_root(&root.join("lib")).unwrap();
        assert_eq!(found, root.canonicalize().unwrap());
    }

    #[test]
    fn missing_file_resolves_through_parent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("package.json"), "{}").unwrap();
        std::fs::create_dir_all(root.join("src")).unwrap();

        // The edited file may not exist yet; its parent chain does
        let locator = ProjectLocator::new();
        let found = locator.find_root(&root.join("src/not-written-yet.ts")).unwrap();
        assert_eq!(found, root.canonicalize().unwrap());
    }

    #[test]
    fn root_lookups_are_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("package.json"), "{}").unwrap();

        let locator = ProjectLocator::new();
        let first = locator.find_root(root).unwrap();
        // Removing the marker does not change the cached answer
        std::fs::remove_file(root.join("package.json")).unwrap();
        let second = locator.find_root(root).unwrap();
        assert_eq!(first, second);
    }
}
