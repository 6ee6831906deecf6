//! Path normalization and confinement utilities
//!
//! Every path derived from user-controlled input (payload, transcript,
//! config) passes through here before any file I/O. Normalization is
//! purely lexical and never requires the path to exist; confinement
//! checks prefer canonical paths when the filesystem cooperates.

use path_clean::PathClean;
use std::path::{Path, PathBuf};

/// Normalize a user-supplied path string into an absolute, cleaned path.
///
/// Handles, in order: `file://` URLs (including `file://localhost/...`),
/// `~` expansion, resolution of relative paths against `base` (falling
/// back to the process working directory), lexical cleaning of `.`/`..`
/// segments, and Windows UNC simplification via `dunce`.
///
/// Shell metacharacters in the input are preserved as literal bytes; the
/// result is only ever passed to child processes as a discrete argv
/// element.
///
/// # Examples
///
/// ```
/// use claudekit_core::path::normalize_user_path;
/// use std::path::Path;
///
/// let p = normalize_user_path("file:///proj/src/a.ts", None);
/// assert_eq!(p, Path::new("/proj/src/a.ts"));
///
/// let p = normalize_user_path("src/../src/a.ts", Some(Path::new("/proj")));
/// assert_eq!(p, Path::new("/proj/src/a.ts"));
/// ```
pub fn normalize_user_path(raw: &str, base: Option<&Path>) -> PathBuf {
    let stripped = strip_file_url(raw);
    let expanded = expand_tilde(stripped);

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let base = base
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        base.join(expanded)
    };

    dunce::simplified(&absolute.clean()).to_path_buf()
}

/// Strip a `file://` URL scheme, leaving a plain filesystem path.
///
/// Percent-encoded spaces are decoded; other escapes pass through
/// untouched (hosts emit plain paths in practice).
fn strip_file_url(raw: &str) -> String {
    let rest = if let Some(rest) = raw.strip_prefix("file://localhost/") {
        format!("/{rest}")
    } else if let Some(rest) = raw.strip_prefix("file://") {
        rest.to_string()
    } else {
        return raw.to_string();
    };
    rest.replace("%20", " ")
}

/// Expand a leading `~` or `~/` to the user's home directory.
///
/// A bare `~user` form is left untouched; the engine has no business
/// resolving other users' homes.
pub fn expand_tilde(raw: String) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

/// Check whether `path` is confined within `root`.
///
/// Both sides are canonicalized when possible so symlinks cannot escape
/// the check; when canonicalization fails (path does not exist yet) the
/// comparison falls back to the lexically cleaned forms.
pub fn is_within(path: &Path, root: &Path) -> bool {
    let path = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf().clean());
    let root = root
        .canonicalize()
        .unwrap_or_else(|_| root.to_path_buf().clean());
    path.starts_with(&root)
}

/// Render a path relative to `root` when possible, for display.
pub fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_url_is_stripped() {
        assert_eq!(
            normalize_user_path("file:///proj/a.ts", None),
            Path::new("/proj/a.ts")
        );
        assert_eq!(
            normalize_user_path("file://localhost/proj/a.ts", None),
            Path::new("/proj/a.ts")
        );
    }

    #[test]
    fn file_url_decodes_spaces() {
        assert_eq!(
            normalize_user_path("file:///proj/with%20space.ts", None),
            Path::new("/proj/with space.ts")
        );
    }

    #[test]
    fn relative_resolves_against_base() {
        assert_eq!(
            normalize_user_path("src/a.ts", Some(Path::new("/proj"))),
            Path::new("/proj/src/a.ts")
        );
    }

    #[test]
    fn dot_segments_are_cleaned() {
        assert_eq!(
            normalize_user_path("/proj/src/../lib/./b.ts", None),
            Path::new("/proj/lib/b.ts")
        );
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(normalize_user_path("~/x.ts", None), home.join("x.ts"));
    }

    #[test]
    fn shell_metacharacters_survive_normalization() {
        let p = normalize_user_path("/proj/src/weird;`rm -rf `$(x).ts", None);
        assert_eq!(p, Path::new("/proj/src/weird;`rm -rf `$(x).ts"));
    }

    #[test]
    fn confinement_is_lexical_for_missing_paths() {
        assert!(is_within(
            Path::new("/proj/src/../src/a.ts"),
            Path::new("/proj")
        ));
        assert!(!is_within(Path::new("/proj/../etc/passwd"), Path::new("/proj")));
    }

    #[test]
    fn display_relative_strips_root() {
        assert_eq!(
            display_relative(Path::new("/proj/src/a.ts"), Path::new("/proj")),
            "src/a.ts"
        );
    }
}
