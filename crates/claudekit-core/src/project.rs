//! Project discovery: root location, package-manager and tool probing
//!
//! The locator walks upward from a candidate path to the nearest
//! `package.json` or `.git`; the probe turns that root into a
//! [`ProjectContext`] describing the package manager, the tooling the
//! project actually has, and its `package.json` scripts. Everything is
//! detection only; no tool is executed during probing.

mod locator;
mod probe;
mod walk;

pub use locator::ProjectLocator;
pub use probe::{
    PackageManager, ProjectContext, TestRunner, TestRunnerKind, ToolCommand, Toolchain,
};
pub use walk::{walk_files, WalkOptions};
