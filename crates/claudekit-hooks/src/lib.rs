//! Claudekit hooks engine
//!
//! The embedded hooks engine behind claudekit: a dedicated binary the
//! host invokes once per tool-use or lifecycle event. Each invocation
//! decodes the JSON payload on stdin, locates the project, probes its
//! tooling, loads layered configuration, dispatches to one hook handler,
//! and reports back through the exit-code / stdout-JSON protocol.

/// Command-line interface and dispatcher
pub mod cli;

/// Hook implementations, base trait, and registry
pub mod hooks;

/// Stdin payload processing
pub mod io;

pub use cli::{Cli, Commands};
