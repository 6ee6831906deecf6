//! Command-line interface for the hooks engine
//!
//! `run` is the glue of the whole pipeline: decode stdin, locate the
//! project, probe tools, load config, execute the hook, and translate the
//! outcome into the exit-code / stdout-JSON protocol the host consumes.

mod commands;
mod dispatcher;

pub use commands::{Cli, Commands};
pub use dispatcher::Dispatcher;
