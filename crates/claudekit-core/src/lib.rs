//! Core types and logic for the claudekit hooks engine
//!
//! This crate provides the foundational pieces the `claudekit-hooks`
//! binary is assembled from: the host payload model, project discovery,
//! layered configuration, the safe process runner, output formatting,
//! the session store, and the shared error taxonomy.
//!
//! # Core Components
//!
//! - **Payload**: tolerant decoding of the host's stdin event JSON
//! - **Project**: root location and package-manager/tool probing
//! - **Config**: layered `.claudekit/config.json` loading with deep merge
//! - **Process**: argv-array child spawning with timeouts and bounded capture
//! - **Output**: stderr error blocks and the stdout decision protocol
//! - **Session**: bounded per-session NDJSON log and rolling stats
//!
//! # Example
//!
//! ```
//! use claudekit_core::payload::HookPayload;
//! use claudekit_core::hook_events::HookEvent;
//!
//! let payload: HookPayload = serde_json::from_str(
//!     r#"{"hook_event_name":"Stop","stop_hook_active":false}"#,
//! ).unwrap();
//! assert_eq!(payload.event(), Some(HookEvent::Stop));
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod hook_events;
pub mod output;
pub mod path;
pub mod payload;
pub mod process;
pub mod project;
pub mod session;
pub mod transcript;

// Re-export commonly used types
pub use config::{Config, ConfigLoader, HookSettings, MapFormat, OnTimeout, ResolvedSettings};
pub use error::{
    ClaudekitError, ConfigError, ErrorContext, ExitCode, ProcessError, ProjectError, Result,
    SessionLogError, TranscriptError,
};
pub use hook_events::HookEvent;
pub use output::{ErrorBlock, HookResponse, Reporter};
pub use payload::HookPayload;
pub use process::{ProcessRunner, RunOptions, RunOutput};
pub use project::{PackageManager, ProjectContext, ProjectLocator, Toolchain};
pub use session::{EventRecord, SessionStore};
