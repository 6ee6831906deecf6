//! Error handling for the claudekit hooks engine
//!
//! This module provides the error taxonomy with thiserror, the exit-code
//! mapping the host relies on, and a context-attachment helper.
//!
//! Most failure kinds in this engine are deliberately *not* errors: a
//! missing tool, an unparseable payload, or an unresolvable project root
//! produce a stderr diagnostic and a soft-skip (exit 0) in the hooks
//! themselves. The variants here cover the failures that genuinely
//! propagate.

use thiserror::Error;

/// Convenient result alias for engine operations.
///
/// # Examples
///
/// ```
/// use claudekit_core::error::{Result, ClaudekitError};
///
/// fn do_work(ok: bool) -> Result<()> {
///     if ok { Ok(()) } else { Err(ClaudekitError::InvalidInput { message: "bad".into() }) }
/// }
///
/// assert!(do_work(true).is_ok());
/// assert!(do_work(false).is_err());
/// ```
pub type Result<T> = std::result::Result<T, ClaudekitError>;
/// Result specialized for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
/// Result specialized for child-process operations.
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

/// Root error type for all engine operations.
///
/// Integrates with the host exit-code protocol via [`ExitCode`]. Most
/// failures in the `run` pipeline are soft-skips or handler crash
/// blocks, not propagated errors; this conversion covers the
/// pre-handler failures that are genuinely fatal: an unusable
/// `--config` override exits `1`, and [`ClaudekitError::UnknownHook`]
/// exits `64` so the host can distinguish a miswired hook id from a
/// crash. Exit `2` (block) is never produced through this type;
/// blocking is a successful hook outcome, not an error.
#[derive(Error, Debug)]
pub enum ClaudekitError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Project discovery error: {0}")]
    Project(#[from] ProjectError),

    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("JSON processing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Operation timeout: {operation} took longer than {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Unknown hook: {id}")]
    UnknownHook { id: String },

    #[error("{message}: {source}")]
    Context {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Wraps arbitrary errors from external libraries
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Process exit codes of the `run` subcommand.
///
/// These are the engine's contract with the host: `0` allow, `2` block,
/// `1` internal error (the engine crashed before executing the hook),
/// `64` unknown hook id.
///
/// # Examples
/// ```
/// use claudekit_core::error::{ClaudekitError, ExitCode};
/// let err = ClaudekitError::UnknownHook { id: "no-such-hook".into() };
/// let code: ExitCode = (&err).into();
/// assert_eq!(code, ExitCode::UnknownHook);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    InternalError = 1,
    Block = 2,
    UnknownHook = 64,
}

impl ExitCode {
    /// Raw process exit code
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// True for the blocking exit code
    pub const fn is_block(self) -> bool {
        matches!(self, ExitCode::Block)
    }
}

impl From<&ClaudekitError> for ExitCode {
    fn from(error: &ClaudekitError) -> Self {
        match error {
            ClaudekitError::UnknownHook { .. } => ExitCode::UnknownHook,
            ClaudekitError::Context { source, .. } => {
                // Preserve the wrapped error's exit code when possible
                if let Some(inner) = source.downcast_ref::<ClaudekitError>() {
                    ExitCode::from(inner)
                } else {
                    ExitCode::InternalError
                }
            }
            _ => ExitCode::InternalError,
        }
    }
}

// Domain-specific error types with structured information

/// Configuration loading errors
///
/// Only malformed JSON is fatal enough to surface; schema mismatches
/// degrade to warnings inside the loader.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Malformed configuration JSON in {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Cannot read configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write configuration file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Project root and tool discovery errors
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Start path cannot be resolved: {path}")]
    StartPathUnresolved { path: std::path::PathBuf },

    #[error("No package.json at {root}")]
    NotAPackage { root: std::path::PathBuf },

    #[error("{0}")]
    Other(String),
}

/// Child-process errors from the safe runner
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to capture output of {program}")]
    Capture { program: String },

    #[error("Wait failed for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Session-log write errors
///
/// The session store is best-effort by contract: these are always
/// traced and swallowed inside [`crate::session`], never surfaced to
/// the hook path, which is why the root error type carries no variant
/// for them.
#[derive(Debug, Error)]
pub enum SessionLogError {
    #[error("Cannot write session log under {dir}: {source}")]
    Write {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot rotate session log {path}: {source}")]
    Rotate {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot encode session record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Transcript reading errors
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("Transcript not found: {path}")]
    NotFound { path: std::path::PathBuf },

    #[error("Cannot read transcript {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error context extension trait to attach additional context during
/// propagation.
///
/// # Examples
///
/// ```
/// use claudekit_core::error::{ErrorContext, Result, ClaudekitError};
///
/// fn parse() -> Result<()> {
///     Err(ClaudekitError::InvalidInput { message: "bad".into() })
///         .with_context(|| "while decoding payload".to_string())
/// }
///
/// let err = parse().unwrap_err();
/// assert!(format!("{err}").contains("while decoding payload"));
/// ```
pub trait ErrorContext<T> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ClaudekitError::Context {
            message: f(),
            source: Box::new(e),
        })
    }
}
