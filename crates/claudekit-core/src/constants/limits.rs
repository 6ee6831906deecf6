//! Timeout and count limits
//!
//! Centralizes timeout values and iteration limits so hooks and the
//! dispatcher agree on defaults without magic numbers.

/// Default timeout for type-checking invocations in milliseconds
pub const TYPECHECK_TIMEOUT_MS: u64 = 45_000;

/// Default timeout for lint invocations in milliseconds
pub const LINT_TIMEOUT_MS: u64 = 30_000;

/// Default timeout for test-runner invocations in milliseconds
pub const TEST_TIMEOUT_MS: u64 = 60_000;

/// Default timeout for git checkpoint operations in milliseconds
pub const CHECKPOINT_TIMEOUT_MS: u64 = 10_000;

/// Default timeout for hooks with no tool invocation in milliseconds
pub const DEFAULT_HOOK_TIMEOUT_MS: u64 = 30_000;

/// Per-read stdin timeout in milliseconds
///
/// A `run` invocation from an interactive shell has no payload piped in;
/// the first read times out and the engine proceeds with an empty context.
pub const STDIN_READ_TIMEOUT_MS: u64 = 500;

/// Grace period added on top of a hook's own timeout before the
/// dispatcher treats the handler as hung
pub const DISPATCH_GRACE_MS: u64 = 5_000;

/// Default number of checkpoint stash entries retained per prefix
pub const DEFAULT_MAX_CHECKPOINTS: usize = 10;

/// Upper bound on checkpoint prune iterations per invocation
pub const MAX_CHECKPOINT_PRUNE_PASSES: usize = 32;

/// Maximum directory depth the bounded project walker descends
pub const MAX_WALK_DEPTH: usize = 12;

/// Maximum entries the bounded project walker visits
pub const MAX_WALK_ENTRIES: usize = 20_000;

/// Maximum files listed in a codebase map
pub const MAX_CODEBASE_MAP_ENTRIES: usize = 2_000;

/// Number of rotated session-log generations kept on disk
pub const SESSION_LOG_GENERATIONS: usize = 3;
