//! Size-related constants
//!
//! Byte caps for every input the engine reads. All of these are mandatory
//! bounds; the configurable ones are plumbed through `HookSettings`.

/// Number of bytes in a kilobyte
pub const BYTES_PER_KB: usize = 1024;

/// Number of bytes in a megabyte
pub const BYTES_PER_MB: usize = 1024 * 1024;

/// Maximum stdin payload size in bytes (default 1 MiB)
///
/// Larger payloads are truncated and flagged, never an error: the hook
/// must still exit.
pub const MAX_STDIN_BYTES: usize = BYTES_PER_MB;

/// Maximum captured child output in bytes (default 10 MiB)
pub const MAX_CHILD_OUTPUT_BYTES: usize = 10 * BYTES_PER_MB;

/// Tail window retained when child output overflows the cap
pub const CHILD_OUTPUT_TAIL_BYTES: usize = 8 * BYTES_PER_KB;

/// Transcript tail window read by `check-todos` (default 4 MiB)
pub const TRANSCRIPT_WINDOW_BYTES: usize = 4 * BYTES_PER_MB;

/// Per-session log byte budget before rotation (default 16 MiB)
pub const SESSION_LOG_BUDGET_BYTES: usize = 16 * BYTES_PER_MB;

/// Tail of stderr recorded in each session-log record
pub const LOG_STDERR_TAIL_BYTES: usize = 512;

/// Initial capacity of the stdin read buffer
pub const STDIN_BUFFER_CAPACITY: usize = 8 * BYTES_PER_KB;
