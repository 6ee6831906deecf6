//! Host hook event constants and types
//!
//! Single source of truth for the `hook_event_name` strings the host sends,
//! to prevent string duplication and typos across the codebase.

use std::fmt::{self, Display};

/// Host hook event name constants
///
/// These constants represent the exact strings the host writes in the
/// `hook_event_name` field of the stdin payload. They must match the host's
/// implementation exactly.
pub mod event_constants {
    /// Pre-tool execution hook event
    pub const PRE_TOOL_USE: &str = "PreToolUse";

    /// Post-tool execution hook event
    pub const POST_TOOL_USE: &str = "PostToolUse";

    /// Main-agent stop hook event
    pub const STOP: &str = "Stop";

    /// Subagent completion hook event
    pub const SUBAGENT_STOP: &str = "SubagentStop";

    /// User prompt submission hook event
    pub const USER_PROMPT_SUBMIT: &str = "UserPromptSubmit";

    /// Session start hook event
    pub const SESSION_START: &str = "SessionStart";

    /// All valid hook event names as a slice
    pub const ALL_EVENTS: &[&str] = &[
        PRE_TOOL_USE,
        POST_TOOL_USE,
        STOP,
        SUBAGENT_STOP,
        USER_PROMPT_SUBMIT,
        SESSION_START,
    ];
}

/// Strongly-typed enum for host hook events
///
/// Unknown event names flow through the decoder unchanged; this enum only
/// classifies the kinds the engine knows how to key hooks off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum HookEvent {
    /// Pre-tool execution hook
    PreToolUse,
    /// Post-tool execution hook
    PostToolUse,
    /// Main-agent stop hook
    Stop,
    /// Subagent completion hook
    SubagentStop,
    /// User prompt submission hook
    UserPromptSubmit,
    /// Session start hook
    SessionStart,
}

impl HookEvent {
    /// Get all hook events
    pub const fn all() -> &'static [HookEvent] {
        &[
            HookEvent::PreToolUse,
            HookEvent::PostToolUse,
            HookEvent::Stop,
            HookEvent::SubagentStop,
            HookEvent::UserPromptSubmit,
            HookEvent::SessionStart,
        ]
    }

    /// Parse hook event from string (fallible)
    pub fn try_from_str(s: &str) -> Option<Self> {
        match s {
            event_constants::PRE_TOOL_USE => Some(HookEvent::PreToolUse),
            event_constants::POST_TOOL_USE => Some(HookEvent::PostToolUse),
            event_constants::STOP => Some(HookEvent::Stop),
            event_constants::SUBAGENT_STOP => Some(HookEvent::SubagentStop),
            event_constants::USER_PROMPT_SUBMIT => Some(HookEvent::UserPromptSubmit),
            event_constants::SESSION_START => Some(HookEvent::SessionStart),
            _ => None,
        }
    }

    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            HookEvent::PreToolUse => event_constants::PRE_TOOL_USE,
            HookEvent::PostToolUse => event_constants::POST_TOOL_USE,
            HookEvent::Stop => event_constants::STOP,
            HookEvent::SubagentStop => event_constants::SUBAGENT_STOP,
            HookEvent::UserPromptSubmit => event_constants::USER_PROMPT_SUBMIT,
            HookEvent::SessionStart => event_constants::SESSION_START,
        }
    }

    /// Check if this is a tool-related hook
    pub const fn is_tool_event(&self) -> bool {
        matches!(self, HookEvent::PreToolUse | HookEvent::PostToolUse)
    }

    /// Check if this is a stop-class hook (Stop or SubagentStop)
    ///
    /// Stop-class events carry `stop_hook_active` and use the stdout JSON
    /// decision protocol rather than exit 2.
    pub const fn is_stop_event(&self) -> bool {
        matches!(self, HookEvent::Stop | HookEvent::SubagentStop)
    }
}

impl Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HookEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookEvent::try_from_str(s).ok_or_else(|| format!("Invalid hook event: {s}"))
    }
}

impl TryFrom<&str> for HookEvent {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}
