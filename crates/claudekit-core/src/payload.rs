//! Hook payload types matching the host's stdin JSON format
//!
//! Deserialization is deliberately tolerant: every field is optional,
//! unknown fields are ignored, and unknown event kinds flow through
//! unchanged. A payload that fails to parse at all is treated as empty by
//! the decoder, not as an error.

use crate::hook_events::HookEvent;
use crate::path::normalize_user_path;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Hook event payload from the host
///
/// # Example
///
/// ```
/// use claudekit_core::payload::HookPayload;
/// use serde_json::json;
///
/// let json = json!({
///     "hook_event_name": "PostToolUse",
///     "tool_name": "Edit",
///     "tool_input": {"file_path": "/proj/src/a.ts"},
///     "session_id": "sess_123"
/// });
///
/// let payload: HookPayload = serde_json::from_value(json).unwrap();
/// assert_eq!(payload.hook_event_name, "PostToolUse");
/// assert!(payload.file_path().is_some());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HookPayload {
    /// Hook event kind discriminator (e.g. `PostToolUse`, `Stop`)
    pub hook_event_name: String,

    /// Unique session identifier from the host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Path to the newline-delimited JSON session transcript
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,

    /// Working directory the host ran the tool in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    // ===== Tool fields (PreToolUse, PostToolUse) =====
    /// Name of the tool that ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Tool input parameters (tool-specific JSON)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<Value>,

    /// Tool execution result (PostToolUse only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_response: Option<Value>,

    // ===== Stop / SubagentStop =====
    /// Set by the host when a stop hook already fired this turn; hooks use
    /// it to break block-loops
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_hook_active: Option<bool>,

    // ===== UserPromptSubmit =====
    /// User's prompt text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    // ===== SessionStart =====
    /// Session source ("startup", "resume", or "clear")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl HookPayload {
    /// Classify the event kind, if known
    pub fn event(&self) -> Option<HookEvent> {
        HookEvent::try_from_str(&self.hook_event_name)
    }

    /// True when the payload carries no event at all (empty stdin or an
    /// unparseable body)
    pub fn is_empty(&self) -> bool {
        self.hook_event_name.is_empty()
    }

    /// The affected file path from `tool_input.file_path`, normalized.
    ///
    /// File URLs are converted to paths, `~` is expanded, and relative
    /// paths resolve against the payload's `cwd`. Returns `None` when the
    /// tool input carries no path (e.g. a Bash invocation).
    pub fn file_path(&self) -> Option<PathBuf> {
        let raw = self
            .tool_input
            .as_ref()?
            .get("file_path")
            .and_then(Value::as_str)?;
        if raw.is_empty() {
            return None;
        }
        Some(normalize_user_path(raw, self.cwd.as_deref()))
    }

    /// The transcript path, tilde-expanded and normalized.
    pub fn transcript(&self) -> Option<PathBuf> {
        let raw = self.transcript_path.as_deref()?;
        if raw.is_empty() {
            return None;
        }
        Some(normalize_user_path(raw, self.cwd.as_deref()))
    }

    /// True when the host flags that a stop hook already fired this turn
    pub fn stop_hook_active(&self) -> bool {
        self.stop_hook_active.unwrap_or(false)
    }

    /// The directory to start project discovery from: the affected file's
    /// parent when present, else the payload `cwd`.
    pub fn discovery_start(&self) -> Option<PathBuf> {
        if let Some(file) = self.file_path() {
            return Some(
                file.parent()
                    .map(Path::to_path_buf)
                    .unwrap_or(file),
            );
        }
        self.cwd.clone()
    }
}
