//! Output formatting: stderr blocks for humans, stdout JSON for the host
//!
//! Two channels, never mixed. Stderr carries progress lines (prefixed with
//! the hook id) and formatted error blocks ending in a numbered "How to
//! fix" list. Stdout carries at most one JSON object per invocation, in
//! one of the shapes of the host decision protocol.

use serde::Serialize;
use std::io::Write;

const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BAR: &str = "████";

/// JSON objects the engine may write to stdout
///
/// `Block` is the preferred block path for Stop-class events (the host
/// keeps the turn alive and surfaces the reason to the assistant);
/// `Context` is how session-context hooks hand text back to the host.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HookResponse {
    Block {
        decision: &'static str,
        reason: String,
    },
    Suppress {
        #[serde(rename = "suppressOutput")]
        suppress_output: bool,
    },
    Context {
        #[serde(rename = "hookSpecificOutput")]
        hook_specific_output: HookSpecificOutput,
    },
}

/// Payload of the `hookSpecificOutput` shape
#[derive(Debug, Clone, Serialize)]
pub struct HookSpecificOutput {
    #[serde(rename = "hookEventName")]
    pub hook_event_name: String,
    #[serde(rename = "additionalContext")]
    pub additional_context: String,
}

impl HookResponse {
    pub fn block(reason: impl Into<String>) -> Self {
        HookResponse::Block {
            decision: "block",
            reason: reason.into(),
        }
    }

    pub fn suppress() -> Self {
        HookResponse::Suppress {
            suppress_output: true,
        }
    }

    pub fn additional_context(event: impl Into<String>, context: impl Into<String>) -> Self {
        HookResponse::Context {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: event.into(),
                additional_context: context.into(),
            },
        }
    }

    /// Render as the single stdout line of the invocation.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A formatted error block
///
/// Rendered shape:
///
/// ```text
/// ████ Error: <Title> ████
///
/// <body>
///
/// How to fix:
/// 1. …
/// 2. …
/// ```
#[derive(Debug, Clone)]
pub struct ErrorBlock {
    pub title: String,
    pub body: String,
    pub fix_steps: Vec<String>,
}

impl ErrorBlock {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            fix_steps: Vec::new(),
        }
    }

    pub fn fix(mut self, step: impl Into<String>) -> Self {
        self.fix_steps.push(step.into());
        self
    }

    /// Render the block, with or without ANSI color.
    pub fn render(&self, color: bool) -> String {
        let mut text = String::new();
        if color {
            text.push_str(&format!(
                "{RED}{BAR} Error: {} {BAR}{RESET}\n\n",
                self.title
            ));
        } else {
            text.push_str(&format!("{BAR} Error: {} {BAR}\n\n", self.title));
        }
        let body = self.body.trim_end();
        if !body.is_empty() {
            text.push_str(body);
            text.push_str("\n\n");
        }
        if !self.fix_steps.is_empty() {
            text.push_str("How to fix:\n");
            for (index, step) in self.fix_steps.iter().enumerate() {
                text.push_str(&format!("{}. {step}\n", index + 1));
            }
        }
        text
    }
}

/// Stderr reporter bound to one hook id
///
/// Color is decided once at construction from `NO_COLOR` and whether
/// stderr is going to a terminal-ish consumer; the host reads it either
/// way.
#[derive(Debug, Clone)]
pub struct Reporter {
    hook_id: String,
    color: bool,
}

impl Reporter {
    pub fn new(hook_id: impl Into<String>) -> Self {
        Self {
            hook_id: hook_id.into(),
            color: std::env::var_os("NO_COLOR").is_none(),
        }
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn plain(hook_id: impl Into<String>) -> Self {
        Self {
            hook_id: hook_id.into(),
            color: false,
        }
    }

    /// One progress line, tagged with the hook id.
    pub fn progress(&self, message: &str) {
        if self.color {
            eprintln!("{DIM}[{}]{RESET} {message}", self.hook_id);
        } else {
            eprintln!("[{}] {message}", self.hook_id);
        }
    }

    /// Emit a formatted error block to stderr.
    pub fn error_block(&self, block: &ErrorBlock) {
        let rendered = block.render(self.color);
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(rendered.as_bytes());
        let _ = stderr.flush();
    }

    pub fn hook_id(&self) -> &str {
        &self.hook_id
    }
}
