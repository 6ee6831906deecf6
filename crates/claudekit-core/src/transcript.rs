//! Windowed transcript reading
//!
//! Session transcripts are newline-delimited JSON and can reach gigabytes.
//! Hooks only ever need the recent end, so reading is done from a seek
//! near EOF: at most `window_bytes` are read, and parsing starts at the
//! first complete line inside the window.

use crate::error::TranscriptError;
use serde::Deserialize;
use serde_json::Value;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Maximum JSON nesting the todo extractor descends
const MAX_SCAN_DEPTH: usize = 16;

/// One todo item as written by the host's TodoWrite tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TodoItem {
    #[serde(default)]
    pub content: String,
    pub status: TodoStatus,
}

/// Todo lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    #[serde(other)]
    Unknown,
}

impl TodoItem {
    /// Completed items (and unrecognized states) do not gate a stop.
    pub fn is_unfinished(&self) -> bool {
        matches!(self.status, TodoStatus::Pending | TodoStatus::InProgress)
    }
}

/// Read the trailing lines of a transcript, bounded by `window_bytes`.
///
/// When the window starts mid-file, the first (possibly partial) line is
/// dropped so every returned line is complete.
pub fn read_tail_lines(path: &Path, window_bytes: usize) -> Result<Vec<String>, TranscriptError> {
    let mut file = std::fs::File::open(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => TranscriptError::NotFound {
            path: path.to_path_buf(),
        },
        _ => TranscriptError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let len = file
        .metadata()
        .map_err(|source| TranscriptError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    let window = window_bytes as u64;
    let start = len.saturating_sub(window);

    file.seek(SeekFrom::Start(start))
        .map_err(|source| TranscriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let mut buffer = Vec::with_capacity(len.min(window) as usize);
    file.take(window)
        .read_to_end(&mut buffer)
        .map_err(|source| TranscriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let text = String::from_utf8_lossy(&buffer);
    let mut lines: Vec<&str> = text.lines().collect();
    if start > 0 && !lines.is_empty() {
        lines.remove(0);
    }
    Ok(lines
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Find the todo list of the most recent TodoWrite record within the tail
/// window. Returns `None` when the window has no such record.
pub fn latest_todos(
    path: &Path,
    window_bytes: usize,
) -> Result<Option<Vec<TodoItem>>, TranscriptError> {
    let lines = read_tail_lines(path, window_bytes)?;
    for line in lines.iter().rev() {
        let Ok(value) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        if let Some(todos) = extract_todos(&value, 0) {
            return Ok(Some(todos));
        }
    }
    Ok(None)
}

/// Recursively search a record for a TodoWrite invocation's todo list.
///
/// Transcript records nest tool uses differently across host versions
/// (`name`/`input` inside message content, `tool_name`/`tool_input` at
/// the top), so the scan accepts either spelling.
fn extract_todos(value: &Value, depth: usize) -> Option<Vec<TodoItem>> {
    if depth > MAX_SCAN_DEPTH {
        return None;
    }
    match value {
        Value::Object(map) => {
            let is_todo_write = ["name", "tool_name"]
                .iter()
                .any(|key| map.get(*key).and_then(Value::as_str) == Some("TodoWrite"));
            if is_todo_write {
                for input_key in ["input", "tool_input"] {
                    if let Some(todos) = map
                        .get(input_key)
                        .and_then(|input| input.get("todos"))
                        .and_then(parse_todo_array)
                    {
                        return Some(todos);
                    }
                }
            }
            map.values().find_map(|child| extract_todos(child, depth + 1))
        }
        Value::Array(items) => items.iter().find_map(|child| extract_todos(child, depth + 1)),
        _ => None,
    }
}

fn parse_todo_array(value: &Value) -> Option<Vec<TodoItem>> {
    serde_json::from_value(value.clone()).ok()
}
