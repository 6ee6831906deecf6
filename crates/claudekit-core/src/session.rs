//! Per-session execution log and rolling stats
//!
//! Append-only NDJSON under `~/.claudekit/logs/<session_id>/` plus a tiny
//! `stats.json`. Everything here is best-effort: a failed write is traced
//! and swallowed, never surfaced to the hook path. Appends are single
//! `O_APPEND` writes so concurrent invocations interleave at record
//! granularity; `stats.json` is replaced atomically via rename.
//!
//! Growth is bounded and rotation is size-based only: when the events
//! file exceeds its byte budget it is compressed into a numbered
//! generation and restarted.

use crate::constants::limits::SESSION_LOG_GENERATIONS;
use crate::constants::sizes::SESSION_LOG_BUDGET_BYTES;
use crate::error::SessionLogError;
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One session-log record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub ts: DateTime<Utc>,
    pub hook_id: String,
    pub event: String,
    pub root: String,
    pub duration_ms: u64,
    pub exit_code: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr_tail: String,
}

/// Aggregated per-session statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStats {
    pub total_invocations: u64,
    pub blocked: u64,
    pub hooks: HashMap<String, HookStats>,
}

/// Per-hook slice of the session statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HookStats {
    pub count: u64,
    pub blocked: u64,
    pub mean_duration_ms: f64,
}

impl SessionStats {
    fn absorb(&mut self, record: &EventRecord) {
        self.total_invocations += 1;
        if record.exit_code == 2 {
            self.blocked += 1;
        }
        let entry = self.hooks.entry(record.hook_id.clone()).or_default();
        entry.count += 1;
        if record.exit_code == 2 {
            entry.blocked += 1;
        }
        // Incremental moving average keeps the file tiny
        entry.mean_duration_ms +=
            (record.duration_ms as f64 - entry.mean_duration_ms) / entry.count as f64;
    }

    /// Merge another session's stats into this aggregate.
    pub fn merge(&mut self, other: &SessionStats) {
        self.total_invocations += other.total_invocations;
        self.blocked += other.blocked;
        for (hook_id, stats) in &other.hooks {
            let entry = self.hooks.entry(hook_id.clone()).or_default();
            let total = entry.count + stats.count;
            if total > 0 {
                entry.mean_duration_ms = (entry.mean_duration_ms * entry.count as f64
                    + stats.mean_duration_ms * stats.count as f64)
                    / total as f64;
            }
            entry.count = total;
            entry.blocked += stats.blocked;
        }
    }
}

/// Session-scoped log writer
pub struct SessionStore {
    dir: PathBuf,
    budget_bytes: u64,
    lock: Mutex<()>,
}

impl SessionStore {
    /// Store for a session id (sanitized before it becomes a directory
    /// name). Returns `None` when no home directory can be determined.
    pub fn for_session(session_id: Option<&str>) -> Option<Self> {
        let id = sanitize_session_id(session_id);
        let dir = logs_root()?.join(id);
        Some(Self {
            dir,
            budget_bytes: SESSION_LOG_BUDGET_BYTES as u64,
            lock: Mutex::new(()),
        })
    }

    /// Store rooted at an explicit directory (tests, stats tooling).
    pub fn at_dir(dir: PathBuf, budget_bytes: u64) -> Self {
        Self {
            dir,
            budget_bytes,
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append a record and fold it into the stats file. Best-effort:
    /// failures are traced at debug level and ignored.
    pub fn record(&self, record: &EventRecord) {
        let _guard = self.lock.lock();
        if let Err(err) = self.try_record(record) {
            tracing::debug!("session log write failed: {err}");
        }
    }

    fn try_record(&self, record: &EventRecord) -> Result<(), SessionLogError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| self.write_error(source))?;
        let events_path = self.dir.join("events.ndjson");

        if let Ok(meta) = events_path.metadata() {
            if meta.len() >= self.budget_bytes {
                self.rotate(&events_path)?;
            }
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&events_path)
            .map_err(|source| self.write_error(source))?;
        // One write per record: appends stay atomic at record level
        file.write_all(line.as_bytes())
            .map_err(|source| self.write_error(source))?;

        self.update_stats(record)
    }

    /// Shift generations and gzip the full events file into `.1`.
    fn rotate(&self, events_path: &Path) -> Result<(), SessionLogError> {
        let rotate_error = |source| SessionLogError::Rotate {
            path: events_path.display().to_string(),
            source,
        };
        for generation in (1..SESSION_LOG_GENERATIONS).rev() {
            let from = self.dir.join(format!("events.{generation}.ndjson.gz"));
            let to = self.dir.join(format!("events.{}.ndjson.gz", generation + 1));
            if from.exists() {
                let _ = std::fs::rename(&from, &to);
            }
        }
        let data = std::fs::read(events_path).map_err(rotate_error)?;
        let target = self.dir.join("events.1.ndjson.gz");
        let mut encoder = GzEncoder::new(
            std::fs::File::create(&target).map_err(rotate_error)?,
            Compression::fast(),
        );
        encoder.write_all(&data).map_err(rotate_error)?;
        encoder.finish().map_err(rotate_error)?;
        std::fs::remove_file(events_path).map_err(rotate_error)
    }

    fn update_stats(&self, record: &EventRecord) -> Result<(), SessionLogError> {
        let stats_path = self.dir.join("stats.json");
        let mut stats = load_stats(&self.dir).unwrap_or_default();
        stats.absorb(record);

        let tmp = self.dir.join(format!("stats.json.{}.tmp", std::process::id()));
        let rendered = serde_json::to_string_pretty(&stats)?;
        std::fs::write(&tmp, rendered).map_err(|source| self.write_error(source))?;
        std::fs::rename(&tmp, &stats_path).map_err(|source| self.write_error(source))
    }

    fn write_error(&self, source: std::io::Error) -> SessionLogError {
        SessionLogError::Write {
            dir: self.dir.display().to_string(),
            source,
        }
    }
}

/// Read a session's stats file, if any.
pub fn load_stats(session_dir: &Path) -> Option<SessionStats> {
    let text = std::fs::read_to_string(session_dir.join("stats.json")).ok()?;
    serde_json::from_str(&text).ok()
}

/// The logs root, `~/.claudekit/logs`.
pub fn logs_root() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".claudekit").join("logs"))
}

/// Session ids come from the payload, so they are user-controlled input;
/// anything that could traverse directories is replaced before the id
/// becomes a path component.
pub fn sanitize_session_id(session_id: Option<&str>) -> String {
    let raw = session_id.unwrap_or("").trim();
    if raw.is_empty() {
        return "no-session".to_string();
    }
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "no-session".to_string()
    } else {
        cleaned
    }
}
