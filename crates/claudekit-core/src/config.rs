//! Layered configuration for the hooks engine
//!
//! Two JSON layers are deep-merged: the project layer
//! (`<root>/.claudekit/config.json`) overrides the user layer
//! (`~/.claudekit/config.json`). Objects merge recursively; arrays and
//! scalars replace. Unknown keys are preserved and ignored.
//!
//! Only malformed JSON is treated as an error, and even that degrades to
//! a warning plus defaults at the call site; shape mismatches never stop
//! a hook from running.

use crate::constants::limits::DEFAULT_MAX_CHECKPOINTS;
use crate::error::{ConfigError, ConfigResult};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Per-hook settings keyed by hook id; unknown ids are retained
    pub hooks: HashMap<String, HookSettings>,

    /// Settings for the codebase-map hook
    pub codebase_map: CodebaseMapConfig,

    /// Unrecognized top-level keys, preserved for round-tripping
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-hook settings as they appear in config files
///
/// Hook-specific keys (`prefix`, `maxCheckpoints`) live here too; they are
/// simply ignored by hooks that have no use for them. Anything else lands
/// in `extra` untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HookSettings {
    /// Override the tool command the hook invokes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Child-process timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Set false to turn the hook off entirely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Extra argv elements appended to the tool invocation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_args: Option<Vec<String>>,

    /// Whether a validator timeout blocks or soft-skips
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_timeout: Option<OnTimeout>,

    /// Checkpoint stash message prefix (create-checkpoint)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Maximum retained checkpoint stashes (create-checkpoint)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_checkpoints: Option<usize>,

    /// Unrecognized keys, preserved
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Timeout policy for validator hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnTimeout {
    /// Treat a timed-out tool as a failure: exit 2 with a timeout block
    Block,
    /// Treat a timed-out tool like a missing one: warn and exit 0
    Skip,
}

/// Settings for the codebase-map hook
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodebaseMapConfig {
    /// Include globs; empty means everything
    pub include: Vec<String>,

    /// Exclude globs, applied after includes
    pub exclude: Vec<String>,

    /// Output format
    pub format: MapFormat,
}

impl Default for CodebaseMapConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            format: MapFormat::Dsl,
        }
    }
}

/// Codebase map rendering format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapFormat {
    /// Flat one-file-per-line index
    Dsl,
    /// Indented directory tree
    Tree,
}

/// Fully-resolved settings handed to a hook, defaults filled in
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub command: Option<String>,
    pub timeout: Duration,
    pub enabled: bool,
    pub extra_args: Vec<String>,
    pub on_timeout: OnTimeout,
    pub prefix: String,
    pub max_checkpoints: usize,
}

impl Config {
    /// Resolve the settings for one hook, filling defaults from its
    /// descriptor's `default_timeout_ms`.
    pub fn settings(&self, hook_id: &str, default_timeout_ms: u64) -> ResolvedSettings {
        let raw = self.hooks.get(hook_id).cloned().unwrap_or_default();
        ResolvedSettings {
            command: raw.command,
            timeout: Duration::from_millis(raw.timeout.unwrap_or(default_timeout_ms)),
            enabled: raw.enabled.unwrap_or(true),
            extra_args: raw.extra_args.unwrap_or_default(),
            on_timeout: raw.on_timeout.unwrap_or(OnTimeout::Block),
            prefix: raw.prefix.unwrap_or_else(|| "claude".to_string()),
            max_checkpoints: raw.max_checkpoints.unwrap_or(DEFAULT_MAX_CHECKPOINTS),
        }
    }
}

/// Deep-merge `overlay` into `base`: objects merge key-by-key, everything
/// else (arrays included) replaces.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
        }
        (base_slot, overlay_value) => *base_slot = overlay_value,
    }
}

/// Lazily-loaded, cached layered configuration
///
/// The cache lives for the process lifetime; one invocation handles one
/// event, so there is nothing to invalidate.
pub struct ConfigLoader {
    project_path: PathBuf,
    user_path: Option<PathBuf>,
    cache: OnceCell<Config>,
}

impl ConfigLoader {
    /// Loader for a project root, with the standard user layer
    pub fn new(root: &Path) -> Self {
        Self {
            project_path: project_config_path(root),
            user_path: user_config_path(),
            cache: OnceCell::new(),
        }
    }

    /// Loader reading an explicit project-layer file (`--config`
    /// override).
    ///
    /// Unlike the discovered layers, an explicitly named file that
    /// cannot be read or parsed is an operator error: the caller gets
    /// the failure instead of silently running on defaults.
    pub fn with_required_project_file(path: PathBuf) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if let Err(err) = serde_json::from_str::<Value>(&text) {
            return Err(ConfigError::Parse {
                path: path.display().to_string(),
                reason: err.to_string(),
            });
        }
        Ok(Self {
            project_path: path,
            user_path: user_config_path(),
            cache: OnceCell::new(),
        })
    }

    /// Load and merge both layers, caching the result.
    ///
    /// Missing files are normal (empty layer). Malformed JSON in a layer
    /// produces a warning and that layer is skipped; the other layer and
    /// the defaults still apply.
    pub fn load(&self) -> &Config {
        self.cache.get_or_init(|| {
            let mut merged = Value::Object(Map::new());
            if let Some(user) = self.user_path.as_deref() {
                if let Some(layer) = read_layer(user) {
                    deep_merge(&mut merged, layer);
                }
            }
            if let Some(layer) = read_layer(&self.project_path) {
                deep_merge(&mut merged, layer);
            }
            match serde_json::from_value::<Config>(merged) {
                Ok(config) => config,
                Err(err) => {
                    // Shape mismatch degrades to defaults, never a failure
                    tracing::warn!("configuration did not match schema: {err}; using defaults");
                    Config::default()
                }
            }
        })
    }
}

fn read_layer(path: &Path) -> Option<Value> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            tracing::warn!("cannot read config {}: {err}", path.display());
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value @ Value::Object(_)) => Some(value),
        Ok(_) => {
            tracing::warn!("config {} is not a JSON object; ignoring", path.display());
            None
        }
        Err(err) => {
            tracing::warn!("malformed config {}: {err}; ignoring layer", path.display());
            None
        }
    }
}

/// Path of the project config layer
pub fn project_config_path(root: &Path) -> PathBuf {
    root.join(".claudekit").join("config.json")
}

/// Path of the user config layer
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".claudekit").join("config.json"))
}

/// Set `hooks.<id>.enabled` in the project config file, creating it if
/// needed and preserving every other key byte-for-byte as JSON.
pub fn set_hook_enabled(root: &Path, hook_id: &str, enabled: bool) -> ConfigResult<PathBuf> {
    let path = project_config_path(root);
    let mut value: Value = match std::fs::read_to_string(&path) {
        Ok(text) => serde_json::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Value::Object(Map::new()),
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source: err,
            });
        }
    };

    if !value.is_object() {
        return Err(ConfigError::Parse {
            path: path.display().to_string(),
            reason: "top level is not a JSON object".to_string(),
        });
    }

    let hooks = value
        .as_object_mut()
        .expect("checked above")
        .entry("hooks")
        .or_insert_with(|| Value::Object(Map::new()));
    if !hooks.is_object() {
        *hooks = Value::Object(Map::new());
    }
    let entry = hooks
        .as_object_mut()
        .expect("coerced above")
        .entry(hook_id.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    entry
        .as_object_mut()
        .expect("coerced above")
        .insert("enabled".to_string(), Value::Bool(enabled));

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| ConfigError::Write {
            path: path.display().to_string(),
            source: err,
        })?;
    }
    let rendered = serde_json::to_string_pretty(&value).map_err(|err| ConfigError::Parse {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    std::fs::write(&path, rendered + "\n").map_err(|err| ConfigError::Write {
        path: path.display().to_string(),
        source: err,
    })?;
    Ok(path)
}
