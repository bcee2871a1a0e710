use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::{DEFAULT_FILE_NAME, DEFAULT_LOCK_TIMEOUT};

/// Environment variable naming an alternate config file.
pub const CONFIG_ENV: &str = "TASK_CLI_CONFIG";

/// Environment variable naming the task file.
pub const FILE_ENV: &str = "TASK_CLI_FILE";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Preferred output mode: `pretty`, `text`, or `json`.
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Location of the user config file: `TASK_CLI_CONFIG` if set, otherwise
/// `<config_dir>/task-cli/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("task-cli/config.toml"))
}

/// Load the user config, falling back to defaults when no file exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(UserConfig::default()),
    }
}

/// Load a config file from an explicit path. A missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the task file path.
///
/// Precedence: `--file` flag, `TASK_CLI_FILE`, `store.path` from config, then
/// `tasks.json` beside the running executable.
///
/// # Errors
///
/// Returns an error only when falling back to the executable location and
/// that location cannot be determined.
pub fn resolve_store_path(flag: Option<&Path>, config: &UserConfig) -> Result<PathBuf> {
    let env_file = env::var_os(FILE_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    if let Some(path) = resolve_store_path_inner(flag, env_file, config) {
        return Ok(path);
    }

    let exe = env::current_exe().context("Failed to locate the running executable")?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(DEFAULT_FILE_NAME))
}

fn resolve_store_path_inner(
    flag: Option<&Path>,
    env_file: Option<PathBuf>,
    config: &UserConfig,
) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or(env_file)
        .or_else(|| config.store.path.clone())
}

/// Map a configured output name, including legacy aliases, to its canonical form.
#[must_use]
pub fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

fn default_lock_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_LOCK_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}
