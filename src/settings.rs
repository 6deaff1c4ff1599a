use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::advisor::{AdviceConfig, RetryPolicy, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::error::{AdvisorError, Result};
use crate::reports::TOP_CATEGORIES;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
/// Overrides `~/.config/upi-advisor` (used by tests and sandboxed runs).
pub const CONFIG_DIR_VAR: &str = "UPI_ADVISOR_CONFIG_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Transactions file used when a command is given none.
    #[serde(default)]
    pub default_file: Option<String>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
    /// Only the first N rows are summarised; all rows when unset.
    #[serde(default)]
    pub summary_rows: Option<usize>,
    #[serde(default = "default_top_categories")]
    pub top_categories: usize,
    #[serde(default)]
    pub monthly_income: Option<f64>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_secs() -> u64 {
    20
}

fn default_top_categories() -> usize {
    TOP_CATEGORIES
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_file: None,
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
            summary_rows: None,
            top_categories: default_top_categories(),
            monthly_income: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Settings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_secs(self.backoff_secs),
        }
    }
}

fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_VAR) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("upi-advisor")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read settings, using defaults");
            return Settings::default();
        }
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "invalid settings file, using defaults");
        Settings::default()
    })
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| AdvisorError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

/// Resolve the transactions file: explicit argument first, then the
/// configured default.
pub fn resolve_input(file: Option<&str>, settings: &Settings) -> Result<PathBuf> {
    file.map(str::to_string)
        .or_else(|| settings.default_file.clone())
        .map(|f| PathBuf::from(shellexpand_path(&f)))
        .ok_or(AdvisorError::NoInputFile)
}

/// Read the advice-service configuration from the process environment.
/// A missing credential is fatal for any command that talks to the service.
pub fn advice_config_from_env(settings: &Settings) -> Result<AdviceConfig> {
    let lookup = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
    advice_config_from(lookup, settings)
}

pub fn advice_config_from<F>(lookup: F, settings: &Settings) -> Result<AdviceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = lookup(API_KEY_VAR).ok_or(AdvisorError::MissingApiKey)?;
    Ok(AdviceConfig {
        api_key,
        model: lookup(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        base_url: lookup(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        timeout: Duration::from_secs(settings.request_timeout_secs),
    })
}
