// Configuration management for persistent settings

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::diagnosis::executor::DEFAULT_VERBOSITY;
use crate::diagnosis::recommend::DEFAULT_LOW_EFFICIENCY_PERCENT;
use crate::diagnosis::{DiagnoseOptions, RuleConfig};

#[cfg(debug_assertions)]
const APP_NAME: &str = "slowmango-dev";

#[cfg(not(debug_assertions))]
const APP_NAME: &str = "slowmango";

const SETTINGS_FILE: &str = "settings.json";

/// Environment variable that overrides the stored connection URI
pub const URI_ENV: &str = "SLOWMANGO_URI";

/// Persistent settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub diagnosis: DiagnosisSettings,
}

/// Where to find the profiling log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default = "default_uri")]
    pub uri: String,
    /// Database whose `system.profile` is searched when none is given
    #[serde(default)]
    pub database: Option<String>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self { uri: default_uri(), database: None }
    }
}

/// Explain and rule tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisSettings {
    #[serde(default = "default_explain_timeout_ms")]
    pub explain_timeout_ms: u64,
    #[serde(default = "default_verbosity")]
    pub verbosity: String,
    #[serde(default = "default_low_efficiency_percent")]
    pub low_efficiency_percent: f64,
}

impl Default for DiagnosisSettings {
    fn default() -> Self {
        Self {
            explain_timeout_ms: default_explain_timeout_ms(),
            verbosity: default_verbosity(),
            low_efficiency_percent: default_low_efficiency_percent(),
        }
    }
}

impl DiagnosisSettings {
    pub fn to_options(&self) -> DiagnoseOptions {
        DiagnoseOptions {
            explain_timeout: Duration::from_millis(self.explain_timeout_ms),
            verbosity: self.verbosity.clone(),
            rules: RuleConfig { low_efficiency_percent: self.low_efficiency_percent },
        }
    }
}

fn default_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_explain_timeout_ms() -> u64 {
    30_000
}

fn default_verbosity() -> String {
    DEFAULT_VERBOSITY.to_string()
}

fn default_low_efficiency_percent() -> f64 {
    DEFAULT_LOW_EFFICIENCY_PERCENT
}

/// Manages persistent configuration files
#[derive(Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, initializing the config directory if needed
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Self::with_config_dir(config_dir)
    }

    /// Use an explicit config directory, creating it if needed
    pub fn with_config_dir(config_dir: PathBuf) -> Result<Self> {
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }
        Ok(Self { config_dir })
    }

    /// Get the platform-specific config directory
    fn get_config_dir() -> Result<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_NAME)).context("Could not determine config directory")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Load settings, falling back to defaults when no file exists yet
    pub fn load_settings(&self) -> Result<Settings> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(Settings::default());
        }

        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&data)
            .with_context(|| format!("Failed to deserialize {}", path.display()))?;
        Ok(settings)
    }

    /// Save settings (atomic via temp + rename)
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let path = self.settings_path();
        let json = serde_json::to_string_pretty(settings)
            .with_context(|| format!("Failed to serialize {SETTINGS_FILE}"))?;
        atomic_write(&path, json.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(path);
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    std::io::Write::write_all(&mut tmp, data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
