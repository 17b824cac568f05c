use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::model::Units;

/// Environment variable that overrides the API key stored on disk.
pub const API_KEY_ENV: &str = "DEWY_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// units = "imperial"
/// country = "us"
/// forecast_days = 16
/// default_zip = "55021"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// OpenWeather `appid`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub units: Units,

    /// Country qualifier appended to postal codes.
    #[serde(default = "default_country")]
    pub country: String,

    /// Requested `cnt` for the daily forecast.
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,

    /// HTTP request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How long the location refresh waits for a fix before giving up.
    #[serde(default = "default_location_timeout_secs")]
    pub location_timeout_secs: u64,

    /// ZIP code used when a command is given none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_zip: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_country() -> String {
    "us".to_string()
}

const fn default_forecast_days() -> u8 {
    16
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_location_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            units: Units::default(),
            country: default_country(),
            forecast_days: default_forecast_days(),
            timeout_secs: default_timeout_secs(),
            location_timeout_secs: default_location_timeout_secs(),
            default_zip: None,
        }
    }
}

impl Config {
    /// Load config from the platform config directory, or defaults if it doesn't exist yet.
    /// `DEWY_API_KEY` wins over the stored key.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                cfg.api_key = Some(key.trim().to_string());
            }
        }

        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "dewy", "dewy")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Returns the API key or an error telling the user how to set one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: run `dewy configure` or set {API_KEY_ENV}."
                )
            })
    }

    /// `explicit` if given, otherwise the configured default ZIP code.
    pub fn zip_or_default<'a>(&'a self, explicit: Option<&'a str>) -> Result<&'a str> {
        explicit
            .or(self.default_zip.as_deref())
            .filter(|z| !z.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No ZIP code given and no default configured.\n\
                     Hint: pass a ZIP code or run `dewy configure` to store one."
                )
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_secs(self.location_timeout_secs)
    }
}
