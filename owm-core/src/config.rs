use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    client::{ClientSettings, DEFAULT_HOST, DEFAULT_PORT},
    model::Units,
};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "OWM_API_KEY";

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "OWM_CONFIG";

/// Where requests are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Timeouts in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub first_byte_ms: u64,
    pub read_ms: u64,
    pub connect_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            first_byte_ms: 1000,
            read_ms: 1000,
            connect_ms: 5000,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// units = "metric"
///
/// [server]
/// host = "api.openweathermap.org"
/// port = 80
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Sent as `APPID` when present.
    pub api_key: Option<String>,
    pub units: Units,
    pub server: ServerConfig,
    pub timeouts: TimeoutConfig,
}

impl Config {
    /// Load the config file, falling back to defaults when none was saved yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file: {}", path.display()));
            }
        };

        Self::from_toml(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parses a config document; absent keys and sections keep their defaults.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Writes the config file and returns where it went.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to encode configuration")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// `$OWM_CONFIG` when set, otherwise `config.toml` in the platform config directory.
    pub fn config_file_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|path| !path.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        ProjectDirs::from("org", "openweathermap", "owm")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Store the API key; a blank key removes it.
    pub fn set_api_key(&mut self, api_key: &str) {
        let api_key = api_key.trim();
        self.api_key = (!api_key.is_empty()).then(|| api_key.to_string());
    }

    /// API key to use, preferring `OWM_API_KEY` from the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        pick_api_key(env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            host: self.server.host.clone(),
            port: self.server.port,
            api_key: self.resolved_api_key(),
            units: self.units,
            first_byte_timeout: Duration::from_millis(self.timeouts.first_byte_ms),
            read_timeout: Duration::from_millis(self.timeouts.read_ms),
            connect_timeout: Duration::from_millis(self.timeouts.connect_ms),
        }
    }
}

fn pick_api_key(from_env: Option<String>, stored: Option<&str>) -> Option<String> {
    from_env
        .filter(|key| !key.trim().is_empty())
        .or_else(|| stored.map(str::to_owned))
}
