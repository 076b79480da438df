use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::events::ResponseMode;
use crate::prompts;

/// Environment variable that overrides the configured API base URL
pub const API_URL_ENV: &str = "TIKITLY_API_URL";

const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the support backend
    pub api_url: String,

    /// Single-shot or streamed answers
    pub mode: ResponseMode,

    /// Whole-request timeout; unset means wait indefinitely
    pub request_timeout_secs: Option<u64>,

    /// Endpoint paths relative to `api_url`
    pub endpoints: EndpointConfig,

    /// Panel text and quick questions
    pub ui: UiConfig,
}

/// Backend endpoint paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub chat: String,
    pub stream: String,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub title: String,
    pub subtitle: String,
    pub quick_actions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            mode: ResponseMode::default(),
            request_timeout_secs: None,
            endpoints: EndpointConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            chat: "/api/chat".to_string(),
            stream: "/api/chat/stream".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: prompts::PANEL_TITLE.to_string(),
            subtitle: prompts::PANEL_SUBTITLE.to_string(),
            quick_actions: prompts::default_quick_actions(),
        }
    }
}

impl Config {
    /// `~/.tikitly`
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".tikitly"))
    }

    /// `~/.tikitly/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// Load from the default location and apply the environment override
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env();
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Apply the `TIKITLY_API_URL` override
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_url = url;
            }
        }
    }

    /// Full URL of the endpoint used by `mode`
    pub fn endpoint_url(&self, mode: ResponseMode) -> String {
        let path = match mode {
            ResponseMode::Single => &self.endpoints.chat,
            ResponseMode::Stream => &self.endpoints.stream,
        };
        format!("{}/{}", self.api_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.ui.quick_actions.len(), prompts::QUICK_ACTIONS.len());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_url = \"https://support.tikitly.test\"\nmode = \"single\"\n\n[endpoints]\nchat = \"/v2/chat\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url, "https://support.tikitly.test");
        assert_eq!(config.mode, ResponseMode::Single);
        assert_eq!(config.endpoints.chat, "/v2/chat");
        assert_eq!(config.endpoints.stream, "/api/chat/stream");
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.request_timeout_secs = Some(30);
        config.ui.quick_actions = vec!["Where are my payouts?".to_string()];

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "mode = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn endpoint_url_joins_without_double_slashes() {
        let mut config = Config::default();
        config.api_url = "http://localhost:8000/".to_string();
        assert_eq!(config.endpoint_url(ResponseMode::Single), "http://localhost:8000/api/chat");
        assert_eq!(
            config.endpoint_url(ResponseMode::Stream),
            "http://localhost:8000/api/chat/stream"
        );
    }
}
