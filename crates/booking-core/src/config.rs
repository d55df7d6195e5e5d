use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::controller::ClientSettings;
use crate::timezone;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const BASE_URL_ENV: &str = "BOOKING_CHAT_BASE_URL";
pub const SESSION_ENV: &str = "BOOKING_CHAT_SESSION";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub base_url: Option<String>,
    pub timezone: Option<String>,
    pub send_client_time: Option<bool>,
    pub session_cookie: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            timezone: None,
            send_client_time: Some(true),
            session_cookie: None,
            request_timeout_secs: None,
        }
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("booking-chat").join("config.json"))
    }

    /// Backend URL: env var first, then config, then the default
    pub fn base_url(&self) -> String {
        self.base_url_with(None)
    }

    /// Backend URL with a command-line value taking precedence over everything else
    pub fn base_url_with(&self, cli: Option<&str>) -> String {
        pick_base_url(
            cli,
            std::env::var(BASE_URL_ENV).ok().as_deref(),
            self.base_url.as_deref(),
        )
    }

    pub fn session_cookie(&self) -> Option<String> {
        std::env::var(SESSION_ENV)
            .ok()
            .filter(|cookie| !cookie.trim().is_empty())
            .or_else(|| self.session_cookie.clone())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn client_settings(&self) -> ClientSettings {
        self.client_settings_with(None)
    }

    pub fn client_settings_with(&self, cli_base_url: Option<&str>) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url_with(cli_base_url),
            timezone: timezone::resolve_timezone(self.timezone.as_deref()),
            send_client_time: self.send_client_time.unwrap_or(true),
        }
    }
}

fn pick_base_url(cli: Option<&str>, env: Option<&str>, file: Option<&str>) -> String {
    [cli, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(DEFAULT_BASE_URL)
        .to_string()
}
