use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use shared::protocol::DEFAULT_SESSION_TITLE;
use tracing::warn;
use url::Url;

use crate::error::ChatClientError;

pub const SETTINGS_FILE: &str = "chat_client.toml";
pub const LOCAL_DEV_HOST: &str = "localhost";
pub const LOCAL_DEV_ENDPOINT: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Explicit API base URL; wins over everything else.
    pub api_base_url: Option<String>,
    /// Origin the client is served from, if any.
    pub origin: Option<String>,
    pub request_timeout_secs: u64,
    pub session_title: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: None,
            origin: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            session_title: DEFAULT_SESSION_TITLE.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    origin: Option<String>,
    request_timeout_secs: Option<u64>,
    session_title: Option<String>,
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn base_url(&self) -> Result<String, ChatClientError> {
        resolve_base_url(self.api_base_url.as_deref(), self.origin.as_deref())
    }

    pub fn apply_file_overrides(&mut self, raw: &str) {
        let file_cfg = match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => file_cfg,
            Err(err) => {
                warn!("config: ignoring unreadable {SETTINGS_FILE}: {err}");
                return;
            }
        };

        if let Some(v) = file_cfg.api_base_url {
            self.api_base_url = Some(v);
        }
        if let Some(v) = file_cfg.origin {
            self.origin = Some(v);
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file_cfg.session_title {
            self.session_title = v;
        }
    }

    /// Applies environment overrides read through `lookup`, so tests need not touch the process env.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CHAT_API_BASE_URL") {
            self.api_base_url = Some(v);
        }
        if let Some(v) = lookup("APP__API_BASE_URL") {
            self.api_base_url = Some(v);
        }

        if let Some(v) = lookup("CHAT_ORIGIN") {
            self.origin = Some(v);
        }
        if let Some(v) = lookup("APP__ORIGIN") {
            self.origin = Some(v);
        }

        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
            match v.parse::<u64>() {
                Ok(parsed) => self.request_timeout_secs = parsed,
                Err(_) => warn!("config: ignoring non-numeric APP__REQUEST_TIMEOUT_SECS={v}"),
            }
        }
    }
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        settings.apply_file_overrides(&raw);
    }

    settings.apply_env_overrides(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()));
    settings
}

/// Picks the API base URL: an explicit override, else a non-local origin, else the local dev server.
pub fn resolve_base_url(
    explicit: Option<&str>,
    origin: Option<&str>,
) -> Result<String, ChatClientError> {
    if let Some(explicit) = explicit.map(str::trim).filter(|v| !v.is_empty()) {
        let parsed =
            Url::parse(explicit).map_err(|_| ChatClientError::InvalidEndpoint(explicit.into()))?;
        if parsed.cannot_be_a_base() {
            return Err(ChatClientError::InvalidEndpoint(explicit.into()));
        }
        return Ok(explicit.trim_end_matches('/').to_string());
    }

    if let Some(origin) = origin.map(str::trim).filter(|v| !v.is_empty()) {
        let parsed =
            Url::parse(origin).map_err(|_| ChatClientError::InvalidEndpoint(origin.into()))?;
        match parsed.host_str() {
            Some(host) if host != LOCAL_DEV_HOST => {
                return Ok(parsed.origin().ascii_serialization());
            }
            Some(_) => {}
            None => return Err(ChatClientError::InvalidEndpoint(origin.into())),
        }
    }

    Ok(LOCAL_DEV_ENDPOINT.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
