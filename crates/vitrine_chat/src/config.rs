//! Assistant configuration.
//!
//! Resolved from `.vitrine/settings.json` in a workspace root, falling back
//! to environment variables:
//! - `VITRINE_CHAT_ENDPOINT` (required when no settings file names one)
//! - `VITRINE_CHAT_API_KEY`
//! - `VITRINE_CHAT_TIMEOUT_SECS`

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ChatError, ChatResult};

pub const ENDPOINT_ENV: &str = "VITRINE_CHAT_ENDPOINT";
pub const API_KEY_ENV: &str = "VITRINE_CHAT_API_KEY";
pub const TIMEOUT_ENV: &str = "VITRINE_CHAT_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Resolved assistant configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Assistant endpoint URL
    pub endpoint: String,
    /// Bearer token for the endpoint, if any
    pub api_key: Option<String>,
    /// Transport timeout per attempt
    pub request_timeout_secs: u64,
    /// Seed new conversations with the welcome turn
    pub welcome: bool,
}

/// On-disk settings file
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    endpoint: Option<String>,
    /// Name of the environment variable holding the API key
    api_key_env: Option<String>,
    request_timeout_secs: Option<u64>,
    welcome: Option<bool>,
}

impl ChatConfig {
    /// Create a configuration with defaults for everything but the endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            welcome: true,
        }
    }

    /// Create a configuration from environment variables
    pub fn from_env() -> ChatResult<Self> {
        let endpoint = non_empty_env(ENDPOINT_ENV).ok_or(ChatError::NotConfigured)?;

        let mut config = Self::new(endpoint);
        config.api_key = non_empty_env(API_KEY_ENV);
        if let Some(secs) = timeout_from_env() {
            config.request_timeout_secs = secs;
        }
        Ok(config)
    }

    /// Create a configuration from workspace settings, falling back to env
    pub fn from_settings(workspace_root: &Path) -> ChatResult<Self> {
        Self::resolve(workspace_root, None)
    }

    /// Resolve the full configuration, with an optional endpoint that wins
    /// over both the settings file and the environment.
    pub fn resolve(workspace_root: &Path, endpoint_override: Option<&str>) -> ChatResult<Self> {
        let settings_path = workspace_root.join(".vitrine").join("settings.json");

        let settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content)?
        } else {
            debug!("No settings file at {}, using environment", settings_path.display());
            SettingsFile::default()
        };

        let endpoint = endpoint_override
            .map(str::to_string)
            .filter(|e| !e.trim().is_empty())
            .or_else(|| settings.endpoint.filter(|e| !e.trim().is_empty()))
            .or_else(|| non_empty_env(ENDPOINT_ENV))
            .ok_or(ChatError::NotConfigured)?;

        let key_var = settings.api_key_env.as_deref().unwrap_or(API_KEY_ENV);
        let api_key = non_empty_env(key_var);
        if api_key.is_none() && settings.api_key_env.is_some() {
            warn!("Settings name {} as the API key variable but it is not set", key_var);
        }

        Ok(Self {
            endpoint,
            api_key,
            request_timeout_secs: settings
                .request_timeout_secs
                .or_else(timeout_from_env)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            welcome: settings.welcome.unwrap_or(true),
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn timeout_from_env() -> Option<u64> {
    let raw = non_empty_env(TIMEOUT_ENV)?;
    match raw.trim().parse() {
        Ok(secs) => Some(secs),
        Err(_) => {
            warn!("Ignoring invalid {}: {}", TIMEOUT_ENV, raw);
            None
        }
    }
}
