use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const ENV_BASE_URL: &str = "LANGFLOW_BASE_URL";
pub const ENV_TENANT_ID: &str = "LANGFLOW_TENANT_ID";
pub const ENV_FLOW_ID: &str = "LANGFLOW_FLOW_ID";
pub const ENV_APPLICATION_TOKEN: &str = "LANGFLOW_APPLICATION_TOKEN";

/// Hosted Langflow API, used when no base URL is configured anywhere.
pub const DEFAULT_BASE_URL: &str = "https://api.langflow.astra.datastax.com";

/// Per-node overrides forwarded verbatim to the flow. Keys are node ids.
pub type Tweaks = Map<String, Value>;

/// On-disk config. Every field is optional here; [`Config::resolve`]
/// decides what is actually required.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub tenant_id: Option<String>,
    pub flow_id: Option<String>,
    pub application_token: Option<String>,
    pub tweaks: Option<Tweaks>,
}

/// Fully resolved settings the flow client runs with.
#[derive(Clone)]
pub struct Settings {
    pub base_url: String,
    pub tenant_id: String,
    pub flow_id: String,
    pub application_token: String,
    pub tweaks: Tweaks,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("tenant_id", &self.tenant_id)
            .field("flow_id", &self.flow_id)
            .field("application_token", &"<redacted>")
            .field("tweaks", &self.tweaks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Config {
    /// Load `$CONFIG_DIR/flowchat/config.json`, or an empty config if the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using environment only");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config =
            serde_json::from_str(&config_content).map_err(|source| ConfigError::File {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Resolve against the process environment.
    pub fn resolve(self) -> Result<Settings, ConfigError> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve with environment values taking precedence over the file.
    /// Empty values count as unset.
    pub fn resolve_with<F>(self, env: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &'static str, file_value: Option<String>| {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .or(file_value.filter(|v| !v.trim().is_empty()))
        };

        let base_url = pick(ENV_BASE_URL, self.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let tenant_id =
            pick(ENV_TENANT_ID, self.tenant_id).ok_or(ConfigError::Missing(ENV_TENANT_ID))?;
        let flow_id = pick(ENV_FLOW_ID, self.flow_id).ok_or(ConfigError::Missing(ENV_FLOW_ID))?;
        let application_token = pick(ENV_APPLICATION_TOKEN, self.application_token)
            .ok_or(ConfigError::Missing(ENV_APPLICATION_TOKEN))?;

        Ok(Settings {
            base_url: base_url.trim_end_matches('/').to_string(),
            tenant_id,
            flow_id,
            application_token,
            tweaks: self.tweaks.unwrap_or_default(),
        })
    }

    pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("flowchat"))
    }

    fn get_config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::get_config_dir()?.join("config.json"))
    }
}
