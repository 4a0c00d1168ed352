//! Target configuration loaded from the `--config` JSON file.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::header::HeaderValue;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::delivery::DEFAULT_ENDPOINT;

/// Keys that must be present in the config file.
pub const REQUIRED_CONFIG_KEYS: &[&str] = &["api_key", "date_from"];

#[derive(Clone, Deserialize)]
pub struct Config {
    /// Userpilot API token, sent as `Authorization: Token <api_key>`.
    pub api_key: String,
    /// Accepted for compatibility with existing configs; not read by the target.
    pub date_from: String,
    /// Turns off the anonymous usage ping.
    #[serde(default)]
    pub disable_collection: bool,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout. Absent means requests may block indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("date_from", &self.date_from)
            .field("disable_collection", &self.disable_collection)
            .field("endpoint", &self.endpoint)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config must be a JSON object")]
    NotAnObject,

    #[error("Config is missing required keys: {0:?}")]
    MissingKeys(Vec<String>),

    #[error("Config key 'api_key' must not be empty")]
    EmptyApiKey,

    #[error("Config key 'api_key' contains characters not allowed in an HTTP header")]
    InvalidApiKey,

    #[error("Config key 'endpoint' is not a usable http(s) URL '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid config: {0}")]
    Invalid(#[from] serde_json::Error),
}

impl Config {
    /// Build a config from an already-parsed JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document is not an object, lacks any of
    /// [`REQUIRED_CONFIG_KEYS`], or has values of the wrong type. An
    /// `api_key` that cannot go in a header, or an `endpoint` that is not an
    /// absolute http(s) URL, is rejected here rather than at the first record.
    pub fn from_value(value: Value) -> std::result::Result<Self, ConfigError> {
        let Some(object) = value.as_object() else {
            return Err(ConfigError::NotAnObject);
        };
        let missing: Vec<String> = REQUIRED_CONFIG_KEYS
            .iter()
            .filter(|key| !object.contains_key(**key))
            .map(|key| (*key).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingKeys(missing));
        }

        let config: Config = serde_json::from_value(value)?;
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        if HeaderValue::from_str(&format!("Token {}", config.api_key)).is_err() {
            return Err(ConfigError::InvalidApiKey);
        }
        config.validate_endpoint()?;
        Ok(config)
    }

    fn validate_endpoint(&self) -> std::result::Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason,
        };
        let url = Url::parse(&self.endpoint).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(invalid(format!("unsupported scheme '{other}'"))),
        }
    }

    /// Read and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not JSON, or fails
    /// [`Config::from_value`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        let config = Self::from_value(value)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }
}
