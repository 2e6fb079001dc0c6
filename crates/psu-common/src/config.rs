//! Settings file model and the client configuration derived from it.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PsuError, Result};

/// Keys accepted by the settings file, in listing order.
pub const CONFIG_KEYS: [&str; 6] = ["url", "user", "password", "auth-token", "insecure", "timeout"];

/// Persisted settings. Every field is optional so a partial file (or a set
/// of command-line overrides) can be layered over another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PsuConfig {
    /// Base URL of the management server, without the `/api` suffix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Username used to authenticate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Password used to authenticate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Previously obtained bearer token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Skip TLS certificate verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
    /// Whole-request timeout, written like `100ms`, `30s` or `1h20m`.
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl PsuConfig {
    /// Loads settings from a YAML file. A missing or empty file yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| PsuError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        tracing::debug!(path = %path.display(), "using settings file");
        serde_yaml::from_str(&content).map_err(|e| PsuError::Yaml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Writes settings to a YAML file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be serialized or written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PsuError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let yaml = serde_yaml::to_string(self).map_err(|e| PsuError::Yaml {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, yaml).map_err(|e| PsuError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Returns the value of a key as text.
    ///
    /// # Errors
    ///
    /// Returns `PsuError::UnknownConfigKey` for keys outside [`CONFIG_KEYS`].
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "url" => self.url.clone(),
            "user" => self.user.clone(),
            "password" => self.password.clone(),
            "auth-token" => self.auth_token.clone(),
            "insecure" => self.insecure.map(|v| v.to_string()),
            "timeout" => self
                .timeout
                .map(|v| humantime::format_duration(v).to_string()),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Sets a key from its text form.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown keys, or when `insecure` is not a bool or
    /// `timeout` is not a duration such as `30s`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "url" => self.url = Some(value.to_string()),
            "user" => self.user = Some(value.to_string()),
            "password" => self.password = Some(value.to_string()),
            "auth-token" => self.auth_token = Some(value.to_string()),
            "insecure" => {
                self.insecure = Some(value.parse().map_err(|_| PsuError::Config {
                    message: format!("insecure must be true or false, got {value:?}"),
                })?);
            }
            "timeout" => {
                self.timeout = Some(humantime::parse_duration(value).map_err(|e| {
                    PsuError::Config {
                        message: format!("timeout must be a duration like 30s, got {value:?}: {e}"),
                    }
                })?);
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// Lists every known key with its current value.
    pub fn list(&self) -> Vec<(&'static str, Option<String>)> {
        CONFIG_KEYS
            .iter()
            .map(|&key| (key, self.get(key).ok().flatten()))
            .collect()
    }

    /// Layers `overrides` on top of `self`; every `Some` in `overrides` wins.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            url: overrides.url.or(self.url),
            user: overrides.user.or(self.user),
            password: overrides.password.or(self.password),
            auth_token: overrides.auth_token.or(self.auth_token),
            insecure: overrides.insecure.or(self.insecure),
            timeout: overrides.timeout.or(self.timeout),
        }
    }

    /// Builds the client configuration from these settings.
    ///
    /// # Errors
    ///
    /// Returns `PsuError::Config` if no server URL is set.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let url = self
            .url
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| PsuError::Config {
                message: "server URL is not set (use --url, PSU_URL or `psu setting set url`)"
                    .to_string(),
            })?;
        Ok(ClientConfig {
            url,
            user: self.user.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
            token: self.auth_token.clone().filter(|t| !t.is_empty()),
            insecure: self.insecure.unwrap_or(false),
            timeout: self.timeout.filter(|t| !t.is_zero()),
            user_agent: crate::constants::USER_AGENT.to_string(),
        })
    }
}

fn unknown_key(key: &str) -> PsuError {
    PsuError::UnknownConfigKey {
        key: key.to_string(),
    }
}

/// Connection settings for the API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the management server; `/api/` is appended.
    pub url: String,
    /// Username used for lazy authentication.
    pub user: String,
    /// Password used for lazy authentication.
    pub password: String,
    /// Pre-seeded bearer token; skips authentication when present.
    pub token: Option<String>,
    /// Skip TLS certificate verification.
    pub insecure: bool,
    /// Timeout for the whole round trip; `None` waits forever.
    pub timeout: Option<Duration>,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration for `url` with no credentials.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user: String::new(),
            password: String::new(),
            token: None,
            insecure: false,
            timeout: None,
            user_agent: crate::constants::USER_AGENT.to_string(),
        }
    }

    /// Sets the credentials used for authentication.
    #[must_use]
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    /// Pre-seeds the bearer token.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}
