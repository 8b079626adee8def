// webmail-client/src/config.rs
use anyhow::{anyhow, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use jmap_client::methods::{DEFAULT_MAX_BODY_VALUE_BYTES, DEFAULT_PAGE_SIZE};

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    /// Base URL the JMAP session is discovered from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Basic token, `base64(username:password)`
    #[serde(default)]
    pub access_token: String,
    /// API endpoint cached from session discovery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Mail account cached from session discovery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MailConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "default_max_body_value_bytes")]
    pub max_body_value_bytes: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_body_value_bytes: default_max_body_value_bytes(),
        }
    }
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_max_body_value_bytes() -> u64 {
    DEFAULT_MAX_BODY_VALUE_BYTES
}

impl Config {
    /// Stored config with `WEBMAIL_*` overrides applied
    pub fn load() -> Result<Self> {
        let mut config = Self::load_stored()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Stored config as written on disk, for read-modify-write
    pub fn load_stored() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Read `path`, creating it with defaults when missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let default = Self::default();
            default.save_to(path)?;
            return Ok(default);
        }

        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply `WEBMAIL_*` overrides looked up through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("WEBMAIL_SERVER_URL") {
            if self.server_url.as_deref() != Some(url.as_str()) {
                // A different server invalidates the cached endpoint
                self.api_url = None;
                self.account_id = None;
            }
            self.server_url = Some(url);
        }
        if let Some(username) = lookup("WEBMAIL_USERNAME") {
            self.username = Some(username);
        }
        if let Some(token) = lookup("WEBMAIL_TOKEN") {
            self.access_token = token;
        }
    }

    /// Write the discovered endpoint back to the stored config.
    ///
    /// Only `api_url` and `account_id` are written, so credentials supplied
    /// through `WEBMAIL_*` overrides never reach the file. Nothing is
    /// written when the endpoint belongs to an overridden server.
    pub fn remember_endpoint(&self) -> Result<bool> {
        self.remember_endpoint_in(&Self::config_path()?)
    }

    pub fn remember_endpoint_in(&self, path: &Path) -> Result<bool> {
        let mut stored = Self::load_from(path)?;
        if stored.server_url != self.server_url {
            debug!("endpoint discovered for an overridden server, not caching");
            return Ok(false);
        }
        stored.api_url = self.api_url.clone();
        stored.account_id = self.account_id.clone();
        stored.save_to(path)?;
        Ok(true)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        // Set permissions to 600 (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let base_dirs =
            BaseDirs::new().ok_or_else(|| anyhow!("Cannot determine config directory"))?;
        Ok(base_dirs.config_dir().join("webmail").join("config.toml"))
    }

    pub fn is_logged_in(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Forget the credentials and the cached endpoint
    pub fn clear_credentials(&mut self) {
        self.access_token.clear();
        self.api_url = None;
        self.account_id = None;
    }
}
