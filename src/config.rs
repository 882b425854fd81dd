//! User configuration.
//!
//! Stored at `~/.config/relnotes/config.toml` and contains:
//! - GitHub and GitLab API tokens and endpoints
//! - host rules for self-hosted code hosts
//! - default registry URLs per datasource

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::changelog::{HostRule, HostRules};
use crate::datasource::Credentials;

const CONFIG_DIR: &str = "relnotes";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelnotesConfig {
    /// Token for the GitHub API (release notes and github-tags).
    #[serde(default)]
    pub github_token: Option<String>,

    #[serde(default)]
    pub gitlab_token: Option<String>,

    /// GitHub API root (default: https://api.github.com).
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    /// GitLab API root (default: https://gitlab.com/api/v4).
    #[serde(default = "default_gitlab_api_url")]
    pub gitlab_api_url: String,

    #[serde(default)]
    pub host_rules: Vec<HostRule>,

    /// Registry URLs used when a command does not pass any, keyed by datasource.
    #[serde(default)]
    pub registry_urls: BTreeMap<String, Vec<String>>,
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_gitlab_api_url() -> String {
    "https://gitlab.com/api/v4".to_string()
}

impl Default for RelnotesConfig {
    fn default() -> Self {
        Self {
            github_token: None,
            gitlab_token: None,
            github_api_url: default_github_api_url(),
            gitlab_api_url: default_gitlab_api_url(),
            host_rules: Vec::new(),
            registry_urls: BTreeMap::new(),
        }
    }
}

impl RelnotesConfig {
    /// Load config from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, content).context("Failed to write config file")
    }

    pub fn github_token_secret(&self) -> Option<SecretString> {
        non_empty(&self.github_token).map(SecretString::from)
    }

    pub fn gitlab_token_secret(&self) -> Option<SecretString> {
        non_empty(&self.gitlab_token).map(SecretString::from)
    }

    pub fn github_credentials(&self) -> Option<Credentials> {
        self.github_token_secret()
            .map(|token| Credentials::bearer(token.expose_secret()))
    }

    pub fn gitlab_credentials(&self) -> Option<Credentials> {
        self.gitlab_token_secret()
            .map(|token| Credentials::bearer(token.expose_secret()))
    }

    pub fn host_rules(&self) -> HostRules {
        HostRules::new(self.host_rules.clone())
    }

    /// Configured registry URLs for `datasource`, empty when none.
    pub fn registry_urls_for(&self, datasource: &str) -> Vec<String> {
        self.registry_urls
            .get(datasource)
            .cloned()
            .unwrap_or_default()
    }

    /// Add a host rule, replacing any rule for the same host.
    pub fn add_host_rule(&mut self, rule: HostRule) {
        self.host_rules.retain(|r| r.match_host != rule.match_host);
        self.host_rules.push(rule);
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
