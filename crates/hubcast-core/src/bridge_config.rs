//! Bridge configuration loaded once at startup.
//!
//! The configuration names every repository the bridge is willing to accept
//! webhooks for, together with its signing secret and per-repository
//! forwarding flags. Repositories absent from the list are rejected unless
//! `allow_unknown_repositories` is set.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WEBHOOK_PATH: &str = "/github/webhooks";

/// One monitored repository entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Full name in `owner/name` form.
    pub repo: String,
    /// Shared secret used to verify inbound webhook signatures.
    pub secret: String,
    #[serde(default = "default_forward_watch")]
    pub forward_watch: bool,
    #[serde(default)]
    pub forward_unknown_events: bool,
}

/// Forwarding flags applied during webhook processing.
///
/// Configured repositories carry their own flags; repositories accepted
/// through `allow_unknown_repositories` run under the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryPolicy {
    pub forward_watch: bool,
    pub forward_unknown_events: bool,
}

impl Default for RepositoryPolicy {
    fn default() -> Self {
        Self {
            forward_watch: default_forward_watch(),
            forward_unknown_events: false,
        }
    }
}

impl RepositoryConfig {
    pub fn policy(&self) -> RepositoryPolicy {
        RepositoryPolicy {
            forward_watch: self.forward_watch,
            forward_unknown_events: self.forward_unknown_events,
        }
    }
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BridgeConfig {
    #[serde(default = "default_webhook_path")]
    pub path: String,
    #[serde(default)]
    pub allow_unknown_repositories: bool,
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            path: default_webhook_path(),
            allow_unknown_repositories: false,
            repositories: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("failed to parse bridge configuration")
    }

    /// Loads a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| {
            format!("failed to read bridge configuration {}", path.display())
        })?;
        Self::from_toml_str(&raw)
    }

    /// Looks up the entry for a repository full name, if configured.
    pub fn repository(&self, full_name: &str) -> Option<&RepositoryConfig> {
        self.repositories
            .iter()
            .find(|entry| entry.repo == full_name)
    }
}

fn default_webhook_path() -> String {
    DEFAULT_WEBHOOK_PATH.to_string()
}

fn default_forward_watch() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::{BridgeConfig, DEFAULT_WEBHOOK_PATH};

    #[test]
    fn minimal_config_applies_defaults() {
        let config = BridgeConfig::from_toml_str("").expect("parse empty config");
        assert_eq!(config.path, DEFAULT_WEBHOOK_PATH);
        assert!(!config.allow_unknown_repositories);
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn repository_entry_defaults_and_lookup() {
        let raw = r#"
            path = "/hooks/github"

            [[repositories]]
            repo = "acme/widgets"
            secret = "s3cr3t"

            [[repositories]]
            repo = "acme/gears"
            secret = "other"
            forward_watch = false
            forward_unknown_events = true
        "#;
        let config = BridgeConfig::from_toml_str(raw).expect("parse config");
        assert_eq!(config.path, "/hooks/github");

        let widgets = config.repository("acme/widgets").expect("widgets entry");
        assert!(widgets.forward_watch);
        assert!(!widgets.forward_unknown_events);

        let gears = config.repository("acme/gears").expect("gears entry");
        assert!(!gears.forward_watch);
        assert!(gears.forward_unknown_events);

        assert!(config.repository("unknown/repo").is_none());
    }

    #[test]
    fn load_reads_config_from_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("hubcast.toml");
        std::fs::write(
            &path,
            "allow_unknown_repositories = true\n\n[[repositories]]\nrepo = \"a/b\"\nsecret = \"s\"\n",
        )
        .expect("write config");

        let config = BridgeConfig::load(&path).expect("load config");
        assert!(config.allow_unknown_repositories);
        assert_eq!(config.repositories.len(), 1);
    }
}
